//! Segment records - one per matched route segment.
//!
//! A record is either still unresolved (it knows how to obtain its context)
//! or resolved (it carries that context). The resolver swaps the variant in
//! place; records are never reordered.

use crate::bus::Bus;
use crate::continuation::Continuation;
use crate::error::TransitionError;
use crate::handler::Handler;
use crate::params::Params;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Where an unresolved segment gets its context from.
#[derive(Debug, Clone)]
pub enum ContextSource {
    /// Context is loaded by the handler's `model` hook from these params.
    Params(Params),
    /// Context was supplied by the caller; `model` is skipped and params are
    /// serialized from the object using the declared param names.
    Object { context: Value, names: Vec<String> },
}

#[derive(Clone)]
pub struct UnresolvedSegment {
    pub name: String,
    pub handler: Arc<dyn Handler>,
    pub source: ContextSource,
}

#[derive(Clone)]
pub struct ResolvedSegment {
    pub name: String,
    pub handler: Arc<dyn Handler>,
    pub params: Params,
    pub context: Value,
}

/// A segment-resolution record.
#[derive(Clone)]
pub enum SegmentInfo {
    Unresolved(UnresolvedSegment),
    Resolved(ResolvedSegment),
}

impl SegmentInfo {
    /// Unresolved segment whose context comes from the `model` hook.
    pub fn by_params(name: impl Into<String>, handler: Arc<dyn Handler>, params: Params) -> Self {
        SegmentInfo::Unresolved(UnresolvedSegment {
            name: name.into(),
            handler,
            source: ContextSource::Params(params),
        })
    }

    /// Unresolved segment whose context is already known.
    pub fn by_object(
        name: impl Into<String>,
        handler: Arc<dyn Handler>,
        context: Value,
        names: Vec<String>,
    ) -> Self {
        SegmentInfo::Unresolved(UnresolvedSegment {
            name: name.into(),
            handler,
            source: ContextSource::Object { context, names },
        })
    }

    pub fn resolved(
        name: impl Into<String>,
        handler: Arc<dyn Handler>,
        params: Params,
        context: Value,
    ) -> Self {
        SegmentInfo::Resolved(ResolvedSegment {
            name: name.into(),
            handler,
            params,
            context,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            SegmentInfo::Unresolved(s) => &s.name,
            SegmentInfo::Resolved(s) => &s.name,
        }
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        match self {
            SegmentInfo::Unresolved(s) => &s.handler,
            SegmentInfo::Resolved(s) => &s.handler,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, SegmentInfo::Resolved(_))
    }

    pub fn context(&self) -> Option<&Value> {
        match self {
            SegmentInfo::Unresolved(UnresolvedSegment {
                source: ContextSource::Object { context, .. },
                ..
            }) => Some(context),
            SegmentInfo::Unresolved(_) => None,
            SegmentInfo::Resolved(s) => Some(&s.context),
        }
    }

    /// Params known for this record right now, without any async work.
    pub fn params(&self) -> Params {
        match self {
            SegmentInfo::Unresolved(s) => s.params(),
            SegmentInfo::Resolved(s) => s.params.clone(),
        }
    }

    /// Produce the resolved version of this record.
    ///
    /// A resolved record returns itself without consulting `check`.
    pub async fn resolve(
        &self,
        check: &dyn Continuation,
        bus: &mut Bus,
    ) -> Result<ResolvedSegment, TransitionError> {
        match self {
            SegmentInfo::Unresolved(s) => s.resolve(check, bus).await,
            SegmentInfo::Resolved(s) => {
                bus.record_model(s.name.clone(), s.context.clone());
                Ok(s.clone())
            }
        }
    }
}

impl UnresolvedSegment {
    pub fn params(&self) -> Params {
        match &self.source {
            ContextSource::Params(params) => params.clone(),
            ContextSource::Object { context, names } => self.handler.serialize(context, names),
        }
    }

    /// Runs `before_model`, `model` and `after_model`, consulting `check`
    /// before and after each of them.
    pub async fn resolve(
        &self,
        check: &dyn Continuation,
        bus: &mut Bus,
    ) -> Result<ResolvedSegment, TransitionError> {
        let abort = TransitionError::Aborted;
        let failed = TransitionError::Resolution;

        check.check().await.map_err(abort)?;
        self.handler.before_model(bus).await.map_err(failed)?;
        check.check().await.map_err(abort)?;

        let context = match &self.source {
            ContextSource::Params(params) => {
                self.handler.model(params, bus).await.map_err(failed)?
            }
            ContextSource::Object { context, .. } => context.clone(),
        };
        check.check().await.map_err(abort)?;

        self.handler.after_model(&context, bus).await.map_err(failed)?;
        check.check().await.map_err(abort)?;

        tracing::debug!(segment = %self.name, "Segment became resolved");
        bus.record_model(self.name.clone(), context.clone());

        Ok(ResolvedSegment {
            name: self.name.clone(),
            handler: Arc::clone(&self.handler),
            params: self.params(),
            context,
        })
    }
}

impl From<ResolvedSegment> for SegmentInfo {
    fn from(resolved: ResolvedSegment) -> Self {
        SegmentInfo::Resolved(resolved)
    }
}

impl fmt::Debug for UnresolvedSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnresolvedSegment")
            .field("name", &self.name)
            .field("handler", &self.handler.name())
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Debug for ResolvedSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSegment")
            .field("name", &self.name)
            .field("handler", &self.handler.name())
            .field("params", &self.params)
            .field("context", &self.context)
            .finish()
    }
}

impl fmt::Debug for SegmentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentInfo")
            .field("name", &self.name())
            .field("handler", &self.handler().name())
            .field("is_resolved", &self.is_resolved())
            .field("context", &self.context())
            .finish()
    }
}
