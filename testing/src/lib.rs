//! Test utilities for Segue transitions.
//!
//! - [`CallLog`]: shared, ordered record of hook invocations
//! - [`ScriptedHandler`]: a handler whose hooks log themselves and fail on demand
//! - [`ScriptedContinuation`]: a continuation that rejects on a chosen call

use async_trait::async_trait;
use parking_lot::Mutex;
use segue_core::{Bus, Continuation, Handler, Params, SegmentInfo};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ordered log of `"<handler>:<hook>"` entries shared by many handlers.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Handler names that ran `hook`, in call order.
    pub fn calls_of(&self, hook: &str) -> Vec<String> {
        self.0
            .lock()
            .iter()
            .filter_map(|entry| {
                let (name, called) = entry.split_once(':')?;
                (called == hook).then(|| name.to_string())
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

type RedirectAction = Box<dyn Fn(&mut Bus) + Send + Sync>;

/// A handler that records every hook call into a [`CallLog`].
pub struct ScriptedHandler {
    name: String,
    log: CallLog,
    context: Option<Value>,
    model_error: Option<String>,
    redirect_error: Option<String>,
    on_redirect: Option<RedirectAction>,
}

impl ScriptedHandler {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            context: None,
            model_error: None,
            redirect_error: None,
            on_redirect: None,
        }
    }

    /// Context returned by `model` (defaults to `{"name": <name>}`).
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn failing_model(mut self, message: impl Into<String>) -> Self {
        self.model_error = Some(message.into());
        self
    }

    pub fn failing_redirect(mut self, message: impl Into<String>) -> Self {
        self.redirect_error = Some(message.into());
        self
    }

    /// Run `action` against the shared payload when the redirect hook fires.
    pub fn on_redirect(mut self, action: impl Fn(&mut Bus) + Send + Sync + 'static) -> Self {
        self.on_redirect = Some(Box::new(action));
        self
    }

    pub fn shared(self) -> Arc<dyn Handler> {
        Arc::new(self)
    }

    fn log(&self, hook: &str) {
        self.log.push(format!("{}:{}", self.name, hook));
    }
}

#[async_trait]
impl Handler for ScriptedHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn before_model(&self, _bus: &mut Bus) -> anyhow::Result<()> {
        self.log("before_model");
        Ok(())
    }

    async fn model(&self, _params: &Params, _bus: &mut Bus) -> anyhow::Result<Value> {
        self.log("model");
        if let Some(message) = &self.model_error {
            anyhow::bail!("{message}");
        }
        Ok(self
            .context
            .clone()
            .unwrap_or_else(|| serde_json::json!({ "name": self.name })))
    }

    async fn after_model(&self, _context: &Value, _bus: &mut Bus) -> anyhow::Result<()> {
        self.log("after_model");
        Ok(())
    }

    async fn redirect(&self, _context: &Value, bus: &mut Bus) -> anyhow::Result<()> {
        self.log("redirect");
        if let Some(action) = &self.on_redirect {
            action(bus);
        }
        if let Some(message) = &self.redirect_error {
            anyhow::bail!("{message}");
        }
        Ok(())
    }
}

/// Unresolved segments named after, and handled by, fresh scripted handlers.
pub fn unresolved_chain(log: &CallLog, names: &[&str]) -> Vec<SegmentInfo> {
    names
        .iter()
        .map(|name| {
            SegmentInfo::by_params(*name, ScriptedHandler::new(*name, log).shared(), Params::new())
        })
        .collect()
}

/// A continuation that counts its calls and rejects on one of them.
#[derive(Debug, Default)]
pub struct ScriptedContinuation {
    calls: AtomicUsize,
    reject_on: Option<usize>,
    message: String,
}

impl ScriptedContinuation {
    /// Never rejects.
    pub fn passing() -> Self {
        Self::default()
    }

    /// Rejects on the `call`-th check (1-based) and only on that one.
    pub fn reject_on(call: usize, message: impl Into<String>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reject_on: Some(call),
            message: message.into(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Continuation for ScriptedContinuation {
    async fn check(&self) -> anyhow::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject_on == Some(call) {
            anyhow::bail!("{}", self.message);
        }
        Ok(())
    }
}
