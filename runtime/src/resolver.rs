//! # Resolver: The Sequential Resolution Loop
//!
//! Walks the segment chain of a [`TransitionState`] strictly one segment at a
//! time:
//!
//! 1. resolve `segments[cursor]` (an unresolved record consults the
//!    continuation itself before and after each of its hooks),
//! 2. swap the resolved record in place and advance the cursor,
//! 3. fire the redirect hook if the record was not resolved before,
//! 4. ask the continuation again before touching the next segment.
//!
//! Any failure ends the pass and is attributed to the segment at the cursor,
//! or to the last segment once the cursor has run past the end.

use crate::state::TransitionState;
use segue_core::timeline::now_millis;
use segue_core::{
    AbortGuard, Bus, Continuation, Handler, ResolverConfig, SegmentInfo, Timeline, TimelineEvent,
    TransitionError,
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

/// `Ok` is the fully resolved state, `Err` the attributed failure.
pub type ResolveResult = Result<TransitionState, TransitionFailure>;

/// The only failure shape of a resolution pass.
#[derive(Error)]
#[error("transition failed at '{}': {error}", .handler_with_error.name())]
pub struct TransitionFailure {
    #[source]
    pub error: TransitionError,
    /// Handler of the segment the failure is attributed to.
    pub handler_with_error: Arc<dyn Handler>,
    /// The continuation predicate rejected at some point during the pass.
    pub was_aborted: bool,
    /// State as it stood when the pass stopped; the resolved prefix is kept.
    pub state: TransitionState,
}

impl fmt::Debug for TransitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionFailure")
            .field("error", &self.error)
            .field("handler_with_error", &self.handler_with_error.name())
            .field("was_aborted", &self.was_aborted)
            .field("state", &self.state)
            .finish()
    }
}

/// Result of a single step of the loop.
enum Step {
    /// `segments[index]` was swapped for its resolved version.
    Advanced { index: usize, was_already_resolved: bool },
    /// The cursor reached the end of the chain.
    Exhausted,
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve every segment of `state` in order.
    ///
    /// `bus` is shared with every hook and with nothing else; its
    /// `resolve_index` mirrors the cursor throughout the pass.
    pub async fn resolve(
        &self,
        mut state: TransitionState,
        should_continue: &dyn Continuation,
        bus: &mut Bus,
    ) -> ResolveResult {
        let span = tracing::info_span!(
            "Transition",
            segue.target = %state.target_name(),
            segue.transition_id = %state.id,
        );

        async move {
            state.compute_params();
            bus.set_query_params(state.query_params.clone());
            state.cursor = 0;
            bus.set_resolve_index(0);
            state.timeline = self.config.record_timeline.then(Timeline::new);

            let guard = AbortGuard::new(should_continue);
            tracing::debug!(label = %state.label("Start transition"), "Resolving segments");

            loop {
                match self.step(&mut state, &guard, bus).await {
                    Ok(Step::Advanced { index, was_already_resolved }) => {
                        tracing::trace!(index, was_already_resolved, "Segment advanced");
                    }
                    Ok(Step::Exhausted) => {
                        tracing::info!(segments = state.len(), "Transition resolved");
                        return Ok(state);
                    }
                    Err(error) => return Err(Self::fail(state, error, guard.was_aborted())),
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Resolve the segment at the cursor, fire its redirect hook if it is
    /// newly resolved, then re-check the continuation.
    async fn step(
        &self,
        state: &mut TransitionState,
        guard: &AbortGuard<'_>,
        bus: &mut Bus,
    ) -> Result<Step, TransitionError> {
        let index = state.cursor;
        let Some(segment) = state.segments.get(index) else {
            return Ok(Step::Exhausted);
        };

        let span = tracing::debug_span!(
            "Segment",
            segue.segment = %segment.name(),
            segue.index = index,
        );
        let name = segment.name().to_string();
        record(state, || TimelineEvent::SegmentEnter {
            index,
            name: name.clone(),
            timestamp: now_millis(),
        });

        async {
            let was_already_resolved = state.segments[index].is_resolved();
            let resolved = state.segments[index].resolve(guard, bus).await?;

            state.segments[index] = SegmentInfo::Resolved(resolved);
            state.cursor = index + 1;
            bus.set_resolve_index(state.cursor);
            record(state, || TimelineEvent::SegmentResolved {
                index,
                name: name.clone(),
                was_already_resolved,
                timestamp: now_millis(),
            });

            if !was_already_resolved {
                if let SegmentInfo::Resolved(segment) = &state.segments[index] {
                    tracing::debug!(label = %state.label("Redirect"), "Firing redirect hook");
                    segment
                        .handler
                        .redirect(&segment.context, bus)
                        .await
                        .map_err(TransitionError::Hook)?;
                }
                record(state, || TimelineEvent::RedirectFired {
                    index,
                    name: name.clone(),
                    timestamp: now_millis(),
                });
            }

            // A redirect may have started a competing transition.
            guard.check().await.map_err(TransitionError::Aborted)?;

            Ok(Step::Advanced { index, was_already_resolved })
        }
        .instrument(span)
        .await
    }

    fn fail(
        mut state: TransitionState,
        error: TransitionError,
        was_aborted: bool,
    ) -> TransitionFailure {
        // Non-empty: an empty chain is exhausted before anything can fail.
        let index = state.cursor.min(state.segments.len() - 1);
        let handler_with_error = Arc::clone(state.segments[index].handler());

        if was_aborted {
            tracing::warn!(
                index,
                segment = %state.segments[index].name(),
                error = %error,
                "Transition aborted"
            );
            record(&mut state, || TimelineEvent::Aborted { index, timestamp: now_millis() });
        } else {
            tracing::error!(
                index,
                segment = %state.segments[index].name(),
                kind = error.kind(),
                error = %error,
                "Transition failed"
            );
            record(&mut state, || TimelineEvent::Failed {
                index,
                kind: error.kind().to_string(),
                timestamp: now_millis(),
            });
        }

        TransitionFailure {
            error,
            handler_with_error,
            was_aborted,
            state,
        }
    }
}

fn record(state: &mut TransitionState, event: impl FnOnce() -> TimelineEvent) {
    if let Some(timeline) = state.timeline.as_mut() {
        timeline.push(event());
    }
}
