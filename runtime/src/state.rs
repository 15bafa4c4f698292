//! # TransitionState: One In-Flight Transition
//!
//! A `TransitionState` is built fresh for every transition attempt from the
//! matched segment chain (outer to inner). It is consumed by a single
//! `resolve` call and handed back in both the success and failure shapes.

use crate::resolver::{ResolveResult, Resolver};
use segue_core::{Bus, Continuation, Params, ParamsMap, SegmentInfo, Timeline};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct TransitionState {
    /// Correlates log events of one transition attempt.
    pub id: Uuid,
    /// Segment records, outer to inner. Replaced in place, never reordered.
    pub segments: Vec<SegmentInfo>,
    /// Params of every segment by name, filled before any resolution starts.
    pub params: ParamsMap,
    pub query_params: Params,
    /// Index of the next segment to resolve.
    pub(crate) cursor: usize,
    pub(crate) timeline: Option<Timeline>,
}

impl TransitionState {
    pub fn new(segments: Vec<SegmentInfo>) -> Self {
        Self {
            id: Uuid::new_v4(),
            segments,
            params: ParamsMap::new(),
            query_params: Params::new(),
            cursor: 0,
            timeline: None,
        }
    }

    pub fn with_query_params(mut self, query_params: Params) -> Self {
        self.query_params = query_params;
        self
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.segments.iter().all(SegmentInfo::is_resolved)
    }

    /// Timeline of the last `resolve` pass, when recording was enabled.
    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    /// Segment names joined with `.` (e.g. `posts.post.comments`).
    pub fn target_name(&self) -> String {
        self.segments
            .iter()
            .map(SegmentInfo::name)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Diagnostic label for tracing: `'posts.post': <label>`.
    pub fn label(&self, label: &str) -> String {
        format!("'{}': {}", self.target_name(), label)
    }

    /// Fill `params` from the current records, resolved or not.
    pub(crate) fn compute_params(&mut self) {
        for segment in &self.segments {
            self.params.insert(segment.name().to_string(), segment.params());
        }
    }

    /// Resolve every segment in order with the default resolver settings.
    pub async fn resolve(self, should_continue: &dyn Continuation, bus: &mut Bus) -> ResolveResult {
        Resolver::default().resolve(self, should_continue, bus).await
    }
}
