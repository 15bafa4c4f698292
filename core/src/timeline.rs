use serde::{Deserialize, Serialize};

/// Represents a discrete event in a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineEvent {
    /// The resolver started on a segment
    SegmentEnter {
        index: usize,
        name: String,
        timestamp: i64,
    },
    /// A segment record was swapped for its resolved version
    SegmentResolved {
        index: usize,
        name: String,
        was_already_resolved: bool,
        timestamp: i64,
    },
    /// A redirect hook was fired
    RedirectFired {
        index: usize,
        name: String,
        timestamp: i64,
    },
    /// The continuation predicate rejected
    Aborted { index: usize, timestamp: i64 },
    /// The pass stopped with a resolution or hook failure
    Failed {
        index: usize,
        kind: String, // "resolution", "hook"
        timestamp: i64,
    },
}

impl TimelineEvent {
    pub fn timestamp(&self) -> i64 {
        match self {
            TimelineEvent::SegmentEnter { timestamp, .. }
            | TimelineEvent::SegmentResolved { timestamp, .. }
            | TimelineEvent::RedirectFired { timestamp, .. }
            | TimelineEvent::Aborted { timestamp, .. }
            | TimelineEvent::Failed { timestamp, .. } => *timestamp,
        }
    }
}

/// Milliseconds since the epoch, UTC.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A sequential record of one resolution pass.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Timeline {
    pub events: Vec<TimelineEvent>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TimelineEvent) {
        self.events.push(event);
    }

    /// Names of the segments whose redirect hook fired, in firing order.
    pub fn redirects(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TimelineEvent::RedirectFired { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Sort events by timestamp
    pub fn sort(&mut self) {
        self.events.sort_by_key(TimelineEvent::timestamp);
    }
}
