pub mod bus;
pub mod config;
pub mod continuation;
pub mod error;
pub mod handler;
pub mod params;
pub mod segment;
pub mod telemetry;
pub mod timeline;

pub use bus::Bus;
pub use config::{ConfigError, ResolverConfig};
pub use continuation::{AbortGuard, AlwaysContinue, Continuation, FnContinuation, continue_fn};
pub use error::TransitionError;
pub use handler::Handler;
pub use params::{Params, ParamsMap};
pub use segment::{ContextSource, ResolvedSegment, SegmentInfo, UnresolvedSegment};
pub use telemetry::Traced;
pub use timeline::{Timeline, TimelineEvent};

pub mod prelude {
    pub use crate::bus::Bus;
    pub use crate::continuation::{AlwaysContinue, Continuation, continue_fn};
    pub use crate::error::TransitionError;
    pub use crate::handler::Handler;
    pub use crate::params::{Params, ParamsMap};
    pub use crate::segment::SegmentInfo;
    pub use crate::telemetry::Traced;
}
