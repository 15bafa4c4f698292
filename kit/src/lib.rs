//! Segue facade crate.
//!
//! This crate re-exports the core contracts and the runtime resolver with a
//! single entry point, plus tracing initialisation for applications.

pub use segue_core as core;
pub use segue_runtime as runtime;

pub use segue_core::{Bus, Continuation, Handler, ResolverConfig, SegmentInfo, TransitionError};
pub use segue_runtime::{ResolveResult, Resolver, TransitionFailure, TransitionState};

pub mod observe;

pub mod prelude {
    pub use segue_core::prelude::*;
    pub use segue_runtime::prelude::*;
}
