pub mod resolver;
pub mod state;

pub mod prelude {
    pub use crate::resolver::{ResolveResult, Resolver, TransitionFailure};
    pub use crate::state::TransitionState;
}

pub use resolver::{ResolveResult, Resolver, TransitionFailure};
pub use state::TransitionState;
