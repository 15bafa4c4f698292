use thiserror::Error;

/// Why a transition pass stopped.
///
/// All variants display as the underlying error; the variant only records
/// where the failure came from.
#[derive(Error, Debug)]
pub enum TransitionError {
    /// The continuation predicate rejected (the transition was superseded or cancelled).
    #[error(transparent)]
    Aborted(anyhow::Error),
    /// A segment's own resolution failed (`before_model`, `model` or `after_model`).
    #[error(transparent)]
    Resolution(anyhow::Error),
    /// A `redirect` hook failed. Handled exactly like `Resolution`.
    #[error(transparent)]
    Hook(anyhow::Error),
}

impl TransitionError {
    pub fn is_abort(&self) -> bool {
        matches!(self, TransitionError::Aborted(_))
    }

    /// Short kind tag used in log events and timeline entries.
    pub fn kind(&self) -> &'static str {
        match self {
            TransitionError::Aborted(_) => "abort",
            TransitionError::Resolution(_) => "resolution",
            TransitionError::Hook(_) => "hook",
        }
    }

    pub fn into_inner(self) -> anyhow::Error {
        match self {
            TransitionError::Aborted(e)
            | TransitionError::Resolution(e)
            | TransitionError::Hook(e) => e,
        }
    }
}
