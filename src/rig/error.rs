use thiserror::Error;

/// Failures reported by the rig utilities.
///
/// All of them are local and recoverable; the host is expected to show the
/// message to the user and leave its scene untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RigError {
    /// A parameter is out of range or the input snapshot is unusable.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A lookup that the operation cannot continue without came up empty.
    #[error("no candidate found: {what}")]
    NoCandidateFound { what: String },

    /// The requested count cannot be satisfied under the separation constraint.
    #[error(
        "cannot select {requested} points at least {min_separation} apart (best attempt selected {selected})"
    )]
    InfeasibleConstraint {
        requested: usize,
        selected: usize,
        min_separation: f64,
    },
}

impl RigError {
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NoCandidateFound { what: what.into() }
    }
}

pub type RigResult<T> = Result<T, RigError>;
