//! Allocation errors and their kinds.

use std::fmt;

/// Errors returned by the allocation engine.
///
/// Every failure aborts the current cycle with no output. The reason string is
/// meant for operators and is not part of any wire format.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    /// Malformed percentage, position, or fill value.
    #[error("parse error: {0}")]
    Parse(String),

    /// A required snapshot was not available when the cycle started.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Reconciliation cannot reach the exact fill quantity.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}

impl AllocationError {
    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        AllocationError::Parse(reason.into())
    }

    pub(crate) fn missing(reason: impl Into<String>) -> Self {
        AllocationError::MissingInput(reason.into())
    }

    pub(crate) fn inconsistent(reason: impl Into<String>) -> Self {
        AllocationError::InconsistentState(reason.into())
    }

    /// The kind of failure, without the reason.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AllocationError::Parse(_) => ErrorKind::Parse,
            AllocationError::MissingInput(_) => ErrorKind::MissingInput,
            AllocationError::InconsistentState(_) => ErrorKind::InconsistentState,
        }
    }

    /// Human-readable reason attached to the failure.
    pub fn reason(&self) -> &str {
        match self {
            AllocationError::Parse(r)
            | AllocationError::MissingInput(r)
            | AllocationError::InconsistentState(r) => r,
        }
    }
}

/// Failure taxonomy used for logging and audit records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    Parse,
    MissingInput,
    InconsistentState,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Parse => write!(f, "ParseError"),
            ErrorKind::MissingInput => write!(f, "MissingInputError"),
            ErrorKind::InconsistentState => write!(f, "InconsistentStateError"),
        }
    }
}
