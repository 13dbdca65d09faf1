//! Domain error types.
//!
//! Every failure of the rating model and the exam state machine is reported
//! synchronously to the caller through [`CoreError`]. None of them are
//! transient, so callers never retry.

use thiserror::Error;

/// Errors raised by the evaluation and exam logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The data model's totality or membership guarantees were broken by the
    /// caller (e.g. a snapshot missing a criterion, an unknown question id).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The operation is not allowed in the current session state.
    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    /// A question index outside `[0, len)`.
    #[error("question index {index} out of bounds (exam has {len} questions)")]
    OutOfBounds { index: usize, len: usize },
}

impl CoreError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        CoreError::InvariantViolation(message.into())
    }

    pub(crate) fn invalid_state(operation: &'static str, state: impl ToString) -> Self {
        CoreError::InvalidState {
            operation,
            state: state.to_string(),
        }
    }

    /// Returns `true` if the error was caused by a session that no longer
    /// accepts mutations.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, CoreError::InvalidState { .. })
    }
}

/// Result alias for domain operations.
pub type CoreResult<T> = Result<T, CoreError>;
