//! Engine error types.
//!
//! All errors here are session-scoped and recoverable: the caller either
//! resubmits or ends the session via the early-termination path. Nothing in
//! the engine is fatal to the process.

use thiserror::Error;

/// Errors produced while driving an assessment session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The submitted differential contained no usable entries. Nothing was
    /// recorded; the caller must resubmit.
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    /// The submission referenced a case other than the one currently
    /// presented.
    #[error("unexpected case id: expected '{expected}', got '{got}'")]
    UnexpectedCase { expected: String, got: String },

    /// The session is not in a state that accepts this operation.
    #[error("session already terminated")]
    SessionTerminated,

    /// No case is currently presented (submit called before begin, or after
    /// a scored response without a follow-up case).
    #[error("no case awaiting a response")]
    NoCasePresented,
}

impl EngineError {
    /// Returns `true` if the caller can recover by resubmitting a corrected
    /// differential for the same case.
    pub fn is_resubmittable(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidSubmission(_) | EngineError::UnexpectedCase { .. }
        )
    }
}
