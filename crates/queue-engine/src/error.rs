//! Error types for the queue engine
//!
//! ## Error Categories
//!
//! - **AmbiguousTask**: zero or multiple queue tasks matched a call sid; the
//!   engine never guesses which task is the caller's
//! - **ExternalService**: a work-distribution call failed; callers treat this
//!   as "no data" and degrade, a dialog step never propagates it as a fault
//! - **PromptNotFound**: no phrase bundle for a (collection, language) pair;
//!   callers fall back to hold music
//! - **InvalidPhone**: a captured callback number is not a usable 10-digit
//!   national number
//! - **Configuration**: invalid engine configuration
//! - **Internal**: unexpected internal condition

use thiserror::Error;

/// Errors produced by queue engine operations
#[derive(Error, Debug)]
pub enum QueueEngineError {
    /// Zero or multiple active tasks matched a call sid. The invariant is at
    /// most one active task per call; anything else is an ambiguous state
    /// that must not be resolved by picking an arbitrary task.
    #[error("Ambiguous task match for call {call_sid}: {matches} candidate tasks")]
    AmbiguousTask { call_sid: String, matches: usize },

    /// A call to the work-distribution service failed
    #[error("Work-distribution service error: {0}")]
    ExternalService(String),

    /// No phrase bundle exists for the requested collection and language
    #[error("No prompts found for collection {collection} and language {language}")]
    PromptNotFound { collection: String, language: String },

    /// A captured callback number failed validation
    #[error("Invalid callback number: {0}")]
    InvalidPhone(String),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unexpected internal condition
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueueEngineError {
    /// Create an AmbiguousTask error for the given call sid and match count
    pub fn ambiguous_task(call_sid: impl Into<String>, matches: usize) -> Self {
        Self::AmbiguousTask {
            call_sid: call_sid.into(),
            matches,
        }
    }

    /// Create an ExternalService error with the provided message
    pub fn external<S: Into<String>>(msg: S) -> Self {
        Self::ExternalService(msg.into())
    }

    /// Create a PromptNotFound error for the given collection and language
    pub fn prompt_not_found(collection: impl Into<String>, language: impl Into<String>) -> Self {
        Self::PromptNotFound {
            collection: collection.into(),
            language: language.into(),
        }
    }

    /// Create an InvalidPhone error with the provided message
    pub fn invalid_phone<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPhone(msg.into())
    }

    /// Create a Configuration error with the provided message
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an Internal error with the provided message
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<reqwest::Error> for QueueEngineError {
    fn from(error: reqwest::Error) -> Self {
        Self::ExternalService(error.to_string())
    }
}

/// Result type for queue engine operations
pub type Result<T> = std::result::Result<T, QueueEngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = QueueEngineError::ambiguous_task("CA123", 2);
        assert_eq!(
            format!("{}", error),
            "Ambiguous task match for call CA123: 2 candidate tasks"
        );

        let error = QueueEngineError::external("connection refused");
        assert_eq!(
            format!("{}", error),
            "Work-distribution service error: connection refused"
        );

        let error = QueueEngineError::prompt_not_found("voice-queue.main-menu", "fr-FR");
        assert_eq!(
            format!("{}", error),
            "No prompts found for collection voice-queue.main-menu and language fr-FR"
        );
    }

    #[test]
    fn test_error_constructors() {
        match QueueEngineError::ambiguous_task("CA456", 0) {
            QueueEngineError::AmbiguousTask { call_sid, matches } => {
                assert_eq!(call_sid, "CA456");
                assert_eq!(matches, 0);
            }
            _ => panic!("Expected ambiguous task error"),
        }

        match QueueEngineError::invalid_phone("too short") {
            QueueEngineError::InvalidPhone(msg) => assert_eq!(msg, "too short"),
            _ => panic!("Expected invalid phone error"),
        }
    }
}
