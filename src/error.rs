//! Error taxonomy for the extraction pipeline.
//!
//! Each variant maps to a distinct caller reaction: configuration errors
//! are fatal and never retried, transport failures have already been
//! retried internally, and `NotFound` is a normal negative result rather
//! than a fault.

use thiserror::Error;

/// Why a login attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    /// The site flagged the password field after submission.
    BadPassword,
    /// The site flagged the identifier (email/username) field.
    BadIdentifier,
    /// A verification challenge was presented and was still unsolved
    /// after the operator gate resolved (or the gate was disabled).
    UnresolvedChallenge,
}

impl std::fmt::Display for LoginFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginFailure::BadPassword => write!(f, "password"),
            LoginFailure::BadIdentifier => write!(f, "identifier"),
            LoginFailure::UnresolvedChallenge => write!(f, "unresolved challenge"),
        }
    }
}

/// Errors surfaced by [`crate::pipeline::ProfilePipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing credentials or unusable storage paths. Fatal, no retry.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport-level navigation failure after the internal retry
    /// budget was exhausted.
    #[error("navigation failed after {attempts} attempts: {last_error}")]
    Transport { attempts: u32, last_error: String },

    /// Login could not be completed. Requires operator action, not retry.
    #[error("authentication failed: {0}")]
    Authentication(LoginFailure),

    /// The target profile does not exist, is restricted, or no
    /// extraction strategy produced a usable record.
    #[error("profile not found")]
    NotFound,

    /// Browser engine fault (launch, context, or protocol error).
    #[error("browser error: {0}")]
    Browser(#[from] anyhow::Error),
}

impl PipelineError {
    /// Whether this error represents a normal negative result rather
    /// than a pipeline fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PipelineError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_failure_display() {
        assert_eq!(LoginFailure::BadPassword.to_string(), "password");
        assert_eq!(
            LoginFailure::UnresolvedChallenge.to_string(),
            "unresolved challenge"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let err = PipelineError::Transport {
            attempts: 3,
            last_error: "timeout".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "navigation failed after 3 attempts: timeout"
        );
    }

    #[test]
    fn test_not_found_predicate() {
        assert!(PipelineError::NotFound.is_not_found());
        assert!(!PipelineError::Configuration("x".into()).is_not_found());
    }
}
