//! Error types shared across studyloop crates.
//!
//! Defined in `studyloop-core` so the orchestrator can tell a failed
//! generation request apart from a failed handoff write without string
//! matching.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a request to the question-generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The service answered with a non-success status.
    #[error("generation service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    /// The request timed out.
    #[error("generation request timed out after {0}s")]
    Timeout(u64),

    /// The request never reached the service, or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered 2xx but the body was not a quiz.
    #[error("invalid generation response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// Returns `true` if the service was never reached or never answered.
    pub fn is_transport(&self) -> bool {
        matches!(self, GenerationError::Timeout(_) | GenerationError::Network(_))
    }
}

/// Failure of a read-only collaborator (grading or analytics service).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A record violated an invariant while `RecordPolicy::Reject` was active.
    #[error(transparent)]
    Malformed(#[from] MalformedRecordError),
}

/// Failure to read or write the handoff slot.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("handoff slot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("handoff slot contents are corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("could not encode the handoff entry: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failure of one adaptive retest invocation.
#[derive(Debug, Error)]
pub enum RetestError {
    /// The new quiz could not be generated. The handoff slot is untouched.
    #[error("could not generate the retest: {0}")]
    Generation(#[from] GenerationError),

    /// The quiz was generated but could not be published.
    #[error("could not publish the retest: {0}")]
    Handoff(#[from] HandoffError),
}

/// An upstream record that breaks a documented invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedRecordError {
    #[error("score {score} of result {row} is outside [0, 100]")]
    ScoreOutOfRange { row: usize, score: f64 },

    #[error("practice question {question:?} in concept {concept:?} answers {answer:?}, which is not an option")]
    AnswerNotAnOption {
        concept: String,
        question: String,
        answer: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_classification() {
        assert!(GenerationError::Timeout(30).is_transport());
        assert!(GenerationError::Network("refused".into()).is_transport());
        assert!(!GenerationError::Service {
            status: 500,
            message: "boom".into()
        }
        .is_transport());
    }

    #[test]
    fn retest_error_wraps_generation_error() {
        let err: RetestError = GenerationError::Service {
            status: 503,
            message: "unavailable".into(),
        }
        .into();
        assert!(matches!(err, RetestError::Generation(_)));
        assert!(err.to_string().contains("503"));
    }
}
