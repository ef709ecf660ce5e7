//! Collaborator traits for the remote services studyloop talks to.
//!
//! These async traits are implemented over HTTP by `studyloop-client`, and
//! by in-memory mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, ServiceError};
use crate::model::{AttemptSubmission, ConceptAnalysis, QuizPayload, TestResult};

// ---------------------------------------------------------------------------
// Question generation
// ---------------------------------------------------------------------------

/// Request for a quiz scoped to a set of weak concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetestRequest {
    pub topic: String,
    pub weak_concepts: Vec<String>,
}

/// Service that generates quiz content.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Generate a quiz focused on `request.weak_concepts`.
    async fn generate_retest(&self, request: &RetestRequest)
        -> Result<QuizPayload, GenerationError>;

    /// Generate a fresh quiz for a whole topic.
    async fn generate_fresh(&self, topic: &str) -> Result<QuizPayload, GenerationError>;
}

// ---------------------------------------------------------------------------
// Grading and history
// ---------------------------------------------------------------------------

/// Service that grades an attempt and explains the concepts it missed.
#[async_trait]
pub trait GradingService: Send + Sync {
    async fn submit(
        &self,
        submission: &AttemptSubmission,
    ) -> Result<Vec<ConceptAnalysis>, ServiceError>;
}

/// Service that returns a user's stored test history.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// All results for `username`. No history is an empty list, not an error.
    async fn fetch_history(&self, username: &str) -> Result<Vec<TestResult>, ServiceError>;
}
