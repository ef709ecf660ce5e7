//! In-memory collaborators for testing without a backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use studyloop_core::error::{GenerationError, ServiceError};
use studyloop_core::model::{AttemptSubmission, ConceptAnalysis, QuizPayload, TestResult};
use studyloop_core::traits::{GradingService, HistorySource, QuestionGenerator, RetestRequest};

/// A mock backend serving canned quizzes, analyses, and histories.
pub struct MockBackend {
    quiz: QuizPayload,
    fail_generation: bool,
    analyses: Vec<ConceptAnalysis>,
    histories: HashMap<String, Vec<TestResult>>,
    generation_calls: AtomicU32,
    last_retest: Mutex<Option<RetestRequest>>,
}

impl MockBackend {
    /// A backend that answers every generation request with `quiz`.
    pub fn with_quiz(quiz: serde_json::Value) -> Self {
        Self {
            quiz: QuizPayload::new(quiz),
            fail_generation: false,
            analyses: Vec::new(),
            histories: HashMap::new(),
            generation_calls: AtomicU32::new(0),
            last_retest: Mutex::new(None),
        }
    }

    /// A backend whose generation endpoints always fail with HTTP 500.
    pub fn failing_generation() -> Self {
        Self {
            fail_generation: true,
            ..Self::with_quiz(serde_json::Value::Null)
        }
    }

    /// Analyses returned from every submission.
    pub fn with_analyses(mut self, analyses: Vec<ConceptAnalysis>) -> Self {
        self.analyses = analyses;
        self
    }

    /// History returned for `username`.
    pub fn with_history(mut self, username: &str, history: Vec<TestResult>) -> Self {
        self.histories.insert(username.to_string(), history);
        self
    }

    /// Number of generation requests received.
    pub fn generation_calls(&self) -> u32 {
        self.generation_calls.load(Ordering::Relaxed)
    }

    /// The last retest request received.
    pub fn last_retest(&self) -> Option<RetestRequest> {
        self.last_retest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn generate(&self) -> Result<QuizPayload, GenerationError> {
        self.generation_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_generation {
            return Err(GenerationError::Service {
                status: 500,
                message: "Failed to generate test".into(),
            });
        }
        Ok(self.quiz.clone())
    }
}

#[async_trait]
impl QuestionGenerator for MockBackend {
    async fn generate_retest(&self, request: &RetestRequest) -> Result<QuizPayload, GenerationError> {
        *self.last_retest.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());
        self.generate()
    }

    async fn generate_fresh(&self, _topic: &str) -> Result<QuizPayload, GenerationError> {
        self.generate()
    }
}

#[async_trait]
impl GradingService for MockBackend {
    async fn submit(&self, _: &AttemptSubmission) -> Result<Vec<ConceptAnalysis>, ServiceError> {
        Ok(self.analyses.clone())
    }
}

#[async_trait]
impl HistorySource for MockBackend {
    async fn fetch_history(&self, username: &str) -> Result<Vec<TestResult>, ServiceError> {
        Ok(self.histories.get(username).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use studyloop_core::analytics::aggregate;
    use studyloop_core::handoff::{HandoffStore, MemoryHandoffStore};
    use studyloop_core::model::parse_test_date;
    use studyloop_core::quiz::{QuizLoader, QuizSource};
    use studyloop_core::retest::RetestOrchestrator;

    use super::*;

    #[tokio::test]
    async fn retest_then_quiz_flow_reads_the_same_slot() {
        let backend = Arc::new(MockBackend::with_quiz(serde_json::json!({"q": 1})));
        let slot = Arc::new(MemoryHandoffStore::new());

        let orchestrator = RetestOrchestrator::new(backend.clone(), slot.clone());
        let outcome = orchestrator
            .request_adaptive_retest("Gravity", vec!["Free fall".into()])
            .await
            .unwrap();

        let loader = QuizLoader::new(backend.clone(), slot.clone());
        let quiz = loader.load(outcome.next).await.unwrap();
        assert_eq!(quiz.title, "Dynamic Test: Gravity");
        assert_eq!(quiz.payload.as_json()["q"], 1);
        assert_eq!(
            backend.last_retest().unwrap().weak_concepts,
            ["Free fall"]
        );
    }

    #[tokio::test]
    async fn failing_generation_keeps_previous_quiz() {
        let backend = Arc::new(MockBackend::failing_generation());
        let slot = Arc::new(MemoryHandoffStore::new());
        let orchestrator = RetestOrchestrator::new(backend.clone(), slot.clone());

        assert!(orchestrator
            .request_adaptive_retest("Gravity", vec!["Mass".into()])
            .await
            .is_err());
        assert!(slot.current().unwrap().is_none());
        assert_eq!(backend.generation_calls(), 1);

        let loader = QuizLoader::new(backend, slot);
        assert!(loader.load(QuizSource::Regenerated).await.is_err());
    }

    #[tokio::test]
    async fn history_feeds_aggregator() {
        let history = vec![TestResult {
            result_id: Some("1".into()),
            test_date: parse_test_date("2024-01-01").unwrap(),
            topic: "Gravity".into(),
            subject: "Physics".into(),
            score: 75.0,
        }];
        let backend = MockBackend::with_quiz(serde_json::Value::Null).with_history("asha", history);

        let summary = aggregate(&backend.fetch_history("asha").await.unwrap());
        assert_eq!(summary.subject_counts["Physics"], 1);
        assert!(aggregate(&backend.fetch_history("bo").await.unwrap()).is_empty());
    }
}
