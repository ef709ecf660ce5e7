//! Adaptive retest orchestrator.
//!
//! Asks the generation service for a quiz scoped to the weak concepts,
//! publishes it to the handoff slot, and tells the caller to move on to the
//! quiz flow.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::RetestError;
use crate::handoff::{dynamic_test_label, HandoffEntry, HandoffStore};
use crate::quiz::QuizSource;
use crate::traits::{QuestionGenerator, RetestRequest};
use crate::weakness::WeaknessAnalysis;

/// Phase of a single retest invocation.
///
/// `Idle -> Requesting -> {Published, Failed}`. Every invocation starts
/// over at `Idle`; nothing carries between invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetestPhase {
    Idle,
    Requesting,
    Published,
    Failed,
}

impl RetestPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RetestPhase::Published | RetestPhase::Failed)
    }
}

impl fmt::Display for RetestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetestPhase::Idle => write!(f, "idle"),
            RetestPhase::Requesting => write!(f, "requesting"),
            RetestPhase::Published => write!(f, "published"),
            RetestPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Receives phase changes, e.g. to disable the retest control while a
/// request is outstanding.
pub trait RetestObserver: Send + Sync {
    fn on_phase(&self, topic: &str, phase: RetestPhase);
}

/// No-op observer.
pub struct NoopObserver;

impl RetestObserver for NoopObserver {
    fn on_phase(&self, _: &str, _: RetestPhase) {}
}

/// Proof of a publication to the handoff slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandoffToken {
    pub id: Uuid,
    /// The label written under `currentTopicName`.
    pub label: String,
    pub published_at: DateTime<Utc>,
}

/// Result of a successful retest: where the quiz went and where to go next.
#[derive(Debug, Clone, PartialEq)]
pub struct RetestOutcome {
    pub token: HandoffToken,
    /// Always [`QuizSource::Regenerated`]; the quiz flow reads the slot.
    pub next: QuizSource,
}

/// Drives one generate-then-publish cycle per call.
///
/// Concurrent calls are not coordinated; the slot keeps whichever
/// publication lands last.
pub struct RetestOrchestrator {
    generator: Arc<dyn QuestionGenerator>,
    handoff: Arc<dyn HandoffStore>,
    observer: Arc<dyn RetestObserver>,
}

impl RetestOrchestrator {
    pub fn new(generator: Arc<dyn QuestionGenerator>, handoff: Arc<dyn HandoffStore>) -> Self {
        Self {
            generator,
            handoff,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RetestObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Request a retest for the concepts held by `analysis`.
    pub async fn retest_from(
        &self,
        analysis: &WeaknessAnalysis,
    ) -> Result<RetestOutcome, RetestError> {
        let request = analysis.retest_request();
        self.request_adaptive_retest(&request.topic, request.weak_concepts)
            .await
    }

    /// Generate a quiz on `weak_concepts` and publish it under
    /// `"Dynamic Test: " + topic`.
    ///
    /// Sends exactly one generation request. An empty concept list is
    /// forwarded unchanged. If generation fails the handoff slot is not
    /// written.
    pub async fn request_adaptive_retest(
        &self,
        topic: &str,
        weak_concepts: Vec<String>,
    ) -> Result<RetestOutcome, RetestError> {
        self.observer.on_phase(topic, RetestPhase::Idle);
        if weak_concepts.is_empty() {
            tracing::warn!(topic, "requesting a retest with no weak concepts");
        }

        let request = RetestRequest {
            topic: topic.to_string(),
            weak_concepts,
        };

        self.transition(topic, RetestPhase::Requesting);
        let start = Instant::now();
        let payload = match self.generator.generate_retest(&request).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(topic, error = %e, "retest generation failed");
                self.transition(topic, RetestPhase::Failed);
                return Err(e.into());
            }
        };
        tracing::debug!(
            topic,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "retest generated"
        );

        let label = dynamic_test_label(topic);
        let entry = HandoffEntry {
            current_quiz: payload,
            current_topic_name: label.clone(),
        };
        if let Err(e) = self.handoff.publish(entry) {
            tracing::error!(topic, error = %e, "failed to publish retest");
            self.transition(topic, RetestPhase::Failed);
            return Err(e.into());
        }

        let token = HandoffToken {
            id: Uuid::new_v4(),
            label,
            published_at: Utc::now(),
        };
        self.transition(topic, RetestPhase::Published);
        tracing::info!(topic, token = %token.id, concepts = request.weak_concepts.len(), "retest published");

        Ok(RetestOutcome {
            token,
            next: QuizSource::Regenerated,
        })
    }

    fn transition(&self, topic: &str, phase: RetestPhase) {
        tracing::debug!(topic, %phase, "retest phase");
        self.observer.on_phase(topic, phase);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{GenerationError, HandoffError};
    use crate::handoff::MemoryHandoffStore;
    use crate::model::{ConceptAnalysis, QuizPayload, TopicInfo};

    /// Generator that records requests and either succeeds or fails.
    struct StubGenerator {
        fail: bool,
        requests: Mutex<Vec<RetestRequest>>,
    }

    impl StubGenerator {
        fn ok() -> Self {
            Self {
                fail: false,
                requests: Mutex::new(vec![]),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                requests: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl QuestionGenerator for StubGenerator {
        async fn generate_retest(
            &self,
            request: &RetestRequest,
        ) -> Result<QuizPayload, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(GenerationError::Service {
                    status: 500,
                    message: "Failed to generate dynamic test".into(),
                });
            }
            Ok(QuizPayload::new(
                serde_json::json!({ "concepts": request.weak_concepts }),
            ))
        }

        async fn generate_fresh(&self, _topic: &str) -> Result<QuizPayload, GenerationError> {
            unreachable!("retests never ask for a fresh quiz")
        }
    }

    struct BrokenStore;

    impl HandoffStore for BrokenStore {
        fn publish(&self, _: HandoffEntry) -> Result<(), HandoffError> {
            Err(HandoffError::Io {
                path: "/read-only/handoff.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn current(&self) -> Result<Option<HandoffEntry>, HandoffError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        phases: Mutex<Vec<RetestPhase>>,
    }

    impl RetestObserver for RecordingObserver {
        fn on_phase(&self, _: &str, phase: RetestPhase) {
            self.phases.lock().unwrap().push(phase);
        }
    }

    fn previous_entry() -> HandoffEntry {
        HandoffEntry {
            current_quiz: QuizPayload::new(serde_json::json!(["old"])),
            current_topic_name: "Gravity".into(),
        }
    }

    #[tokio::test]
    async fn success_publishes_both_keys() {
        let generator = Arc::new(StubGenerator::ok());
        let store = Arc::new(MemoryHandoffStore::with_entry(previous_entry()));
        let orchestrator = RetestOrchestrator::new(generator.clone(), store.clone());

        let outcome = orchestrator
            .request_adaptive_retest("Gravity", vec!["Free fall".into(), "Mass".into()])
            .await
            .unwrap();

        assert_eq!(outcome.next, QuizSource::Regenerated);
        assert_eq!(outcome.token.label, "Dynamic Test: Gravity");

        let entry = store.current().unwrap().unwrap();
        assert_eq!(entry.current_topic_name, "Dynamic Test: Gravity");
        assert_eq!(
            entry.current_quiz.as_json()["concepts"],
            serde_json::json!(["Free fall", "Mass"])
        );
        assert_eq!(generator.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failure_leaves_slot_untouched() {
        let generator = Arc::new(StubGenerator::failing());
        let store = Arc::new(MemoryHandoffStore::with_entry(previous_entry()));
        let orchestrator = RetestOrchestrator::new(generator.clone(), store.clone());

        let err = orchestrator
            .request_adaptive_retest("Gravity", vec!["Free fall".into()])
            .await
            .unwrap_err();

        assert!(matches!(err, RetestError::Generation(_)));
        assert_eq!(store.current().unwrap(), Some(previous_entry()));
        // No retry.
        assert_eq!(generator.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_concepts_are_forwarded() {
        let generator = Arc::new(StubGenerator::ok());
        let store = Arc::new(MemoryHandoffStore::new());
        let orchestrator = RetestOrchestrator::new(generator.clone(), store);

        orchestrator
            .request_adaptive_retest("The Atom", vec![])
            .await
            .unwrap();

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests[0].topic, "The Atom");
        assert!(requests[0].weak_concepts.is_empty());
    }

    #[tokio::test]
    async fn phases_follow_state_machine() {
        let observer = Arc::new(RecordingObserver::default());
        let orchestrator = RetestOrchestrator::new(
            Arc::new(StubGenerator::ok()),
            Arc::new(MemoryHandoffStore::new()),
        )
        .with_observer(observer.clone());
        orchestrator
            .request_adaptive_retest("Gravity", vec!["Mass".into()])
            .await
            .unwrap();
        assert_eq!(
            *observer.phases.lock().unwrap(),
            [
                RetestPhase::Idle,
                RetestPhase::Requesting,
                RetestPhase::Published
            ]
        );

        let observer = Arc::new(RecordingObserver::default());
        let orchestrator = RetestOrchestrator::new(
            Arc::new(StubGenerator::failing()),
            Arc::new(MemoryHandoffStore::new()),
        )
        .with_observer(observer.clone());
        let _ = orchestrator
            .request_adaptive_retest("Gravity", vec!["Mass".into()])
            .await;
        let phases = observer.phases.lock().unwrap();
        assert_eq!(phases.last(), Some(&RetestPhase::Failed));
        assert!(phases.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn handoff_failure_is_reported_separately() {
        let orchestrator =
            RetestOrchestrator::new(Arc::new(StubGenerator::ok()), Arc::new(BrokenStore));
        let err = orchestrator
            .request_adaptive_retest("Gravity", vec!["Mass".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, RetestError::Handoff(_)));
    }

    #[tokio::test]
    async fn retest_from_analysis_uses_weak_names() {
        let generator = Arc::new(StubGenerator::ok());
        let orchestrator =
            RetestOrchestrator::new(generator.clone(), Arc::new(MemoryHandoffStore::new()));
        let analysis = WeaknessAnalysis::new(
            TopicInfo::new("Numbers"),
            ["Fractions", "Decimals"]
                .into_iter()
                .map(|name| ConceptAnalysis {
                    concept_name: name.into(),
                    explanation: String::new(),
                    video_url: String::new(),
                    practice_questions: vec![],
                })
                .collect(),
        );

        let outcome = orchestrator.retest_from(&analysis).await.unwrap();
        assert_eq!(outcome.token.label, "Dynamic Test: Numbers");
        assert_eq!(
            generator.requests.lock().unwrap()[0].weak_concepts,
            ["Fractions", "Decimals"]
        );
    }
}
