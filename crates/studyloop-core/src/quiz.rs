//! Quiz loading for the quiz-taking flow.
//!
//! The quiz flow runs one way regardless of where its quiz came from; the
//! [`QuizSource`] says whether to generate a fresh quiz for a topic or pick
//! up the regenerated one left in the handoff slot.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error::{GenerationError, HandoffError};
use crate::handoff::HandoffStore;
use crate::model::QuizPayload;
use crate::traits::QuestionGenerator;

/// Where the quiz flow gets its quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizSource {
    /// Generate a new quiz covering the whole topic.
    Fresh { topic: String },
    /// Take the quiz most recently published to the handoff slot.
    Regenerated,
}

impl fmt::Display for QuizSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizSource::Fresh { topic } => write!(f, "fresh ({topic})"),
            QuizSource::Regenerated => write!(f, "regenerated"),
        }
    }
}

/// A quiz ready to be taken.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedQuiz {
    pub title: String,
    pub payload: QuizPayload,
    pub source: QuizSource,
}

#[derive(Debug, Error)]
pub enum QuizLoadError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Handoff(#[from] HandoffError),

    #[error("no regenerated quiz has been published yet")]
    NothingPublished,
}

/// Resolves a [`QuizSource`] into a [`LoadedQuiz`].
pub struct QuizLoader {
    generator: Arc<dyn QuestionGenerator>,
    handoff: Arc<dyn HandoffStore>,
}

impl QuizLoader {
    pub fn new(generator: Arc<dyn QuestionGenerator>, handoff: Arc<dyn HandoffStore>) -> Self {
        Self { generator, handoff }
    }

    pub async fn load(&self, source: QuizSource) -> Result<LoadedQuiz, QuizLoadError> {
        match source {
            QuizSource::Fresh { topic } => {
                let payload = self.generator.generate_fresh(&topic).await?;
                tracing::info!(topic = %topic, "fresh quiz generated");
                Ok(LoadedQuiz {
                    title: topic.clone(),
                    payload,
                    source: QuizSource::Fresh { topic },
                })
            }
            QuizSource::Regenerated => {
                let entry = self.handoff.current()?.ok_or(QuizLoadError::NothingPublished)?;
                Ok(LoadedQuiz {
                    title: entry.current_topic_name,
                    payload: entry.current_quiz,
                    source: QuizSource::Regenerated,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::handoff::{HandoffEntry, MemoryHandoffStore};
    use crate::traits::RetestRequest;

    struct TopicEcho;

    #[async_trait]
    impl QuestionGenerator for TopicEcho {
        async fn generate_retest(
            &self,
            request: &RetestRequest,
        ) -> Result<QuizPayload, GenerationError> {
            Ok(QuizPayload::new(serde_json::json!({"retest": request.topic})))
        }

        async fn generate_fresh(&self, topic: &str) -> Result<QuizPayload, GenerationError> {
            Ok(QuizPayload::new(serde_json::json!({"fresh": topic})))
        }
    }

    #[tokio::test]
    async fn fresh_source_generates_by_topic() {
        let loader = QuizLoader::new(Arc::new(TopicEcho), Arc::new(MemoryHandoffStore::new()));
        let quiz = loader
            .load(QuizSource::Fresh {
                topic: "Gravity".into(),
            })
            .await
            .unwrap();
        assert_eq!(quiz.title, "Gravity");
        assert_eq!(quiz.payload.as_json()["fresh"], "Gravity");
    }

    #[tokio::test]
    async fn regenerated_source_reads_handoff_slot() {
        let store = MemoryHandoffStore::with_entry(HandoffEntry {
            current_quiz: QuizPayload::new(serde_json::json!([1, 2, 3])),
            current_topic_name: "Dynamic Test: Gravity".into(),
        });
        let loader = QuizLoader::new(Arc::new(TopicEcho), Arc::new(store));
        let quiz = loader.load(QuizSource::Regenerated).await.unwrap();
        assert_eq!(quiz.title, "Dynamic Test: Gravity");
        assert_eq!(quiz.source, QuizSource::Regenerated);
        assert_eq!(quiz.source.to_string(), "regenerated");
    }

    #[tokio::test]
    async fn regenerated_source_with_empty_slot() {
        let loader = QuizLoader::new(Arc::new(TopicEcho), Arc::new(MemoryHandoffStore::new()));
        let err = loader.load(QuizSource::Regenerated).await.unwrap_err();
        assert!(matches!(err, QuizLoadError::NothingPublished));
    }
}
