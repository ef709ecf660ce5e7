//! The handoff slot between the remediation flow and the quiz flow.
//!
//! The slot holds exactly one [`HandoffEntry`]: the quiz under
//! `currentQuiz` and its display label under `currentTopicName`. Both keys
//! are always written and read together. A new publication overwrites the
//! previous one unconditionally; nothing expires.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::HandoffError;
use crate::model::QuizPayload;

/// Key of the serialized quiz payload.
pub const CURRENT_QUIZ_KEY: &str = "currentQuiz";
/// Key of the quiz's display label.
pub const CURRENT_TOPIC_NAME_KEY: &str = "currentTopicName";

/// Label prefix for regenerated quizzes.
pub const DYNAMIC_TEST_PREFIX: &str = "Dynamic Test: ";

/// Display label for a retest on `topic`.
pub fn dynamic_test_label(topic: &str) -> String {
    format!("{DYNAMIC_TEST_PREFIX}{topic}")
}

/// The paired contents of the handoff slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffEntry {
    #[serde(rename = "currentQuiz")]
    pub current_quiz: QuizPayload,
    #[serde(rename = "currentTopicName")]
    pub current_topic_name: String,
}

/// A last-writer-wins store for one [`HandoffEntry`].
///
/// Implementations must make `publish` all-or-nothing: a reader sees the
/// previous entry or the new one, never a mix.
pub trait HandoffStore: Send + Sync {
    /// Replace the slot contents.
    fn publish(&self, entry: HandoffEntry) -> Result<(), HandoffError>;

    /// Current contents, or `None` if nothing was ever published.
    fn current(&self) -> Result<Option<HandoffEntry>, HandoffError>;
}

/// In-process slot. Clones of an `Arc<MemoryHandoffStore>` share one slot.
#[derive(Debug, Default)]
pub struct MemoryHandoffStore {
    slot: RwLock<Option<HandoffEntry>>,
}

impl MemoryHandoffStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `entry`.
    pub fn with_entry(entry: HandoffEntry) -> Self {
        Self {
            slot: RwLock::new(Some(entry)),
        }
    }
}

impl HandoffStore for MemoryHandoffStore {
    fn publish(&self, entry: HandoffEntry) -> Result<(), HandoffError> {
        // A poisoned lock still holds a whole entry; keep using it.
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(entry);
        Ok(())
    }

    fn current(&self) -> Result<Option<HandoffEntry>, HandoffError> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        Ok(slot.clone())
    }
}

/// Slot persisted as a JSON object at `path`, shared across processes.
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over `path`.
#[derive(Debug, Clone)]
pub struct FileHandoffStore {
    path: PathBuf,
}

impl FileHandoffStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> HandoffError {
        HandoffError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl HandoffStore for FileHandoffStore {
    fn publish(&self, entry: HandoffEntry) -> Result<(), HandoffError> {
        let json = serde_json::to_vec_pretty(&entry).map_err(HandoffError::Encode)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&json).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        tracing::debug!(path = %self.path.display(), "handoff entry written");
        Ok(())
    }

    fn current(&self) -> Result<Option<HandoffEntry>, HandoffError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        Ok(Some(
            serde_json::from_str(&content).map_err(HandoffError::Corrupt)?,
        ))
    }
}
