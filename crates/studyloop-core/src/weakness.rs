//! The weak-concept remediation model for one graded attempt.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{ConceptAnalysis, TopicInfo};
use crate::traits::RetestRequest;

/// What the remediation screen should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaknessState {
    /// No weak concepts came back, e.g. after a perfect score.
    NothingToRemediate,
    /// At least one concept needs remediation.
    NeedsRemediation { count: usize },
}

/// The weak concepts found in one graded attempt, plus the topic it was on.
///
/// Serializes as `{ "topic": ..., "analyses": [...] }`, which is also the
/// on-disk analysis file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaknessAnalysis {
    #[serde(flatten)]
    topic: TopicInfo,
    #[serde(default)]
    analyses: Vec<ConceptAnalysis>,
}

impl WeaknessAnalysis {
    pub fn new(topic: TopicInfo, analyses: Vec<ConceptAnalysis>) -> Self {
        Self { topic, analyses }
    }

    pub fn topic(&self) -> &TopicInfo {
        &self.topic
    }

    pub fn analyses(&self) -> &[ConceptAnalysis] {
        &self.analyses
    }

    /// Names of every held concept, in order, duplicates included.
    pub fn weak_concept_names(&self) -> Vec<String> {
        self.analyses
            .iter()
            .map(|a| a.concept_name.clone())
            .collect()
    }

    pub fn state(&self) -> WeaknessState {
        if self.analyses.is_empty() {
            WeaknessState::NothingToRemediate
        } else {
            WeaknessState::NeedsRemediation {
                count: self.analyses.len(),
            }
        }
    }

    /// The generation request for a retest on these concepts.
    pub fn retest_request(&self) -> RetestRequest {
        RetestRequest {
            topic: self.topic.topic.clone(),
            weak_concepts: self.weak_concept_names(),
        }
    }

    /// Save as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize analysis")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write analysis to {}", path.display()))?;
        Ok(())
    }

    /// Load from a JSON file written by [`WeaknessAnalysis::save_json`].
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analysis from {}", path.display()))?;
        let analysis: WeaknessAnalysis =
            serde_json::from_str(&content).context("failed to parse analysis JSON")?;
        Ok(analysis)
    }
}
