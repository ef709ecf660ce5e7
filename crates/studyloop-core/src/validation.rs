//! Boundary checks for upstream records.
//!
//! The grading service is trusted by default. Switching the policy to
//! [`RecordPolicy::Reject`] makes the collaborator boundary refuse records
//! that break the score range or answer-key invariants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MalformedRecordError;
use crate::model::{ConceptAnalysis, TestResult};

/// How records from upstream collaborators are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordPolicy {
    /// Pass records through unchecked.
    #[default]
    Trust,
    /// Reject a batch on its first malformed record.
    Reject,
}

impl fmt::Display for RecordPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordPolicy::Trust => write!(f, "trust"),
            RecordPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for RecordPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trust" => Ok(RecordPolicy::Trust),
            "reject" | "strict" => Ok(RecordPolicy::Reject),
            other => Err(format!("unknown record policy: {other}")),
        }
    }
}

impl RecordPolicy {
    /// Apply the policy to a batch of test results.
    pub fn check_results(self, results: &[TestResult]) -> Result<(), MalformedRecordError> {
        match self {
            RecordPolicy::Trust => Ok(()),
            RecordPolicy::Reject => validate_results(results),
        }
    }

    /// Apply the policy to a batch of concept analyses.
    pub fn check_analyses(self, analyses: &[ConceptAnalysis]) -> Result<(), MalformedRecordError> {
        match self {
            RecordPolicy::Trust => Ok(()),
            RecordPolicy::Reject => validate_analyses(analyses),
        }
    }
}

/// Every score must lie in `[0, 100]`.
pub fn validate_results(results: &[TestResult]) -> Result<(), MalformedRecordError> {
    for (row, r) in results.iter().enumerate() {
        if !(0.0..=100.0).contains(&r.score) {
            return Err(MalformedRecordError::ScoreOutOfRange {
                row,
                score: r.score,
            });
        }
    }
    Ok(())
}

/// Every practice answer must name one of its options.
pub fn validate_analyses(analyses: &[ConceptAnalysis]) -> Result<(), MalformedRecordError> {
    for analysis in analyses {
        for q in &analysis.practice_questions {
            if !q.options.contains_key(&q.answer) {
                return Err(MalformedRecordError::AnswerNotAnOption {
                    concept: analysis.concept_name.clone(),
                    question: q.question.clone(),
                    answer: q.answer.clone(),
                });
            }
        }
    }
    Ok(())
}
