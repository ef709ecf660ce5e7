//! Core data model types for studyloop.
//!
//! These are the records exchanged with the grading, generation, and
//! analytics collaborators. All of them are produced upstream and treated
//! as read-only input here.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One row of a student's test history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Identifier assigned by the grading service, when it sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    /// When the test was completed.
    #[serde(deserialize_with = "deserialize_test_date")]
    pub test_date: DateTime<Utc>,
    /// Free-text topic label.
    #[serde(default)]
    pub topic: String,
    /// Free-text subject/category label.
    pub subject: String,
    /// Percentage score, expected in `[0, 100]`.
    pub score: f64,
}

/// One weak concept identified by the grading service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptAnalysis {
    pub concept_name: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub video_url: String,
    /// Practice questions in presentation order. May be empty.
    #[serde(default)]
    pub practice_questions: Vec<PracticeQuestion>,
}

/// A multiple-choice practice question attached to a weak concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeQuestion {
    pub question: String,
    /// Option key (e.g. "A") to option text.
    pub options: BTreeMap<String, String>,
    /// Key of the correct option.
    pub answer: String,
}

/// The topic under which the original test was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    pub topic: String,
}

impl TopicInfo {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

/// A generated quiz. The shape belongs to the quiz-taking flow, so it is
/// carried as raw JSON and never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizPayload(pub serde_json::Value);

impl QuizPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

/// A finished attempt sent to the grading service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSubmission {
    pub username: String,
    pub subject: String,
    pub topic: String,
    pub score: f64,
    /// The questions as they were presented.
    #[serde(default)]
    pub questions: serde_json::Value,
    /// The student's answers, keyed however the quiz flow keys them.
    #[serde(default)]
    pub user_answers: serde_json::Value,
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (taken as UTC), `YYYY-MM-DD`,
/// or integer epoch milliseconds.
fn deserialize_test_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Millis(i64),
        Text(String),
    }

    match RawDate::deserialize(deserializer)? {
        RawDate::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
        RawDate::Text(s) => parse_test_date(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse a textual test date in any of the accepted formats.
pub fn parse_test_date(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("unrecognized test date: {s:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_accepts_sqlite_timestamp() {
        let row: TestResult = serde_json::from_str(
            r#"{"test_date":"2024-01-03 09:15:00","subject":"Math","topic":"Fractions","score":80}"#,
        )
        .unwrap();
        assert_eq!(row.test_date.to_rfc3339(), "2024-01-03T09:15:00+00:00");
        assert!(row.result_id.is_none());
    }

    #[test]
    fn test_date_accepts_epoch_millis_and_plain_date() {
        let a: TestResult =
            serde_json::from_str(r#"{"test_date":1704067200000,"subject":"Math","score":60}"#)
                .unwrap();
        let b: TestResult =
            serde_json::from_str(r#"{"test_date":"2024-01-01","subject":"Math","score":60}"#)
                .unwrap();
        assert_eq!(a.test_date, b.test_date);
        assert_eq!(a.topic, "");
    }

    #[test]
    fn test_date_rejects_garbage() {
        let err = serde_json::from_str::<TestResult>(
            r#"{"test_date":"last tuesday","subject":"Math","score":60}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unrecognized test date"));
    }

    #[test]
    fn concept_analysis_defaults_missing_fields() {
        let analysis: ConceptAnalysis =
            serde_json::from_str(r#"{"concept_name":"Fractions"}"#).unwrap();
        assert_eq!(analysis.concept_name, "Fractions");
        assert!(analysis.practice_questions.is_empty());
        assert!(analysis.video_url.is_empty());
    }

    #[test]
    fn quiz_payload_is_transparent() {
        let payload = QuizPayload::new(serde_json::json!([{"question": "2+2?"}]));
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"[{"question":"2+2?"}]"#);
    }
}
