//! Chart-ready aggregation of a student's test history.
//!
//! Everything here is a pure function of its input: no I/O, no caching
//! between calls.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::TestResult;

/// One point of the score-over-time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: DateTime<Utc>,
    pub score: f64,
}

/// Summary statistics derived from a list of test results.
///
/// Reading a summary back from JSON checks that `history_positions` is a
/// permutation of the input positions, one per `sorted_history` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SummaryFields")]
pub struct AnalyticsSummary {
    /// One point per input row, in input order.
    pub time_series: Vec<SeriesPoint>,
    /// Mean score per subject.
    pub subject_averages: BTreeMap<String, f64>,
    /// Number of attempts per subject.
    pub subject_counts: BTreeMap<String, usize>,
    /// Input rows ordered newest-first, stable on equal dates.
    pub sorted_history: Vec<TestResult>,
    /// Input position of each `sorted_history` row.
    history_positions: Vec<usize>,
}

#[derive(Deserialize)]
struct SummaryFields {
    time_series: Vec<SeriesPoint>,
    subject_averages: BTreeMap<String, f64>,
    subject_counts: BTreeMap<String, usize>,
    sorted_history: Vec<TestResult>,
    #[serde(default)]
    history_positions: Vec<usize>,
}

impl TryFrom<SummaryFields> for AnalyticsSummary {
    type Error = String;

    fn try_from(fields: SummaryFields) -> Result<Self, Self::Error> {
        let rows = fields.sorted_history.len();
        if fields.history_positions.len() != rows {
            return Err(format!(
                "history_positions has {} entries for {rows} history rows",
                fields.history_positions.len()
            ));
        }
        let mut seen = vec![false; rows];
        for &pos in &fields.history_positions {
            match seen.get_mut(pos) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(format!("history position {pos} is out of range or repeated")),
            }
        }
        Ok(AnalyticsSummary {
            time_series: fields.time_series,
            subject_averages: fields.subject_averages,
            subject_counts: fields.subject_counts,
            sorted_history: fields.sorted_history,
            history_positions: fields.history_positions,
        })
    }
}

/// Identity of a history row for display keying.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    /// The `result_id` sent by the grading service.
    Id(String),
    /// Position in the input sequence. Only stable while the collaborator
    /// returns rows in the same order on every read.
    Position(usize),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Id(id) => write!(f, "{id}"),
            RowKey::Position(i) => write!(f, "#{i}"),
        }
    }
}

impl AnalyticsSummary {
    /// True when there was no history to aggregate.
    pub fn is_empty(&self) -> bool {
        self.sorted_history.is_empty()
    }

    /// Total attempts across all subjects.
    pub fn total_attempts(&self) -> usize {
        self.sorted_history.len()
    }

    /// Display keys for `sorted_history`, row for row.
    pub fn history_keys(&self) -> Vec<RowKey> {
        self.sorted_history
            .iter()
            .zip(&self.history_positions)
            .map(|(row, &pos)| match &row.result_id {
                Some(id) => RowKey::Id(id.clone()),
                None => RowKey::Position(pos),
            })
            .collect()
    }
}

/// Aggregate raw results into an [`AnalyticsSummary`].
///
/// Rows are not filtered or validated. An empty slice yields an empty
/// summary; deciding whether to show a "no data" state is up to the caller.
pub fn aggregate(results: &[TestResult]) -> AnalyticsSummary {
    let time_series = results
        .iter()
        .map(|r| SeriesPoint {
            date: r.test_date,
            score: r.score,
        })
        .collect();

    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for r in results {
        let entry = totals.entry(r.subject.clone()).or_insert((0.0, 0));
        entry.0 += r.score;
        entry.1 += 1;
    }

    let subject_counts = totals
        .iter()
        .map(|(subject, &(_, count))| (subject.clone(), count))
        .collect();
    // Every key has at least one observation, so count >= 1.
    let subject_averages = totals
        .into_iter()
        .map(|(subject, (sum, count))| (subject, sum / count as f64))
        .collect();

    // `sort_by` is stable, which keeps equal dates in input order.
    let mut order: Vec<usize> = (0..results.len()).collect();
    order.sort_by(|&a, &b| results[b].test_date.cmp(&results[a].test_date));
    let sorted_history = order.iter().map(|&i| results[i].clone()).collect();

    AnalyticsSummary {
        time_series,
        subject_averages,
        subject_counts,
        sorted_history,
        history_positions: order,
    }
}
