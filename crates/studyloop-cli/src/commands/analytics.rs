//! The `studyloop analytics` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use studyloop_client::load_config_from;
use studyloop_core::analytics::{aggregate, AnalyticsSummary};
use studyloop_core::traits::HistorySource;

pub async fn execute(
    user: Option<String>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let username = user
        .or_else(|| config.username.clone())
        .filter(|u| !u.is_empty())
        .context("no user given; pass --user or set `username` in studyloop.toml")?;

    let client = config.client()?;
    let history = client
        .fetch_history(&username)
        .await
        .with_context(|| format!("failed to fetch analytics for {username}"))?;

    tracing::debug!(rows = history.len(), user = %username, "history fetched");
    let summary = aggregate(&history);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => {
            if summary.is_empty() {
                println!("No test data found.");
                return Ok(());
            }
            print_summary(&username, &summary);
        }
    }

    Ok(())
}

fn print_summary(username: &str, summary: &AnalyticsSummary) {
    println!(
        "Analytics for {username}: {} test(s) across {} subject(s)",
        summary.total_attempts(),
        summary.subject_counts.len()
    );

    let mut subjects = Table::new();
    subjects.set_header(vec!["Subject", "Tests", "Average"]);
    for (subject, average) in &summary.subject_averages {
        let count = summary.subject_counts.get(subject).copied().unwrap_or(0);
        subjects.add_row(vec![
            Cell::new(subject),
            Cell::new(count),
            Cell::new(format!("{average:.1}%")),
        ]);
    }
    println!("\nAverage score by subject\n{subjects}");

    let mut history = Table::new();
    history.set_header(vec!["#", "Date", "Subject", "Topic", "Score"]);
    for (key, row) in summary.history_keys().iter().zip(&summary.sorted_history) {
        history.add_row(vec![
            Cell::new(key),
            Cell::new(row.test_date.format("%Y-%m-%d %H:%M")),
            Cell::new(&row.subject),
            Cell::new(&row.topic),
            Cell::new(format!("{:.0}%", row.score)),
        ]);
    }
    println!("\nHistory (newest first)\n{history}");
}
