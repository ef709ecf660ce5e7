//! The `studyloop submit` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use studyloop_client::load_config_from;
use studyloop_core::model::{AttemptSubmission, TopicInfo};
use studyloop_core::traits::GradingService;
use studyloop_core::weakness::{WeaknessAnalysis, WeaknessState};

pub async fn execute(
    attempt_path: PathBuf,
    output: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let content = std::fs::read_to_string(&attempt_path)
        .with_context(|| format!("failed to read attempt from {}", attempt_path.display()))?;
    let submission: AttemptSubmission =
        serde_json::from_str(&content).context("failed to parse attempt JSON")?;

    let client = config.client()?;
    let analyses = client
        .submit(&submission)
        .await
        .context("failed to analyze results")?;

    let analysis = WeaknessAnalysis::new(TopicInfo::new(&submission.topic), analyses);
    analysis.save_json(&output)?;

    match analysis.state() {
        WeaknessState::NothingToRemediate => {
            println!("No weak concepts found for {}.", submission.topic)
        }
        WeaknessState::NeedsRemediation { count } => {
            println!("{count} weak concept(s) found for {}.", submission.topic)
        }
    }
    eprintln!("Analysis saved to: {}", output.display());

    Ok(())
}
