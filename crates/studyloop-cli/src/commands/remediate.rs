//! The `studyloop remediate` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use studyloop_client::load_config_from;
use studyloop_core::model::ConceptAnalysis;
use studyloop_core::retest::{RetestObserver, RetestOrchestrator, RetestPhase};
use studyloop_core::weakness::{WeaknessAnalysis, WeaknessState};

/// Console phase reporter.
struct ConsoleObserver;

impl RetestObserver for ConsoleObserver {
    fn on_phase(&self, topic: &str, phase: RetestPhase) {
        if phase == RetestPhase::Requesting {
            eprintln!("Generating a dynamic test on {topic}...");
        }
    }
}

pub async fn execute(
    analysis_path: PathBuf,
    retest: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let analysis = WeaknessAnalysis::load_json(&analysis_path)?;

    config.record_policy.check_analyses(analysis.analyses())?;

    if analysis.state() == WeaknessState::NothingToRemediate {
        println!("No Analysis Found");
        println!("You may have gotten a perfect score, or an error occurred.");
        return Ok(());
    }

    println!("Your Test Analysis for {}", analysis.topic().topic);
    println!("You seem to be struggling with the following concepts. Let's review!");
    for item in analysis.analyses() {
        print_concept(item);
    }

    if !retest {
        println!("\nReady to try again? Re-run with --retest for a test on just these weak areas.");
        return Ok(());
    }

    let orchestrator = RetestOrchestrator::new(
        Arc::new(config.client()?),
        Arc::new(config.handoff_store()),
    )
    .with_observer(Arc::new(ConsoleObserver));

    let outcome = orchestrator
        .retest_from(&analysis)
        .await
        .context("Failed to create dynamic test")?;
    println!("\nCreated \"{}\" ({})", outcome.token.label, outcome.token.id);
    println!("Run `studyloop quiz` to start it.");
    Ok(())
}

fn print_concept(item: &ConceptAnalysis) {
    println!("\nConcept: {}", item.concept_name);
    println!("\n  Explanation\n  {}", item.explanation);
    if !item.video_url.is_empty() {
        println!("\n  Video to watch: {}", item.video_url);
    }
    if item.practice_questions.is_empty() {
        return;
    }
    println!("\n  Practice Questions");
    for (i, q) in item.practice_questions.iter().enumerate() {
        println!("  {}. {}", i + 1, q.question);
        for (key, text) in &q.options {
            println!("     {key}: {text}");
        }
        println!("     Correct Answer: {}", q.answer);
    }
}
