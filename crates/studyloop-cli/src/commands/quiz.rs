//! The `studyloop quiz` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use studyloop_client::load_config_from;
use studyloop_core::quiz::{QuizLoader, QuizSource};

pub async fn execute(topic: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let source = match topic {
        Some(topic) => QuizSource::Fresh { topic },
        None => QuizSource::Regenerated,
    };

    let loader = QuizLoader::new(Arc::new(config.client()?), Arc::new(config.handoff_store()));
    let quiz = loader.load(source).await?;

    eprintln!("Loaded {} quiz", quiz.source);
    println!("{}", quiz.title);
    println!("{}", serde_json::to_string_pretty(&quiz.payload)?);

    Ok(())
}
