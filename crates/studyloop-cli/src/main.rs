//! studyloop CLI — analytics, remediation, and adaptive retests.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studyloop", version, about = "Weak-concept remediation and adaptive retests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show score history and per-subject averages
    Analytics {
        /// User whose history to show (defaults to the configured username)
        #[arg(long)]
        user: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Send a finished attempt for grading and save the analysis
    Submit {
        /// Attempt JSON (username, subject, topic, score, questions, user_answers)
        #[arg(long)]
        attempt: PathBuf,

        /// Where to write the analysis file
        #[arg(long, default_value = "./analysis.json")]
        output: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Review weak concepts from an analysis file
    Remediate {
        /// Analysis file written by `submit`
        #[arg(long)]
        analysis: PathBuf,

        /// Generate a follow-up quiz on the weak concepts
        #[arg(long)]
        retest: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load the quiz the quiz flow would run
    Quiz {
        /// Generate a fresh quiz on this topic instead of using the retest
        #[arg(long)]
        topic: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studyloop=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analytics {
            user,
            format,
            config,
        } => commands::analytics::execute(user, format, config).await,
        Commands::Submit {
            attempt,
            output,
            config,
        } => commands::submit::execute(attempt, output, config).await,
        Commands::Remediate {
            analysis,
            retest,
            config,
        } => commands::remediate::execute(analysis, retest, config).await,
        Commands::Quiz { topic, config } => commands::quiz::execute(topic, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
