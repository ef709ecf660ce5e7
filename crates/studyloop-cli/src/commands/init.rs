//! The `studyloop init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("studyloop.toml").exists() {
        println!("studyloop.toml already exists, skipping.");
    } else {
        std::fs::write("studyloop.toml", SAMPLE_CONFIG)?;
        println!("Created studyloop.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set `username` and `[service] base_url` in studyloop.toml");
    println!("  2. Run: studyloop analytics");
    println!("  3. Run: studyloop submit --attempt attempt.json");
    println!("  4. Run: studyloop remediate --analysis analysis.json --retest");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# studyloop configuration

username = "${USER}"

# "trust" passes upstream records through; "reject" refuses scores outside
# [0, 100] and practice answers that are not one of their options.
record_policy = "trust"

[service]
base_url = "http://localhost:5000"
timeout_secs = 120
# api_key = "${STUDYLOOP_API_KEY}"

[handoff]
path = "./.studyloop/handoff.json"
"#;
