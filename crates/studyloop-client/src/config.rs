//! Configuration loading and client factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use studyloop_core::handoff::FileHandoffStore;
use studyloop_core::validation::RecordPolicy;

use crate::http::ServiceClient;

/// Connection settings for the studyloop backend.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL shared by the grading, generation, and analytics endpoints.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional bearer token.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

/// Where the handoff slot lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    #[serde(default = "default_handoff_path")]
    pub path: PathBuf,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            path: default_handoff_path(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_handoff_path() -> PathBuf {
    PathBuf::from("./.studyloop/handoff.json")
}

/// Top-level studyloop configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyloopConfig {
    /// Default user for history queries.
    #[serde(default)]
    pub username: Option<String>,
    /// Whether upstream records are validated.
    #[serde(default)]
    pub record_policy: RecordPolicy,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub handoff: HandoffConfig,
}

impl StudyloopConfig {
    /// Build the HTTP client for all three services.
    pub fn client(&self) -> Result<ServiceClient> {
        ServiceClient::new(&self.service, self.record_policy)
    }

    /// Open the configured file-backed handoff slot.
    pub fn handoff_store(&self) -> FileHandoffStore {
        FileHandoffStore::new(&self.handoff.path)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `studyloop.toml` in the current directory
/// 2. `~/.config/studyloop/config.toml`
///
/// Environment variable overrides: `STUDYLOOP_BASE_URL`, `STUDYLOOP_USER`.
pub fn load_config() -> Result<StudyloopConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StudyloopConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("studyloop.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<StudyloopConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => StudyloopConfig::default(),
    };

    if let Ok(url) = std::env::var("STUDYLOOP_BASE_URL") {
        config.service.base_url = url;
    }
    if let Ok(user) = std::env::var("STUDYLOOP_USER") {
        config.username = Some(user);
    }

    config.service.base_url = resolve_env_vars(&config.service.base_url);
    config.service.api_key = config.service.api_key.as_deref().map(resolve_env_vars);
    config.username = config.username.as_deref().map(resolve_env_vars);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("studyloop"))
}
