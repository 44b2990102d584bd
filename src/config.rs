use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::refine::extract::FallbackPolicy;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct IrisConfig {
    pub log: LogConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub refinement: RefinementConfig,
    pub recall: RecallConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    /// Usually supplied through `OPENAI_API_KEY` rather than the file.
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefinementConfig {
    pub max_passes: u32,
    pub stop_score: u8,
    pub extraction: FallbackPolicy,
    pub decompose: bool,
    /// Replaces the built-in critique instructions when set.
    pub system_prompt: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RecallConfig {
    pub enabled: bool,
    pub top_n: usize,
    pub max_distance: f64,
    pub required_clarity: u8,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_iris_dir()
            .join("memory.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".into(),
            chat_model: "gpt-3.5-turbo".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "text-embedding-3-small".into(),
        }
    }
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_passes: 5,
            stop_score: 9,
            extraction: FallbackPolicy::Strict,
            decompose: false,
            system_prompt: None,
        }
    }
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_n: 3,
            max_distance: 0.2,
            required_clarity: 10,
        }
    }
}

/// Returns `~/.iris/`, or `./.iris/` when no home directory is known.
pub fn default_iris_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".iris")
}

/// Returns the default config file path: `~/.iris/config.toml`
pub fn default_config_path() -> PathBuf {
    default_iris_dir().join("config.toml")
}

impl IrisConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            IrisConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject score settings the refinement loop and recall gate cannot meet.
    pub fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.refinement.stop_score) {
            bail!(
                "refinement.stop_score must be between 1 and 10, got {}",
                self.refinement.stop_score
            );
        }
        if !(1..=10).contains(&self.recall.required_clarity) {
            bail!(
                "recall.required_clarity must be between 1 and 10, got {}",
                self.recall.required_clarity
            );
        }
        Ok(())
    }

    /// Apply environment variable overrides.
    ///
    /// `IRIS_DB` wins over `DATABASE_URL` when both are set.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("DATABASE_URL") {
            match sqlite_path_from_url(&val) {
                Some(path) => self.storage.db_path = path.to_string(),
                None => warn!("ignoring DATABASE_URL: only sqlite: URLs or plain paths are supported"),
            }
        }
        if let Ok(val) = std::env::var("IRIS_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("IRIS_MODEL") {
            self.llm.chat_model = val;
        }
        if let Ok(val) = std::env::var("IRIS_BASE_URL") {
            self.llm.base_url = val;
        }
        if let Ok(val) = std::env::var("IRIS_LOG_LEVEL") {
            self.log.level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// The API key, or an error naming the variable to set.
    pub fn api_key(&self) -> Result<&str> {
        self.llm
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .context("no API key configured; set OPENAI_API_KEY")
    }
}

/// Database file path from a `DATABASE_URL` value.
///
/// `sqlite://` and `sqlite:` prefixes are stripped and plain paths pass through.
/// Any other `scheme://` URL yields `None`.
fn sqlite_path_from_url(url: &str) -> Option<&str> {
    if let Some(path) = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
    {
        return Some(path);
    }
    if url.contains("://") {
        return None;
    }
    Some(url)
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
