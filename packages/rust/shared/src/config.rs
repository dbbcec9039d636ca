//! Application configuration for Topicflow.
//!
//! User config lives at `~/.topicflow/topicflow.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicflowError};
use crate::types::{PipelineConfig, PipelineStep};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "topicflow.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".topicflow";

// ---------------------------------------------------------------------------
// Config structs (matching topicflow.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Pipeline used when no pipeline file is given.
    #[serde(default)]
    pub pipeline: PipelineDefaults,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// libSQL database file holding runs, documents and versions.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Item cap for preview executions.
    #[serde(default = "default_preview_sample_limit")]
    pub preview_sample_limit: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            preview_sample_limit: default_preview_sample_limit(),
        }
    }
}

fn default_database_path() -> String {
    "topicflow.db".into()
}
fn default_preview_sample_limit() -> usize {
    50
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefaults {
    /// Default steps (same shape as a pipeline file's `processors`).
    #[serde(default = "default_steps")]
    pub steps: Vec<PipelineStep>,
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            steps: default_steps(),
        }
    }
}

impl PipelineDefaults {
    pub fn to_pipeline(&self) -> PipelineConfig {
        PipelineConfig::new(self.steps.clone())
    }
}

/// Extraction, then dedup, then clustering.
fn default_steps() -> Vec<PipelineStep> {
    vec![
        PipelineStep::new(0, "extract_text"),
        PipelineStep::new(10, "dedup_url"),
        PipelineStep::new(100, "cluster_tfidf"),
    ]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.topicflow/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TopicflowError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.topicflow/topicflow.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TopicflowError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TopicflowError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TopicflowError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TopicflowError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TopicflowError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a JSON pipeline file (`{"processors": [...]}`).
pub fn load_pipeline_from(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TopicflowError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| {
        TopicflowError::parse(format!("invalid pipeline in {}: {e}", path.display()))
    })
}
