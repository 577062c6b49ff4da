//! Application configuration for Sceneweaver.
//!
//! User config lives at `~/.sceneweaver/sceneweaver.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneweaverError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sceneweaver.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sceneweaver";

// ---------------------------------------------------------------------------
// Config structs (matching sceneweaver.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Gemini analysis settings.
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Chunk size (characters) for the non-AI fallback path.
    #[serde(default = "default_fallback_chunk_size")]
    pub fallback_chunk_size: usize,

    /// How many leading characters to sample for the lightweight vibe probe.
    #[serde(default = "default_vibe_sample_chars")]
    pub vibe_sample_chars: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            fallback_chunk_size: default_fallback_chunk_size(),
            vibe_sample_chars: default_vibe_sample_chars(),
        }
    }
}

fn default_fallback_chunk_size() -> usize {
    1500
}
fn default_vibe_sample_chars() -> usize {
    5000
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the generative language API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model ids tried in priority order during extraction.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Pause between failed model attempts, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Hard cap on characters submitted for analysis.
    #[serde(default = "default_max_analysis_chars")]
    pub max_analysis_chars: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_base: default_api_base(),
            models: default_models(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_analysis_chars: default_max_analysis_chars(),
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_models() -> Vec<String> {
    // Known-good primary first, then the large-context alternate.
    vec!["gemini-2.5-flash".into(), "gemini-2.0-flash".into()]
}
fn default_retry_backoff_ms() -> u64 {
    1000
}
fn default_max_analysis_chars() -> usize {
    500_000
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sceneweaver/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SceneweaverError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sceneweaver/sceneweaver.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| SceneweaverError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SceneweaverError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SceneweaverError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SceneweaverError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SceneweaverError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the Gemini API key from the configured environment variable.
///
/// Returns `None` when the variable is unset or empty. The pipeline treats
/// that as "no analysis capability configured" and uses the offline path,
/// never an error.
pub fn resolve_api_key(config: &AppConfig) -> Option<String> {
    match std::env::var(&config.gemini.api_key_env) {
        Ok(val) if !val.is_empty() => Some(val),
        _ => None,
    }
}
