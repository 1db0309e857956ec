//! Configuration management for nanocode.
//!
//! Configuration can be set via environment variables:
//! - `GEMINI_API_KEY` - Required for talking to the model. A missing key is
//!   reported when the first request is made, not at startup.
//! - `MODEL` - Optional. The model identifier. Defaults to `gemini-3-flash-preview`.
//! - `GEMINI_API_URL` - Optional. Interactions endpoint override.
//! - `MAX_OUTPUT_TOKENS` - Optional. Generation cap per response. Defaults to `8192`.
//!
//! Variables may be pre-populated from a `.env` file, see [`load_env_files`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Default interactions endpoint.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/interactions";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Hard wall-clock bound for the `bash` tool.
pub const BASH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Cannot determine working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
}

/// Process-wide configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key, if one was provided
    pub api_key: Option<String>,

    /// Model identifier sent with every request
    pub model: String,

    /// Interactions endpoint
    pub api_url: String,

    /// Directory tools resolve relative paths against
    pub workspace_path: PathBuf,

    /// `generation_config.max_output_tokens`
    pub max_output_tokens: u32,

    /// Wall-clock bound for shell commands
    pub bash_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `MAX_OUTPUT_TOKENS` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let model = std::env::var("MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_url =
            std::env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let max_output_tokens = std::env::var("MAX_OUTPUT_TOKENS")
            .unwrap_or_else(|_| "8192".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("MAX_OUTPUT_TOKENS".to_string(), format!("{}", e))
            })?;

        let workspace_path = std::env::current_dir().map_err(ConfigError::WorkingDirectory)?;

        Ok(Self {
            api_key,
            model,
            api_url,
            workspace_path,
            max_output_tokens,
            bash_timeout: BASH_TIMEOUT,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: Option<String>, model: String, workspace_path: PathBuf) -> Self {
        Self {
            api_key,
            model,
            api_url: DEFAULT_API_URL.to_string(),
            workspace_path,
            max_output_tokens: 8192,
            bash_timeout: BASH_TIMEOUT,
        }
    }
}

/// Pre-populate the environment from `.env` files.
///
/// Looks in the working directory first, then next to the executable.
/// Variables already set are left alone, and unreadable or malformed files are skipped.
pub fn load_env_files() {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(".env"));
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
    {
        candidates.push(dir.join(".env"));
    }

    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match dotenvy::from_path(&path) {
            Ok(()) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) => tracing::debug!("Skipping {}: {}", path.display(), e),
        }
    }
}
