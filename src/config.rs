//! Configuration loading and defaults.
//!
//! Configuration is a YAML file (`colloquy.yaml` by default); every field has
//! a default so the server runs with no file at all. The engine credential is
//! picked up from the environment once at startup and injected explicitly
//! where it is needed, never read ad hoc mid-request.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

/// Environment variable holding the agent engine credential.
pub const CREDENTIAL_ENV_VAR: &str = "ANTHROPIC_API_KEY";

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(Path::new(path)).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }

    /// Read the engine credential from the process environment.
    pub fn credential_from_env() -> Option<String> {
        std::env::var(CREDENTIAL_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout for non-streaming routes. The chat stream has none.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_keep_alive_interval")]
    pub keep_alive_interval_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            keep_alive_interval_seconds: default_keep_alive_interval(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    300
}

fn default_keep_alive_interval() -> u64 {
    15
}

// ============================================================================
// SessionsConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "default_sessions_path")]
    pub path: PathBuf,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            path: default_sessions_path(),
        }
    }
}

fn default_sessions_path() -> PathBuf {
    PathBuf::from(".colloquy/sessions")
}

// ============================================================================
// EngineConfig
// ============================================================================

/// Settings for the external agent engine CLI.
#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    /// Executable to spawn for each turn.
    #[serde(default = "default_engine_command")]
    pub command: String,
    /// Extra flags appended after the built-in ones.
    #[serde(default)]
    pub args: Vec<String>,
    /// Model passed through to the engine; also recorded on new sessions.
    #[serde(default)]
    pub model: Option<String>,
    /// Attach raw diagnostics to error frames.
    #[serde(default)]
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            args: Vec::new(),
            model: None,
            debug: false,
        }
    }
}

impl EngineConfig {
    /// The model descriptor stamped onto newly created session records.
    #[must_use]
    pub fn model_descriptor(&self) -> String {
        self.model.clone().unwrap_or_else(|| "default".to_string())
    }
}

fn default_engine_command() -> String {
    "claude".to_string()
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),
}

// ============================================================================
// Tests
// ============================================================================
