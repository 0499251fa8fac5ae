//! Server and predictor configuration
//!
//! Optional TOML file at `~/.config/budgetwise/config.toml` (or `--config`):
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//! allowed_origins = ["http://localhost:5500"]
//! require_auth = true
//!
//! [predictor]
//! url = "http://127.0.0.1:5001"
//! timeout_secs = 5
//! min_confidence = 0.6
//! ```
//!
//! Environment variables override the file: `BW_PREDICTOR_URL`,
//! `BW_PREDICTOR_TIMEOUT_SECS`, `BW_API_KEYS`, `BW_ALLOWED_ORIGINS`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::predictor::{DEFAULT_TIMEOUT_SECS, PREDICTOR_TIMEOUT_ENV, PREDICTOR_URL_ENV};

/// Comma-separated service API keys
pub const API_KEYS_ENV: &str = "BW_API_KEYS";

/// Comma-separated CORS origins
pub const ALLOWED_ORIGINS_ENV: &str = "BW_ALLOWED_ORIGINS";

/// Suggestions below this confidence are not offered
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Empty means localhost-only CORS
    pub allowed_origins: Vec<String>,
    pub require_auth: bool,
    /// Service keys accepted as `Authorization: Bearer <key>`
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            allowed_origins: Vec::new(),
            require_auth: true,
            api_keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Base URL of the prediction service; unset disables prediction
    pub url: Option<String>,
    pub timeout_secs: u64,
    pub min_confidence: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl PredictorConfig {
    /// Apply `BW_PREDICTOR_*` from the process environment
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_env(&|key| std::env::var(key).ok());
        self
    }

    fn apply_env(&mut self, env: &dyn Fn(&str) -> Option<String>) {
        if let Some(url) = env(PREDICTOR_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.url = Some(url.trim().to_string());
        }
        if let Some(raw) = env(PREDICTOR_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => warn!("Ignoring invalid {}={}", PREDICTOR_TIMEOUT_ENV, raw),
            }
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub predictor: PredictorConfig,
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("budgetwise").join("config.toml"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl AppConfig {
    /// Load the config file, then apply environment overrides
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No config file, using defaults");
                    Self::default()
                }
            },
        };
        Ok(config.with_env_overrides())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        if config.predictor.timeout_secs == 0 {
            warn!(
                "Ignoring predictor timeout_secs = 0, using {}",
                DEFAULT_TIMEOUT_SECS
            );
            config.predictor.timeout_secs = DEFAULT_TIMEOUT_SECS;
        }

        Ok(config)
    }

    pub fn with_env_overrides(mut self) -> Self {
        self.apply_env(&|key| std::env::var(key).ok());
        self
    }

    fn apply_env(&mut self, env: &dyn Fn(&str) -> Option<String>) {
        self.predictor.apply_env(env);
        if let Some(raw) = env(API_KEYS_ENV) {
            self.server.api_keys = split_list(&raw);
        }
        if let Some(raw) = env(ALLOWED_ORIGINS_ENV) {
            self.server.allowed_origins = split_list(&raw);
        }
    }
}
