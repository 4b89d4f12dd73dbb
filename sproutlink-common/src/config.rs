//! Configuration loading and API key resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (handled by the binary's clap layer)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default frontend origin allowed by the CORS layer
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Default listen address for the API service
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// TOML configuration file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Listen address, e.g. "127.0.0.1:8000"
    pub bind_addr: Option<String>,
    /// Path to the SQLite database file
    pub database_path: Option<String>,
    /// Frontend origin allowed by CORS
    pub allowed_origin: Option<String>,
    /// Gemini API key for OCR and report generation
    pub gemini_api_key: Option<String>,
}

impl TomlConfig {
    /// Load configuration from an explicit path, or the default location.
    ///
    /// A missing file is not an error; all fields fall back to their
    /// defaults and the caller is told via an info log.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = match explicit_path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        if !path.exists() {
            info!("No config file at {} (using defaults)", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Read config failed: {}", e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse config failed: {}", e)))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        self.bind_addr
            .clone()
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
    }

    pub fn allowed_origin(&self) -> String {
        self.allowed_origin
            .clone()
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string())
    }

    /// Database path, defaulting to `sproutlink.db` in the platform data dir.
    pub fn database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(p) => PathBuf::from(p),
            None => default_data_dir().join("sproutlink.db"),
        }
    }
}

/// Default configuration file path for the platform
/// (`~/.config/sproutlink/config.toml` on Linux)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("sproutlink").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("./sproutlink.toml"))
}

/// Default data directory for the platform
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sproutlink"))
        .unwrap_or_else(|| PathBuf::from("./sproutlink_data"))
}

/// Resolve the Gemini API key from 2-tier configuration
///
/// **Priority:** ENV → TOML
pub fn resolve_gemini_api_key(toml_config: &TomlConfig) -> Result<String> {
    let env_key = std::env::var("GEMINI_API_KEY").ok();
    let toml_key = toml_config.gemini_api_key.as_ref();

    if env_key.as_ref().map(|k| is_valid_key(k)).unwrap_or(false)
        && toml_key.map(|k| is_valid_key(k)).unwrap_or(false)
    {
        warn!("Gemini API key found in both environment and TOML. Using environment (highest priority).");
    }

    if let Some(key) = env_key {
        if is_valid_key(&key) {
            info!("Gemini API key loaded from environment variable");
            return Ok(key);
        }
    }

    if let Some(key) = toml_key {
        if is_valid_key(key) {
            info!("Gemini API key loaded from TOML config");
            return Ok(key.clone());
        }
    }

    Err(Error::Config(
        "Gemini API key not configured. Please configure using one of:\n\
         1. Environment: GEMINI_API_KEY=your-key-here\n\
         2. TOML config: ~/.config/sproutlink/config.toml (gemini_api_key = \"your-key\")"
            .to_string(),
    ))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let config = TomlConfig::default();
        assert_eq!(config.bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(config.allowed_origin(), DEFAULT_ALLOWED_ORIGIN);
        assert!(config.database_path().ends_with("sproutlink.db"));
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            bind_addr = "0.0.0.0:9000"
            database_path = "/tmp/test.db"
            allowed_origin = "https://app.example.org"
            gemini_api_key = "abc123"
        "#;
        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/test.db"));
        assert_eq!(config.allowed_origin(), "https://app.example.org");
        assert_eq!(config.gemini_api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_key_validation() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }
}
