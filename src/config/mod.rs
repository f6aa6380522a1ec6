//! Configuration loading and validation.
//!
//! Read once at startup: an optional TOML file, overlaid by the process
//! environment (`STORAGE_TYPE`, `R2_BUCKET`, `PORT`, ...).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::fetch::{FetcherConfig, RetryPolicy};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Which persistence backend holds match histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    Local,
    Cloudflare,
    #[default]
    None,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "file" | "fs" => Ok(StorageKind::Local),
            "cloudflare" | "r2" | "s3" | "object" => Ok(StorageKind::Cloudflare),
            "none" | "disabled" | "" => Ok(StorageKind::None),
            other => Err(format!("unknown storage type '{}'", other)),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Local => write!(f, "local"),
            StorageKind::Cloudflare => write!(f, "cloudflare"),
            StorageKind::None => write!(f, "none"),
        }
    }
}

impl<'de> Deserialize<'de> for StorageKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage_type: StorageKind,

    /// Directory for the local backend.
    #[serde(default = "default_storage_path")]
    pub game_storage_path: PathBuf,

    #[serde(default)]
    pub r2_endpoint: Option<String>,

    #[serde(default)]
    pub r2_access_key: Option<String>,

    #[serde(default)]
    pub r2_secret_key: Option<String>,

    #[serde(default)]
    pub r2_bucket: Option<String>,

    #[serde(default = "default_region")]
    pub r2_region: String,

    /// Base URL of the match-history API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Lifetime of fetch cache entries; 0 disables the cache.
    #[serde(default = "default_cache_ttl")]
    pub fetch_cache_ttl_secs: u64,

    /// Retries per page on transient failures; 0 means none.
    #[serde(default)]
    pub fetch_max_retries: u32,

    #[serde(default = "default_max_pages")]
    pub fetch_max_pages: u32,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_api_base_url() -> String {
    "https://aoe4world.com/api/v0".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_max_pages() -> u32 {
    500
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageKind::default(),
            game_storage_path: default_storage_path(),
            r2_endpoint: None,
            r2_access_key: None,
            r2_secret_key: None,
            r2_bucket: None,
            r2_region: default_region(),
            api_base_url: default_api_base_url(),
            http_timeout_secs: default_http_timeout(),
            fetch_cache_ttl_secs: default_cache_ttl(),
            fetch_max_retries: 0,
            fetch_max_pages: default_max_pages(),
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file plus the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(file, None)
    }

    /// Load with an explicit environment map instead of the process one.
    pub fn from_sources(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::default()
                .try_parsing(true)
                .source(env),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_type == StorageKind::Cloudflare {
            let missing: Vec<&str> = [
                ("R2_ENDPOINT", &self.r2_endpoint),
                ("R2_ACCESS_KEY", &self.r2_access_key),
                ("R2_SECRET_KEY", &self.r2_secret_key),
                ("R2_BUCKET", &self.r2_bucket),
            ]
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
            .map(|(name, _)| *name)
            .collect();

            if !missing.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "object storage requires {}",
                    missing.join(", ")
                )));
            }
        }

        if self.http_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "HTTP timeout must be greater than 0".to_string(),
            ));
        }

        if self.fetch_max_pages == 0 {
            return Err(ConfigError::ValidationError(
                "Page limit must be greater than 0".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Fetcher settings derived from this configuration.
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            api_base_url: self.api_base_url.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs),
            cache_ttl: Duration::from_secs(self.fetch_cache_ttl_secs),
            max_pages: self.fetch_max_pages,
            retry: RetryPolicy {
                max_retries: self.fetch_max_retries,
                ..RetryPolicy::default()
            },
            ..FetcherConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.storage_type, StorageKind::None);
        assert_eq!(config.game_storage_path, PathBuf::from("./data"));
        assert_eq!(config.api_base_url, "https://aoe4world.com/api/v0");
        assert_eq!(config.fetch_max_retries, 0);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_config_validation_ok() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.http_timeout_secs = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cloudflare_requires_credentials() {
        let mut config = AppConfig::default();
        config.storage_type = StorageKind::Cloudflare;
        config.r2_endpoint = Some("https://r2.example".to_string());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("R2_BUCKET"));
        assert!(err.contains("R2_ACCESS_KEY"));
        assert!(!err.contains("R2_ENDPOINT"));
    }

    #[test]
    fn test_storage_kind_parse() {
        assert_eq!("LOCAL".parse::<StorageKind>().unwrap(), StorageKind::Local);
        assert_eq!("r2".parse::<StorageKind>().unwrap(), StorageKind::Cloudflare);
        assert_eq!("none".parse::<StorageKind>().unwrap(), StorageKind::None);
        assert!("ftp".parse::<StorageKind>().is_err());
    }

    #[test]
    fn test_load_from_environment() {
        let config = AppConfig::from_sources(
            None,
            env(&[
                ("STORAGE_TYPE", "local"),
                ("GAME_STORAGE_PATH", "/tmp/games"),
                ("PORT", "9090"),
                ("FETCH_MAX_RETRIES", "2"),
            ]),
        )
        .unwrap();

        assert_eq!(config.storage_type, StorageKind::Local);
        assert_eq!(config.game_storage_path, PathBuf::from("/tmp/games"));
        assert_eq!(config.port, 9090);
        assert_eq!(config.fetch_max_retries, 2);
        assert_eq!(config.fetcher_config().retry.max_retries, 2);
    }

    #[test]
    fn test_environment_overrides_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "storage_type = \"local\"\nport = 7000\n").unwrap();

        let config = AppConfig::from_sources(Some(&path), env(&[("PORT", "7100")])).unwrap();

        assert_eq!(config.storage_type, StorageKind::Local);
        assert_eq!(config.port, 7100);
    }

    #[test]
    fn test_missing_file_is_tolerated() {
        let config =
            AppConfig::from_sources(Some(Path::new("/nonexistent/config.toml")), env(&[]))
                .unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_storage_type_rejected() {
        let result = AppConfig::from_sources(None, env(&[("STORAGE_TYPE", "floppy")]));
        assert!(result.is_err());
    }
}
