use log::{debug, LevelFilter};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_DATASET_PATH: &str = "merged_restaurant_data.csv";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9999";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: Url,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub dataset_path: PathBuf,
    pub bind_addr: String,
    pub log_level: LevelFilter,
    pub gemini: GeminiSettings,
}

impl Settings {
    /// Reads settings from the process environment. Call after `dotenv()`
    /// so values from a local `.env` file are visible.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        let base_url = lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        let base_url = Url::parse(&base_url).map_err(|e| ConfigError::Invalid {
            key: "GEMINI_BASE_URL",
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "GEMINI_BASE_URL",
                reason: format!("unsupported scheme {}", base_url.scheme()),
            });
        }

        let gemini = GeminiSettings {
            api_key,
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url,
            request_timeout: Duration::from_secs(parse_secs(
                &lookup,
                "GEMINI_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            connect_timeout: Duration::from_secs(parse_secs(
                &lookup,
                "GEMINI_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?),
        };

        let log_level = match lookup("LOG_LEVEL") {
            Some(raw) => raw.parse::<LevelFilter>().map_err(|_| ConfigError::Invalid {
                key: "LOG_LEVEL",
                reason: format!("unknown level {}", raw),
            })?,
            None => LevelFilter::Info,
        };

        let settings = Settings {
            dataset_path: PathBuf::from(
                lookup("DATASET_PATH").unwrap_or_else(|| DEFAULT_DATASET_PATH.to_string()),
            ),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            log_level,
            gemini,
        };
        debug!("Loaded settings for model {}", settings.gemini.model);
        Ok(settings)
    }
}

fn parse_secs<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => Err(ConfigError::Invalid { key, reason: "must be greater than zero".to_string() }),
            Ok(secs) => Ok(secs),
            Err(e) => Err(ConfigError::Invalid { key, reason: e.to_string() }),
        },
        None => Ok(default),
    }
}
