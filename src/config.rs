//! Environment-driven settings.

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Provider endpoint and model choices.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    /// Style suggestions and outfit ideas.
    pub text_model: String,
    /// Accessory suggestions.
    pub fast_model: String,
    pub image_model: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            text_model: "gemini-2.5-pro".to_string(),
            fast_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the offline demo stylist.
    pub gemini: Option<GeminiConfig>,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Sessions idle for longer than this are dropped.
    pub session_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self { gemini: None, port: 8080, max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES, session_ttl: DEFAULT_SESSION_TTL }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini = var("GEMINI_API_KEY").filter(|k| k != "DEMO_KEY").map(|key| {
            let mut gemini = GeminiConfig::new(key);
            if let Some(base) = var("GEMINI_API_BASE") {
                gemini.base_url = base.trim_end_matches('/').to_string();
            }
            if let Some(model) = var("STYLEMUSE_TEXT_MODEL") {
                gemini.text_model = model;
            }
            if let Some(model) = var("STYLEMUSE_FAST_MODEL") {
                gemini.fast_model = model;
            }
            if let Some(model) = var("STYLEMUSE_IMAGE_MODEL") {
                gemini.image_model = model;
            }
            gemini
        });

        let mut config = Config { gemini, ..Config::default() };
        if let Some(port) = var("PORT") {
            config.port = port.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: e.to_string(),
            })?;
        }
        if let Some(limit) = var("STYLEMUSE_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                key: "STYLEMUSE_MAX_UPLOAD_BYTES".into(),
                message: e.to_string(),
            })?;
        }
        if let Some(secs) = var("STYLEMUSE_SESSION_TTL_SECS") {
            let secs: u64 = secs.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                key: "STYLEMUSE_SESSION_TTL_SECS".into(),
                message: e.to_string(),
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "STYLEMUSE_SESSION_TTL_SECS".into(),
                    message: "must be at least 1".into(),
                });
            }
            config.session_ttl = Duration::from_secs(secs);
        }
        Ok(config)
    }
}
