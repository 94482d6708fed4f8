use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::Level;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
const CONFIG_FILE: &str = "vision_console";
const ENV_PREFIX: &str = "VISION";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
            log_level: "info".to_string(),
            window_width: 1280.0,
            window_height: 720.0,
        }
    }
}

impl Settings {
    /// Loads defaults, then `vision_console.toml` if present, then `VISION_*` variables.
    pub fn load() -> Result<Self, AppError> {
        Self::build(
            Some(CONFIG_FILE),
            config::Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    fn build(
        config_file: Option<&str>,
        environment: config::Environment,
    ) -> Result<Self, AppError> {
        let defaults = Settings::default();
        let mut builder = config::Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("log_level", defaults.log_level)?
            .set_default("window_width", defaults.window_width as f64)?
            .set_default("window_height", defaults.window_height as f64)?;

        if let Some(name) = config_file {
            builder = builder.add_source(config::File::with_name(name).required(false));
        }

        let settings: Settings = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        settings.validated()
    }

    fn validated(mut self) -> Result<Self, AppError> {
        self.api_url = self.api_url.trim().trim_end_matches('/').to_string();

        let url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| AppError::InvalidSetting("api_url", e.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AppError::InvalidSetting(
                "api_url",
                format!("unsupported scheme {}", url.scheme()),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidSetting(
                "request_timeout_secs",
                "must be greater than 0".to_string(),
            ));
        }

        self.max_level()?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn max_level(&self) -> Result<Level, AppError> {
        Level::from_str(&self.log_level)
            .map_err(|e| AppError::InvalidSetting("log_level", e.to_string()))
    }
}
