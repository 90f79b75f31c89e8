//! Configuration management for the travel assistant
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TravelAssistantError;
use crate::events::MAX_RESULTS_LIMIT;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the travel assistant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Ticketing (event search) API configuration
    pub ticketing: TicketingConfig,
    /// Language model API configuration
    pub model: ModelConfig,
    /// Image search configuration
    pub images: ImagesConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Ticketing API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketingConfig {
    /// Discovery API key, can also be supplied per request
    pub api_key: Option<String>,
    /// Events search endpoint
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Default cap on returned events
    pub max_results: usize,
}

/// Language model configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// API key, can also be supplied per request
    pub api_key: Option<String>,
    /// Base URL of an OpenAI compatible chat completions API
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Image search configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Search page URL
    pub search_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

/// HTTP server configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

// Default value functions
fn default_ticketing_base_url() -> String {
    "https://app.ticketmaster.com/discovery/v2/events.json".to_string()
}

fn default_ticketing_max_results() -> usize {
    20
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model_name() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_images_search_url() -> String {
    "https://www.google.com/search".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_port() -> u16 {
    8765
}

impl Default for TicketingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_ticketing_base_url(),
            timeout_seconds: default_timeout(),
            max_results: default_ticketing_max_results(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_model_base_url(),
            model: default_model_name(),
            temperature: 0.0,
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            search_url: default_images_search_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl TicketingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl ModelConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl ImagesConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl AssistantConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRAVEL_ASSISTANT_MODEL__API_KEY -> model.api_key
        builder = builder.add_source(
            Environment::with_prefix("TRAVEL_ASSISTANT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AssistantConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("travel-assistant").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.ticketing.base_url.is_empty() {
            self.ticketing.base_url = default_ticketing_base_url();
        }
        if self.ticketing.timeout_seconds == 0 {
            self.ticketing.timeout_seconds = default_timeout();
        }
        if self.ticketing.max_results == 0 {
            self.ticketing.max_results = default_ticketing_max_results();
        }
        if self.model.base_url.is_empty() {
            self.model.base_url = default_model_base_url();
        }
        if self.model.model.is_empty() {
            self.model.model = default_model_name();
        }
        if self.model.timeout_seconds == 0 {
            self.model.timeout_seconds = default_timeout();
        }
        if self.images.search_url.is_empty() {
            self.images.search_url = default_images_search_url();
        }
        if self.images.timeout_seconds == 0 {
            self.images.timeout_seconds = default_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Keys are optional here since the UI can supply them per request,
    /// but a key that is present must not be blank.
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("Ticketing", &self.ticketing.api_key),
            ("Model", &self.model.api_key),
        ];
        for (name, key) in keys {
            if let Some(key) = key {
                if key.trim().is_empty() {
                    return Err(TravelAssistantError::config(format!(
                        "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Ticketing", self.ticketing.timeout_seconds),
            ("Model", self.model.timeout_seconds),
            ("Image search", self.images.timeout_seconds),
        ];
        for (name, seconds) in timeouts {
            if seconds > 300 {
                return Err(TravelAssistantError::config(format!(
                    "{name} timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        if self.ticketing.max_results > MAX_RESULTS_LIMIT {
            return Err(TravelAssistantError::config(format!(
                "Ticketing max results cannot exceed {MAX_RESULTS_LIMIT}"
            ))
            .into());
        }

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(TravelAssistantError::config(
                "Model temperature must be between 0.0 and 2.0",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TravelAssistantError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TravelAssistantError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Ticketing", &self.ticketing.base_url),
            ("Model", &self.model.base_url),
            ("Image search", &self.images.search_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TravelAssistantError::config(format!(
                    "{name} URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
