//! Configuration management for the Lawander engine
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::LawanderError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the Lawander engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawanderConfig {
    /// Geocoding service configuration
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    /// Place resolution tuning
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Chat backend configuration
    #[serde(default)]
    pub chat: ChatConfig,
    /// Geocode response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Geocoding service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Base URL of the Nominatim-compatible search service
    #[serde(default = "default_geocoder_base_url")]
    pub base_url: String,
    /// User agent sent with every request (required by Nominatim usage policy)
    #[serde(default = "default_geocoder_user_agent")]
    pub user_agent: String,
    /// Preferred language for display names and address fields
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    /// Request timeout in seconds
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_geocoder_max_retries")]
    pub max_retries: u32,
}

/// Locality check applied by the general fallback tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackLocality {
    /// Structured address city and country must match
    Structured,
    /// Display name must contain both city and country
    DisplayName,
}

/// Place resolution tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Places resolved concurrently within one batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Delay between batches in milliseconds
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Upper bound for a single geocoding query in seconds
    #[serde(default = "default_query_timeout")]
    pub query_timeout_seconds: u64,
    /// Result limit for the ordered primary queries
    #[serde(default = "default_query_limit")]
    pub query_limit: usize,
    /// Result limit for the category fallback tier
    #[serde(default = "default_category_limit")]
    pub category_limit: usize,
    /// Result limit for the general fallback tier
    #[serde(default = "default_fallback_limit")]
    pub fallback_limit: usize,
    /// Locality check used by the general fallback tier
    #[serde(default = "default_fallback_locality")]
    pub fallback_locality: FallbackLocality,
}

/// Chat backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,
    /// Model name
    #[serde(default = "default_chat_model")]
    pub model: String,
    /// API key (usually provided through `LAWANDER__CHAT__API_KEY`)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_chat_timeout")]
    pub timeout_seconds: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether geocoder responses are cached on disk
    #[serde(default)]
    pub enabled: bool,
    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP endpoint for trace export
    pub otlp_endpoint: Option<String>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Maximum request body size in KB
    #[serde(default = "default_body_limit")]
    pub body_limit_kb: usize,
    /// Trips untouched for this long are dropped
    #[serde(default = "default_session_idle")]
    pub session_idle_minutes: u64,
    /// Upper bound on live trips; the least recently used goes first
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

// Default value functions
fn default_geocoder_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_geocoder_user_agent() -> String {
    format!("Lawander/{}", env!("CARGO_PKG_VERSION"))
}

fn default_accept_language() -> String {
    "en".to_string()
}

fn default_geocoder_timeout() -> u32 {
    15
}

fn default_geocoder_max_retries() -> u32 {
    1
}

fn default_concurrency() -> usize {
    3
}

fn default_pacing_ms() -> u64 {
    300
}

fn default_query_timeout() -> u64 {
    20
}

fn default_query_limit() -> usize {
    3
}

fn default_category_limit() -> usize {
    5
}

fn default_fallback_limit() -> usize {
    10
}

fn default_fallback_locality() -> FallbackLocality {
    FallbackLocality::Structured
}

fn default_chat_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_chat_timeout() -> u32 {
    60
}

fn default_cache_ttl() -> u32 {
    24
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("lawander").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".lawander-cache".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    64
}

fn default_session_idle() -> u64 {
    120
}

fn default_max_sessions() -> usize {
    1000
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_base_url(),
            user_agent: default_geocoder_user_agent(),
            accept_language: default_accept_language(),
            timeout_seconds: default_geocoder_timeout(),
            max_retries: default_geocoder_max_retries(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            pacing_ms: default_pacing_ms(),
            query_timeout_seconds: default_query_timeout(),
            query_limit: default_query_limit(),
            category_limit: default_category_limit(),
            fallback_limit: default_fallback_limit(),
            fallback_locality: default_fallback_locality(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes * 60)
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_seconds)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_base_url(),
            model: default_chat_model(),
            api_key: None,
            timeout_seconds: default_chat_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            body_limit_kb: default_body_limit(),
            session_idle_minutes: default_session_idle(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Default for LawanderConfig {
    fn default() -> Self {
        Self {
            geocoder: GeocoderConfig::default(),
            resolver: ResolverConfig::default(),
            chat: ChatConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl LawanderConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

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

        // LAWANDER__CHAT__API_KEY -> chat.api_key
        builder = builder.add_source(
            Environment::with_prefix("LAWANDER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: LawanderConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lawander").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.geocoder.base_url.is_empty() {
            self.geocoder.base_url = default_geocoder_base_url();
        }
        if self.geocoder.user_agent.is_empty() {
            self.geocoder.user_agent = default_geocoder_user_agent();
        }
        if self.geocoder.timeout_seconds == 0 {
            self.geocoder.timeout_seconds = default_geocoder_timeout();
        }
        if self.resolver.concurrency == 0 {
            self.resolver.concurrency = default_concurrency();
        }
        if self.resolver.query_timeout_seconds == 0 {
            self.resolver.query_timeout_seconds = default_query_timeout();
        }
        if self.resolver.query_limit == 0 {
            self.resolver.query_limit = default_query_limit();
        }
        if self.chat.base_url.is_empty() {
            self.chat.base_url = default_chat_base_url();
        }
        if self.chat.model.is_empty() {
            self.chat.model = default_chat_model();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
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

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // The key is optional; a missing key only fails once the chat backend is used
        if let Some(api_key) = &self.chat.api_key {
            if api_key.is_empty() {
                return Err(LawanderError::config(
                    "Chat API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(LawanderError::config(
                    "Chat API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.geocoder.timeout_seconds > 300 {
            return Err(LawanderError::config("Geocoder timeout cannot exceed 300 seconds").into());
        }

        if self.geocoder.max_retries > 10 {
            return Err(LawanderError::config("Geocoder max retries cannot exceed 10").into());
        }

        if self.resolver.concurrency > 16 {
            return Err(LawanderError::config("Resolver concurrency cannot exceed 16").into());
        }

        if self.resolver.pacing_ms > 60_000 {
            return Err(LawanderError::config("Resolver pacing cannot exceed 60000 ms").into());
        }

        let limits = [
            self.resolver.query_limit,
            self.resolver.category_limit,
            self.resolver.fallback_limit,
        ];
        if limits.iter().any(|&limit| limit == 0 || limit > 50) {
            return Err(LawanderError::config("Geocoder result limits must be between 1 and 50").into());
        }

        if self.chat.timeout_seconds > 600 {
            return Err(LawanderError::config("Chat timeout cannot exceed 600 seconds").into());
        }

        if self.server.body_limit_kb == 0 || self.server.body_limit_kb > 10 * 1024 {
            return Err(LawanderError::config("Request body limit must be between 1 and 10240 KB").into());
        }

        if self.server.session_idle_minutes == 0 || self.server.session_idle_minutes > 7 * 24 * 60 {
            return Err(LawanderError::config("Session idle time must be between 1 and 10080 minutes").into());
        }

        if self.server.max_sessions == 0 {
            return Err(LawanderError::config("Server must allow at least one session").into());
        }

        if self.cache.ttl_hours > 24 * 30 {
            return Err(LawanderError::config("Cache TTL cannot exceed 720 hours (30 days)").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(LawanderError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(LawanderError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Geocoder", &self.geocoder.base_url),
            ("Chat", &self.chat.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(LawanderError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
