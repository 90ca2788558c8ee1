//! Configuration management for the travel directory
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::DirectoryError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Root configuration structure for the travel directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Directory data backend
    #[serde(default)]
    pub data: DataConfig,
    /// Outbound HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Flight and hotel search (SerpApi)
    #[serde(default)]
    pub serp: SerpConfig,
    /// AI description generator
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Chat assistant
    #[serde(default)]
    pub chat: ChatConfig,
    /// Contact-form relay
    #[serde(default)]
    pub contact: ContactConfig,
    /// Newsletter provider
    #[serde(default)]
    pub newsletter: NewsletterConfig,
    /// Persistent cache
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Seed/import job
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public origin used for sitemap URLs
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Directory with prebuilt frontend assets, served as fallback
    pub static_dir: Option<String>,
}

/// Which directory store the server talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBackend {
    /// Hosted table API (PostgREST)
    Hosted,
    /// In-process store loaded from a JSON export
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_backend")]
    pub backend: DataBackend,
    /// Base URL of the hosted data service
    pub url: Option<String>,
    /// Public (anon) key, sent as `apikey`
    pub anon_key: Option<String>,
    /// Service-role key used for server-side writes
    pub service_key: Option<String>,
    /// JSON export loaded by the memory backend and the seed job
    #[serde(default = "default_seed_file")]
    pub seed_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    /// Retries for transient failures (0 disables retrying)
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerpConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_serp_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Azure AI endpoint, e.g. `https://<resource>.services.ai.azure.com`
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Idle lifetime of a chat session
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: u32,
    /// Number of most recent messages forwarded to the model
    #[serde(default = "default_history_window")]
    pub history_window: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    #[serde(default = "default_contact_endpoint")]
    pub endpoint: String,
    pub access_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_newsletter_list")]
    pub list_id: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
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
    /// OTLP/HTTP collector endpoint; spans are exported only when set
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Rows per bulk insert
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_base_url() -> String {
    "https://www.travelagencies.world".to_string()
}

fn default_backend() -> DataBackend {
    DataBackend::Hosted
}

fn default_seed_file() -> String {
    "data/agencies-processed.json".to_string()
}

fn default_http_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    format!("TravelDirectory/{}", crate::VERSION)
}

fn default_serp_base_url() -> String {
    "https://serpapi.com/search.json".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_session_ttl() -> u32 {
    60
}

fn default_history_window() -> u32 {
    10
}

fn default_contact_endpoint() -> String {
    "https://api.web3forms.com/submit".to_string()
}

fn default_newsletter_list() -> u32 {
    2
}

fn default_cache_location() -> String {
    "~/.cache/travel-directory".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_batch_size() -> u32 {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: default_public_base_url(),
            static_dir: None,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: None,
            anon_key: None,
            service_key: None,
            seed_file: default_seed_file(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            max_retries: 0,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SerpConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_serp_base_url(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_openai_model(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            session_ttl_minutes: default_session_ttl(),
            history_window: default_history_window(),
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            endpoint: default_contact_endpoint(),
            access_key: None,
        }
    }
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            list_id: default_newsletter_list(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
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

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

impl DirectoryConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRAVEL_DIRECTORY__SERVER__PORT=8080 style overrides
        builder = builder.add_source(
            Environment::with_prefix("TRAVEL_DIRECTORY")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: DirectoryConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_env_fallbacks();
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("travel-directory").join("config.toml"))
    }

    /// Pick up the conventional provider variables when the config leaves a key unset
    pub fn apply_env_fallbacks(&mut self) {
        fn fill(slot: &mut Option<String>, var: &str) {
            if slot.is_none() {
                *slot = env::var(var).ok().filter(|v| !v.is_empty());
            }
        }

        fill(&mut self.data.url, "SUPABASE_URL");
        fill(&mut self.data.anon_key, "SUPABASE_ANON_KEY");
        fill(&mut self.data.service_key, "SUPABASE_SERVICE_ROLE_KEY");
        fill(&mut self.serp.api_key, "SERP_API_KEY");
        fill(&mut self.openai.api_key, "OPENAI_API_KEY");
        fill(&mut self.chat.endpoint, "AZURE_OPENAI_ENDPOINT");
        fill(&mut self.chat.api_key, "AZURE_OPENAI_KEY");
        fill(&mut self.contact.access_key, "WEB3FORMS_ACCESS_KEY");
        fill(&mut self.newsletter.api_key, "BREVO_API_KEY");
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.server.public_base_url.is_empty() {
            self.server.public_base_url = default_public_base_url();
        }
        if self.http.timeout_seconds == 0 {
            self.http.timeout_seconds = default_http_timeout();
        }
        if self.http.user_agent.is_empty() {
            self.http.user_agent = default_user_agent();
        }
        if self.serp.base_url.is_empty() {
            self.serp.base_url = default_serp_base_url();
        }
        if self.openai.model.is_empty() {
            self.openai.model = default_openai_model();
        }
        if self.chat.session_ttl_minutes == 0 {
            self.chat.session_ttl_minutes = default_session_ttl();
        }
        if self.chat.history_window == 0 {
            self.chat.history_window = default_history_window();
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
        if self.seed.batch_size == 0 {
            self.seed.batch_size = default_batch_size();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_data_backend()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// The hosted backend needs a URL and at least one key
    pub fn validate_data_backend(&self) -> Result<()> {
        if self.data.backend != DataBackend::Hosted {
            return Ok(());
        }

        match &self.data.url {
            None => {
                return Err(DirectoryError::config(
                    "Data service URL is required for the hosted backend (data.url or SUPABASE_URL)",
                )
                .into());
            }
            Some(url) if !is_http_url(url) => {
                return Err(DirectoryError::config(
                    "Data service URL must be a valid HTTP or HTTPS URL",
                )
                .into());
            }
            Some(_) => {}
        }

        if self.data.service_key.is_none() && self.data.anon_key.is_none() {
            return Err(DirectoryError::config(
                "A data service key is required (data.service_key or data.anon_key)",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds > 300 {
            return Err(DirectoryError::config("HTTP timeout cannot exceed 300 seconds").into());
        }

        if self.http.max_retries > 10 {
            return Err(DirectoryError::config("HTTP max retries cannot exceed 10").into());
        }

        if self.chat.session_ttl_minutes > 24 * 60 {
            return Err(DirectoryError::config("Chat session TTL cannot exceed 24 hours").into());
        }

        if self.chat.history_window > 50 {
            return Err(DirectoryError::config("Chat history window cannot exceed 50").into());
        }

        if self.seed.batch_size > 1000 {
            return Err(DirectoryError::config("Seed batch size cannot exceed 1000").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(DirectoryError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(DirectoryError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("server.public_base_url", &self.server.public_base_url),
            ("serp.base_url", &self.serp.base_url),
            ("openai.base_url", &self.openai.base_url),
            ("contact.endpoint", &self.contact.endpoint),
        ] {
            if !is_http_url(url) {
                return Err(DirectoryError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Expand a leading `~` in the cache location
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        match self.cache.location.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(rest)),
            None => PathBuf::from(&self.cache.location),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> DirectoryConfig {
        let mut config = DirectoryConfig::default();
        config.data.backend = DataBackend::Memory;
        config
    }

    #[test]
    fn test_default_config() {
        let config = DirectoryConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.http.max_retries, 0);
        assert_eq!(config.serp.base_url, "https://serpapi.com/search.json");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.seed.batch_size, 100);
        assert!(config.openai.api_key.is_none());
    }

    #[test]
    fn test_hosted_backend_requires_url() {
        let config = DirectoryConfig::default();
        let result = config.validate_data_backend();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Data service URL"));
    }

    #[test]
    fn test_hosted_backend_requires_key() {
        let mut config = DirectoryConfig::default();
        config.data.url = Some("https://project.supabase.co".to_string());
        assert!(config.validate_data_backend().is_err());

        config.data.service_key = Some("service-role".to_string());
        assert!(config.validate_data_backend().is_ok());
    }

    #[test]
    fn test_memory_backend_needs_no_credentials() {
        assert!(memory_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = memory_config();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = memory_config();
        config.http.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_apply_defaults_fills_zeroes() {
        let mut config = memory_config();
        config.seed.batch_size = 0;
        config.chat.history_window = 0;
        config.apply_defaults();
        assert_eq!(config.seed.batch_size, 100);
        assert_eq!(config.chat.history_window, 10);
    }

    #[test]
    fn test_config_path_generation() {
        let path = DirectoryConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("travel-directory"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
