//! Configuration management for the greeting client and driver
//!
//! This module provides utilities for loading and validating configuration,
//! with support for environment variables and in-memory values.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::dispatch::TransportFailurePolicy;
use crate::error::{Result, ServiceError};
use crate::resilience::PollPolicy;
use crate::services::greeting::Language;

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get a typed configuration value by parsing from string
    fn get<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        <T as FromStr>::Err: std::fmt::Display,
    {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ServiceError::configuration(format!("Invalid value for key {}: {}", key, e)))
    }

    /// Get a typed configuration value if present; a present but invalid value is an error
    fn get_optional<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        <T as FromStr>::Err: std::fmt::Display,
    {
        match self.get_string(key) {
            Ok(_) => self.get(key).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Get a typed configuration value, falling back to a default when absent
    fn get_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        <T as FromStr>::Err: std::fmt::Display,
    {
        Ok(self.get_optional(key)?.unwrap_or(default))
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(ServiceError::configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    /// Get a boolean configuration value with a default
    fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get_string(key) {
            Ok(_) => self.get_bool(key),
            Err(_) => Ok(default),
        }
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,

    /// Optional namespace for variables (e.g., "POLL")
    namespace: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set a namespace for environment variables
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        if let Some(ref namespace) = self.namespace {
            env_key.push_str(namespace);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => ServiceError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    /// Configuration values
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// Global default configuration provider
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new().with_prefix("GREETING")));

/// Trait for validated configuration sections
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Service name
    fn service_name(&self) -> &str;
}

/// Default address of a locally running greeting service
pub const DEFAULT_BASE_URL: &str = "http://localhost:7007";

/// Connection settings for the greeting service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetingServiceConfig {
    /// Base URL of the service
    pub base_url: String,

    /// Transport timeout; `None` never times out
    pub request_timeout: Option<Duration>,

    /// Extra user agent information
    pub user_agent: Option<String>,
}

impl Default for GreetingServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
            user_agent: None,
        }
    }
}

impl GreetingServiceConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = Self {
            base_url: provider.get_string_or("base_url", DEFAULT_BASE_URL),
            request_timeout: provider
                .get_optional::<u64>("request_timeout_seconds")?
                .map(Duration::from_secs),
            user_agent: provider.get_string("user_agent").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Transport timeout as a duration
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Parsed base URL, normalised to end with a slash so endpoints join beneath it
    pub fn parsed_base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        let url = Url::parse(&raw)
            .map_err(|e| ServiceError::configuration(format!("Invalid base URL {}: {}", self.base_url, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ServiceError::configuration(format!(
                "Unsupported URL scheme `{}` in {}",
                scheme, self.base_url
            ))),
        }
    }
}

impl ServiceConfig for GreetingServiceConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ServiceError::configuration("Greeting service base URL is required"));
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(ServiceError::configuration("Request timeout must be greater than zero"));
        }

        self.parsed_base_url()?;
        Ok(())
    }

    fn service_name(&self) -> &str {
        "greeting"
    }
}

/// Everything the driver needs besides the two call counts
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Connection settings
    pub service: GreetingServiceConfig,

    /// Language requested by every call
    pub language: Language,

    /// Per-call processing budget sent to the service
    pub call_timeout: Option<Duration>,

    /// Prefix of generated subject names
    pub name_prefix: String,

    /// Cap on concurrently running calls; `None` launches everything at once
    pub max_in_flight: Option<usize>,

    /// What a transport failure does to the rest of the dispatch
    pub failure_policy: TransportFailurePolicy,

    /// Polling behaviour of asynchronous calls
    pub poll: PollPolicy,

    /// Query the status endpoint before dispatching
    pub check_status: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            service: GreetingServiceConfig::default(),
            language: Language::English,
            call_timeout: Some(Duration::from_secs(180)),
            name_prefix: "Worker #".to_string(),
            max_in_flight: None,
            failure_policy: TransportFailurePolicy::default(),
            poll: PollPolicy::default(),
            check_status: false,
        }
    }
}

impl DriverConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();
        let default_poll = PollPolicy::default();

        let call_timeout = match provider.get_optional::<f64>("call_timeout_seconds")? {
            Some(seconds) if seconds <= 0.0 => None,
            Some(seconds) => Some(Duration::try_from_secs_f64(seconds).map_err(|e| {
                ServiceError::configuration(format!(
                    "Invalid value for key call_timeout_seconds: {}: {}",
                    seconds, e
                ))
            })?),
            None => defaults.call_timeout,
        };

        let failure_policy = if provider.get_bool_or("abort_on_transport_error", false)? {
            TransportFailurePolicy::Abort
        } else {
            TransportFailurePolicy::Isolate
        };

        let delay = Duration::from_millis(
            provider.get_or("poll_delay_ms", default_poll.delay.as_millis() as u64)?,
        );
        let poll = PollPolicy {
            poll_wait: Duration::from_secs(
                provider.get_or("poll_wait_seconds", default_poll.poll_wait.as_secs())?,
            ),
            delay,
            max_delay: delay,
            max_retries: provider.get_optional("poll_max_retries")?,
            max_elapsed_time: provider
                .get_optional::<u64>("poll_max_elapsed_seconds")?
                .map(Duration::from_secs),
            ..default_poll
        };

        let config = Self {
            service: GreetingServiceConfig::from_provider(provider)?,
            language: provider.get_or("language", defaults.language)?,
            call_timeout,
            name_prefix: provider.get_string_or("name_prefix", &defaults.name_prefix),
            max_in_flight: provider.get_optional("max_in_flight")?,
            failure_policy,
            poll,
            check_status: provider.get_bool_or("check_status", false)?,
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for DriverConfig {
    fn validate(&self) -> Result<()> {
        self.service.validate()?;

        if self.max_in_flight == Some(0) {
            return Err(ServiceError::configuration("max_in_flight must be at least 1"));
        }

        self.poll.validate()
    }

    fn service_name(&self) -> &str {
        "greeting-driver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("key1", "value1");
        provider.set("key2", "123");

        assert_eq!(provider.get_string("key1").unwrap(), "value1");
        assert_eq!(provider.get::<i64>("key2").unwrap(), 123);
        assert!(provider.get_string("key3").is_err());
        assert_eq!(provider.get_optional::<u32>("key3").unwrap(), None);
        assert!(provider.get_optional::<u32>("key1").is_err());
    }

    #[test]
    fn test_env_config_provider_format_key() {
        let provider = EnvConfigProvider::new().with_prefix("GREETING").with_namespace("POLL");

        assert_eq!(provider.format_key("max_retries"), "GREETING_POLL_MAX_RETRIES");
        assert_eq!(provider.format_key("base-url"), "GREETING_POLL_BASE_URL");
    }

    #[test]
    fn test_service_config_validation() {
        let config = GreetingServiceConfig {
            base_url: "".to_string(),
            ..GreetingServiceConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GreetingServiceConfig {
            base_url: "ftp://example.com".to_string(),
            ..GreetingServiceConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GreetingServiceConfig {
            base_url: "http://localhost:7007/shop".to_string(),
            ..GreetingServiceConfig::default()
        };
        assert_eq!(config.parsed_base_url().unwrap().as_str(), "http://localhost:7007/shop/");
    }
}
