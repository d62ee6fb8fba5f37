//! Configuration management for the gateway and the resolver
//!
//! Each service loads its settings once at start-up from an optional TOML
//! file and environment variables, then validates them. The resulting
//! structs are immutable and handed to the router state.

use crate::CepWeatherError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration of the front gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listener settings
    #[serde(default = "default_gateway_server")]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Trace export configuration
    #[serde(default = "default_gateway_telemetry")]
    pub telemetry: TelemetryConfig,
    /// Where the resolver lives
    #[serde(default)]
    pub resolver: ResolverClientConfig,
}

/// Root configuration of the resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Listener settings
    #[serde(default = "default_resolver_server")]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Trace export configuration
    #[serde(default = "default_resolver_telemetry")]
    pub telemetry: TelemetryConfig,
    /// Geocoding provider (ViaCEP)
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Weather provider (WeatherAPI)
    #[serde(default)]
    pub weather: WeatherConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Listening port, 0 picks the service default
    #[serde(default)]
    pub port: u16,
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
}

/// OpenTelemetry export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Export spans to the collector
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,
    /// `service.name` resource attribute
    #[serde(default)]
    pub service_name: String,
    /// OTLP/HTTP traces endpoint of the collector
    #[serde(default = "default_collector_endpoint")]
    pub collector_endpoint: String,
    /// Export timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Gateway-side view of the resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverClientConfig {
    /// Base URL of the resolver service
    #[serde(default = "default_resolver_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Geocoding API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL for the ViaCEP API
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the WeatherAPI service
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// WeatherAPI key, required
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: 8080,
    }
}

fn default_resolver_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: 8081,
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_telemetry_enabled() -> bool {
    true
}

fn default_collector_endpoint() -> String {
    "http://otel-collector:4318/v1/traces".to_string()
}

fn default_gateway_telemetry() -> TelemetryConfig {
    TelemetryConfig::for_service("service_a")
}

fn default_resolver_telemetry() -> TelemetryConfig {
    TelemetryConfig::for_service("service_b")
}

fn default_timeout() -> u32 {
    10
}

fn default_resolver_base_url() -> String {
    "http://service_b:8081".to_string()
}

fn default_geocoding_base_url() -> String {
    "http://viacep.com.br/ws".to_string()
}

fn default_weather_base_url() -> String {
    "http://api.weatherapi.com/v1".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl TelemetryConfig {
    fn for_service(service_name: &str) -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            service_name: service_name.to_string(),
            collector_endpoint: default_collector_endpoint(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for ResolverClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_resolver_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            api_key: None,
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: default_gateway_server(),
            logging: LoggingConfig::default(),
            telemetry: default_gateway_telemetry(),
            resolver: ResolverClientConfig::default(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            server: default_resolver_server(),
            logging: LoggingConfig::default(),
            telemetry: default_resolver_telemetry(),
            geocoding: GeocodingConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

/// File + environment layering shared by both services
fn load_layered<T: DeserializeOwned>(
    config_path: Option<PathBuf>,
    default_file: &str,
    env_prefix: &str,
) -> Result<T> {
    let mut builder = Config::builder();

    let config_file = config_path.unwrap_or_else(|| PathBuf::from(default_file));
    if config_file.exists() {
        builder = builder.add_source(
            File::from(config_file.clone())
                .required(false)
                .format(config::FileFormat::Toml),
        );
    }

    // e.g. RESOLVER_WEATHER__API_KEY -> weather.api_key
    builder = builder.add_source(
        Environment::with_prefix(env_prefix)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let settings = builder
        .build()
        .with_context(|| format!("Failed to build configuration from {}", config_file.display()))?;

    settings
        .try_deserialize()
        .with_context(|| "Failed to deserialize configuration")
}

impl GatewayConfig {
    /// Load from `config_path` (default `gateway.toml`) and `GATEWAY_*` variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config: GatewayConfig = load_layered(config_path, "gateway.toml", "GATEWAY")?;
        config.apply_defaults();
        config.validate()?;
        Ok(config)
    }

    /// Apply default values to fields left empty
    pub fn apply_defaults(&mut self) {
        self.logging.apply_defaults();
        if self.server.port == 0 {
            self.server.port = default_gateway_server().port;
        }
        if self.telemetry.service_name.is_empty() {
            self.telemetry.service_name = default_gateway_telemetry().service_name;
        }
        if self.resolver.base_url.is_empty() {
            self.resolver.base_url = default_resolver_base_url();
        }
        if self.resolver.timeout_seconds == 0 {
            self.resolver.timeout_seconds = default_timeout();
        }
        if self.telemetry.timeout_seconds == 0 {
            self.telemetry.timeout_seconds = default_timeout();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.telemetry.validate()?;
        validate_url("Resolver base URL", &self.resolver.base_url)?;
        validate_timeout("Resolver", self.resolver.timeout_seconds)?;
        Ok(())
    }
}

impl ResolverConfig {
    /// Load from `config_path` (default `resolver.toml`) and `RESOLVER_*` variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config: ResolverConfig = load_layered(config_path, "resolver.toml", "RESOLVER")?;
        config.apply_defaults();
        config.validate()?;
        Ok(config)
    }

    /// Apply default values to fields left empty
    pub fn apply_defaults(&mut self) {
        self.logging.apply_defaults();
        if self.server.port == 0 {
            self.server.port = default_resolver_server().port;
        }
        if self.telemetry.service_name.is_empty() {
            self.telemetry.service_name = default_resolver_telemetry().service_name;
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_timeout();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.telemetry.timeout_seconds == 0 {
            self.telemetry.timeout_seconds = default_timeout();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.logging.validate()?;
        self.telemetry.validate()?;
        validate_url("Geocoding API base URL", &self.geocoding.base_url)?;
        validate_url("Weather API base URL", &self.weather.base_url)?;
        validate_timeout("Geocoding API", self.geocoding.timeout_seconds)?;
        validate_timeout("Weather API", self.weather.timeout_seconds)?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        match self.weather.api_key.as_deref() {
            None => Err(CepWeatherError::config(
                "Weather API key is required. Set RESOLVER_WEATHER__API_KEY or weather.api_key.",
            )
            .into()),
            Some(key) if key.trim().is_empty() => {
                Err(CepWeatherError::config("Weather API key cannot be empty").into())
            }
            Some(_) => Ok(()),
        }
    }
}

impl LoggingConfig {
    fn apply_defaults(&mut self) {
        if self.level.is_empty() {
            self.level = default_log_level();
        }
        if self.format.is_empty() {
            self.format = default_log_format();
        }
    }

    fn validate(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.level.as_str()) {
            return Err(CepWeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.format.as_str()) {
            return Err(CepWeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

impl TelemetryConfig {
    fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(CepWeatherError::config("Telemetry service name cannot be empty").into());
        }
        if self.enabled {
            validate_url("Collector endpoint", &self.collector_endpoint)?;
        }
        validate_timeout("Collector", self.timeout_seconds)
    }
}

fn validate_url(what: &str, url: &str) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(CepWeatherError::config(format!(
            "{what} must be a valid HTTP or HTTPS URL"
        ))
        .into());
    }
    Ok(())
}

fn validate_timeout(what: &str, seconds: u32) -> Result<()> {
    if seconds == 0 || seconds > 300 {
        return Err(CepWeatherError::config(format!(
            "{what} timeout must be between 1 and 300 seconds"
        ))
        .into());
    }
    Ok(())
}
