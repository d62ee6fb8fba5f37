//! Error types and handling for the CEP weather services

use thiserror::Error;

/// Reply text for any zipcode that fails validation
pub const INVALID_ZIPCODE: &str = "invalid zipcode";

/// Reply text for any zipcode that could not be resolved to a temperature
pub const ZIPCODE_NOT_FOUND: &str = "can not find zipcode";

/// Main error type shared by the gateway and the resolver
#[derive(Error, Debug)]
pub enum CepWeatherError {
    /// Malformed postal code, never forwarded past the service that saw it
    #[error("Invalid zipcode: {message}")]
    Validation { message: String },

    /// Well-formed input without a matching location
    #[error("Zipcode not found: {message}")]
    NotFound { message: String },

    /// Transport, status, timeout or decode failure talking to another service
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CepWeatherError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new upstream error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// The URL is dropped from the message: weather queries carry the API key.
impl From<reqwest::Error> for CepWeatherError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            CepWeatherError::upstream(format!("deadline exceeded: {err}"))
        } else if err.is_decode() {
            CepWeatherError::upstream(format!("undecodable response: {err}"))
        } else {
            CepWeatherError::upstream(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for CepWeatherError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            other => CepWeatherError::upstream(other.to_string()),
        }
    }
}
