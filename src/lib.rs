//! `CepWeather` - Current temperature for Brazilian postal codes
//!
//! Two HTTP services share this library: the gateway validates a CEP posted
//! by a client and forwards it to the resolver, which geocodes the CEP to a
//! city, looks up the current weather and replies with the temperature in
//! Celsius, Fahrenheit and Kelvin. Both services continue the caller's trace.

pub mod config;
pub mod error;
pub mod gateway;
pub mod geocoding;
pub mod http_client;
pub mod postal_code;
pub mod propagation;
pub mod resolver;
pub mod telemetry;
pub mod temperature;
pub mod translate;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::{GatewayConfig, ResolverConfig};
pub use error::CepWeatherError;
pub use gateway::{GatewayState, ResolverClient};
pub use geocoding::{LocationProvider, LocationResult, ViaCepClient};
pub use postal_code::NormalizedPostalCode;
pub use resolver::ResolverState;
pub use temperature::TemperatureReport;
pub use translate::Outcome;
pub use weather::{TemperatureProvider, TemperatureReading, WeatherApiClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CepWeatherError>;
