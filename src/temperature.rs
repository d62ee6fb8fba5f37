//! Temperature conversion and the report returned by both services

use serde::{Deserialize, Serialize};

/// Exact values in the three scales, before presentation rounding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub celsius: f64,
    pub fahrenheit: f64,
    pub kelvin: f64,
}

/// Convert a Celsius reading to Fahrenheit and Kelvin
#[must_use]
pub fn convert(celsius: f64) -> Conversion {
    Conversion {
        celsius,
        fahrenheit: celsius * 1.8 + 32.0,
        kelvin: celsius + 273.15,
    }
}

/// Round half away from zero to one decimal place
#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Response body of `/temperature` on both the gateway and the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReport {
    pub city: String,
    #[serde(rename = "temp_C")]
    pub celsius: f64,
    #[serde(rename = "temp_F")]
    pub fahrenheit: f64,
    #[serde(rename = "temp_K")]
    pub kelvin: f64,
}

impl TemperatureReport {
    /// Build the report for `city` from a Celsius reading
    #[must_use]
    pub fn new(city: impl Into<String>, celsius: f64) -> Self {
        let conversion = convert(celsius);
        Self {
            city: city.into(),
            celsius: round_one_decimal(conversion.celsius),
            fahrenheit: round_one_decimal(conversion.fahrenheit),
            kelvin: round_one_decimal(conversion.kelvin),
        }
    }

    /// Re-apply presentation rounding to a report parsed from elsewhere
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            celsius: round_one_decimal(self.celsius),
            fahrenheit: round_one_decimal(self.fahrenheit),
            kelvin: round_one_decimal(self.kelvin),
            ..self
        }
    }

    /// Format the three scales for log lines
    #[must_use]
    pub fn format_scales(&self) -> String {
        format!(
            "{:.1}C / {:.1}F / {:.1}K",
            self.celsius, self.fahrenheit, self.kelvin
        )
    }
}
