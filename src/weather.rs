//! Current temperature lookup against WeatherAPI

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::config::WeatherConfig;
use crate::{CepWeatherError, Result};

/// A single current temperature in Celsius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    pub celsius: f64,
}

/// Anything that can report the current temperature of a city
#[async_trait]
pub trait TemperatureProvider: Send + Sync {
    async fn lookup_temperature(&self, city: &str) -> Result<TemperatureReading>;
}

/// Prepare a city name for the weather query string.
///
/// Diacritics are dropped (`São Paulo` becomes `Sao Paulo`) and the result is
/// percent-encoded, so spaces go out as `%20`.
#[must_use]
pub fn normalize_city(city: &str) -> String {
    let stripped: String = city.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect();
    urlencoding::encode(&stripped).into_owned()
}

/// WeatherAPI client
pub struct WeatherApiClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl WeatherApiClient {
    pub fn new(client: ClientWithMiddleware, config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| CepWeatherError::config("Weather API key is required"))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl TemperatureProvider for WeatherApiClient {
    #[instrument(name = "lookup_temperature", skip(self))]
    async fn lookup_temperature(&self, city: &str) -> Result<TemperatureReading> {
        let query = normalize_city(city);
        debug!("Querying current weather for '{}'", query);

        let url = format!(
            "{}/current.json?key={}&q={}&aqi=no",
            self.base_url, self.api_key, query
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| collapse("request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!("WeatherAPI answered {}: {}", status, detail);
            return Err(CepWeatherError::upstream("could not resolve weather"));
        }

        let body: weatherapi::CurrentResponse = response
            .json()
            .await
            .map_err(|e| collapse("invalid response", e))?;

        let celsius = body.current.temp_c;
        if !celsius.is_finite() {
            warn!("WeatherAPI returned a non-finite temperature for {}", city);
            return Err(CepWeatherError::upstream("could not resolve weather"));
        }

        debug!(
            "WeatherAPI matched '{}' ({}, {}): {:.1}C",
            body.location.name, body.location.region, body.location.country, celsius
        );
        Ok(TemperatureReading { celsius })
    }
}

/// Converting first keeps the request URL, and with it the key, out of the log
fn collapse(what: &str, err: impl Into<CepWeatherError>) -> CepWeatherError {
    let err = err.into();
    warn!("WeatherAPI {}: {}", what, err);
    CepWeatherError::upstream("could not resolve weather")
}

/// WeatherAPI wire format, limited to the fields read here
mod weatherapi {
    use super::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        #[serde(default)]
        pub location: MatchedLocation,
        pub current: CurrentData,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct MatchedLocation {
        pub name: String,
        pub region: String,
        pub country: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        pub temp_c: f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::build_client;
    use rstest::rstest;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WeatherApiClient {
        let config = WeatherConfig {
            base_url: format!("{}/v1", server.uri()),
            api_key: Some("test-weather-key".to_string()),
            timeout_seconds: 5,
        };
        WeatherApiClient::new(build_client(Duration::from_secs(5)).unwrap(), &config).unwrap()
    }

    #[rstest]
    #[case("São Paulo", "Sao%20Paulo")]
    #[case("Curitiba", "Curitiba")]
    #[case("Florianópolis", "Florianopolis")]
    #[case("São João del-Rei", "Sao%20Joao%20del-Rei")]
    #[case("Mogi Guaçu", "Mogi%20Guacu")]
    fn test_normalize_city(#[case] city: &str, #[case] expected: &str) {
        assert_eq!(normalize_city(city), expected);
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = WeatherConfig {
            base_url: "http://localhost".to_string(),
            api_key: None,
            timeout_seconds: 5,
        };
        let result = WeatherApiClient::new(build_client(Duration::from_secs(1)).unwrap(), &config);
        assert!(matches!(result, Err(CepWeatherError::Config { .. })));
    }

    #[tokio::test]
    async fn test_reads_current_celsius() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .and(query_param("key", "test-weather-key"))
            .and(query_param("q", "Sao Paulo"))
            .and(query_param("aqi", "no"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "location": { "name": "Sao Paulo", "region": "Sao Paulo", "country": "Brazil" },
                "current": { "temp_c": 23.4, "temp_f": 74.1, "is_day": 1 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reading = client_for(&server)
            .lookup_temperature("São Paulo")
            .await
            .unwrap();

        assert_eq!(reading.celsius, 23.4);
    }

    #[tokio::test]
    async fn test_provider_error_collapses_to_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 1006, "message": "No matching location found." }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .lookup_temperature("Atlantis")
            .await
            .unwrap_err();

        assert!(matches!(err, CepWeatherError::Upstream { .. }));
        assert!(!err.to_string().contains("No matching location"));
    }

    #[tokio::test]
    async fn test_undecodable_body_collapses_to_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "current": {} })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .lookup_temperature("Recife")
            .await
            .unwrap_err();

        assert!(matches!(err, CepWeatherError::Upstream { .. }));
    }
}
