//! Postal code to city resolution against the ViaCEP API

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::GeocodingConfig;
use crate::postal_code::NormalizedPostalCode;
use crate::{CepWeatherError, Result};

/// Location a postal code resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationResult {
    /// City name, never empty
    pub city: String,
    /// Postal code as echoed by the provider (`01310-100`)
    pub postal_code: String,
    /// Federative unit (`SP`)
    pub state: String,
    pub neighborhood: String,
    pub street: String,
    /// IBGE municipality code
    pub ibge: String,
    /// Telephone area code
    pub ddd: String,
}

/// Anything that can turn a postal code into a city
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn resolve_location(&self, code: &NormalizedPostalCode) -> Result<LocationResult>;
}

/// ViaCEP client
pub struct ViaCepClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl ViaCepClient {
    pub fn new(client: ClientWithMiddleware, config: &GeocodingConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LocationProvider for ViaCepClient {
    #[instrument(name = "resolve_location", skip(self, code), fields(cep = %code))]
    async fn resolve_location(&self, code: &NormalizedPostalCode) -> Result<LocationResult> {
        let url = format!("{}/{}/json", self.base_url, code);
        debug!("ViaCEP request URL: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("ViaCEP answered {} for {}", status, code);
            return Err(CepWeatherError::upstream(format!(
                "geocoding provider returned {status}"
            )));
        }

        let body: viacep::AddressResponse = response.json().await?;
        body.into_location(code)
    }
}

/// ViaCEP wire format
mod viacep {
    use super::{CepWeatherError, Deserialize, LocationResult, NormalizedPostalCode, Result};

    /// Address lookup response; unknown codes come back as `{"erro": true}`,
    /// which leaves every field empty.
    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct AddressResponse {
        pub cep: String,
        #[serde(rename = "localidade")]
        pub city: String,
        #[serde(rename = "uf")]
        pub state: String,
        #[serde(rename = "bairro")]
        pub neighborhood: String,
        #[serde(rename = "logradouro")]
        pub street: String,
        pub ibge: String,
        pub ddd: String,
    }

    impl AddressResponse {
        pub fn into_location(self, code: &NormalizedPostalCode) -> Result<LocationResult> {
            if self.cep.is_empty() {
                return Err(CepWeatherError::not_found(format!(
                    "no address registered for {code}"
                )));
            }
            if self.city.trim().is_empty() {
                return Err(CepWeatherError::not_found(format!(
                    "no city registered for {code}"
                )));
            }
            Ok(LocationResult {
                city: self.city,
                postal_code: self.cep,
                state: self.state,
                neighborhood: self.neighborhood,
                street: self.street,
                ibge: self.ibge,
                ddd: self.ddd,
            })
        }
    }
}
