//! Resolver service: postal code -> city -> current temperature

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use tracing::{Instrument, Span, field, info, warn};

use crate::config::ResolverConfig;
use crate::geocoding::{LocationProvider, ViaCepClient};
use crate::http_client::build_client;
use crate::postal_code;
use crate::temperature::TemperatureReport;
use crate::translate::Outcome;
use crate::weather::{TemperatureProvider, WeatherApiClient};
use crate::web;

/// Providers shared by every request
#[derive(Clone)]
pub struct ResolverState {
    locations: Arc<dyn LocationProvider>,
    temperatures: Arc<dyn TemperatureProvider>,
}

impl ResolverState {
    pub fn new(
        locations: Arc<dyn LocationProvider>,
        temperatures: Arc<dyn TemperatureProvider>,
    ) -> Self {
        Self {
            locations,
            temperatures,
        }
    }

    /// Wire the ViaCEP and WeatherAPI clients from configuration
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let geocoding_client =
            build_client(Duration::from_secs(config.geocoding.timeout_seconds.into()))?;
        let weather_client =
            build_client(Duration::from_secs(config.weather.timeout_seconds.into()))?;

        Ok(Self::new(
            Arc::new(ViaCepClient::new(geocoding_client, &config.geocoding)),
            Arc::new(WeatherApiClient::new(weather_client, &config.weather)?),
        ))
    }

    /// Validate, geocode, look up the weather and convert
    pub async fn resolve(&self, raw: &str) -> crate::Result<TemperatureReport> {
        let code = postal_code::validate(raw)?;

        let location = self.locations.resolve_location(&code).await?;
        Span::current().record("city", location.city.as_str());

        let reading = self
            .temperatures
            .lookup_temperature(&location.city)
            .await?;

        let report = TemperatureReport::new(location.city, reading.celsius);
        info!(
            "Zipcode Request: {} ({}): {}",
            code,
            report.city,
            report.format_scales()
        );
        Ok(report)
    }
}

pub fn router(state: ResolverState) -> Router {
    web::traced(
        Router::new()
            .route("/temperature/{zipcode}", get(get_temperature))
            .with_state(state),
    )
}

async fn get_temperature(
    State(state): State<ResolverState>,
    Path(zipcode): Path<String>,
) -> Response {
    let span = tracing::info_span!("handler", zipcode = %zipcode, city = field::Empty);

    let result = state.resolve(&zipcode).instrument(span.clone()).await;
    if let Err(e) = &result {
        span.in_scope(|| warn!("Can not answer for {}: {}", zipcode, e));
    }

    web::with_trace_context(&span, Outcome::from_resolution(result))
}
