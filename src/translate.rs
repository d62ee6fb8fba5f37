//! Boundary outcomes shared by the resolver and the gateway
//!
//! Both services reply with one of exactly three outcomes. The resolver maps
//! its internal errors onto them; the gateway classifies the resolver's HTTP
//! reply (or the failure to get one) onto the same set. Anything the gateway
//! cannot read as a report is a single not-found.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::{INVALID_ZIPCODE, ZIPCODE_NOT_FOUND};
use crate::temperature::TemperatureReport;
use crate::{CepWeatherError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 200 with the report as JSON
    Success(TemperatureReport),
    /// 404 `can not find zipcode`
    NotFound,
    /// 422 `invalid zipcode`
    Invalid,
}

impl Outcome {
    /// Resolver side: fold the pipeline result into a boundary outcome
    #[must_use]
    pub fn from_resolution(result: Result<TemperatureReport>) -> Self {
        match result {
            Ok(report) => Outcome::Success(report),
            Err(CepWeatherError::Validation { .. }) => Outcome::Invalid,
            Err(_) => Outcome::NotFound,
        }
    }

    /// Gateway side: classify the reply the resolver sent back
    #[must_use]
    pub fn from_resolver_reply(status: StatusCode, body: &[u8]) -> Self {
        if !status.is_success() {
            return Outcome::NotFound;
        }
        match serde_json::from_slice::<TemperatureReport>(body) {
            Ok(report) if !report.city.trim().is_empty() => Outcome::Success(report.rounded()),
            Ok(_) => Outcome::NotFound,
            Err(e) => {
                tracing::debug!("Unparseable resolver body: {}", e);
                Outcome::NotFound
            }
        }
    }

    /// Gateway side: the resolver could not be reached or did not answer in time.
    ///
    /// Reported to the client as an invalid zipcode, the same class as a
    /// local validation failure.
    #[must_use]
    pub fn from_transport_failure(_err: &CepWeatherError) -> Self {
        Outcome::Invalid
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Outcome::Success(_) => StatusCode::OK,
            Outcome::NotFound => StatusCode::NOT_FOUND,
            Outcome::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Outcome::Success(report) => (status, Json(report)).into_response(),
            Outcome::NotFound => (status, ZIPCODE_NOT_FOUND).into_response(),
            Outcome::Invalid => (status, INVALID_ZIPCODE).into_response(),
        }
    }
}
