//! Internal service: answers `GET /temperature/{zipcode}`

use std::path::PathBuf;

use anyhow::Result;
use cep_weather::config::ResolverConfig;
use cep_weather::resolver::{self, ResolverState};
use cep_weather::{telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ResolverConfig::load_from_path(std::env::args().nth(1).map(PathBuf::from))?;
    let guard = telemetry::init(&config.logging, &config.telemetry)?;

    tracing::info!(
        "Starting resolver v{}, geocoding via {}, weather via {}",
        cep_weather::VERSION,
        config.geocoding.base_url,
        config.weather.base_url
    );

    let state = ResolverState::from_config(&config)?;
    let result = web::serve(resolver::router(state), &config.server).await;

    guard.shutdown();
    result
}
