//! Public entry point: accepts `POST /temperature` and forwards to the resolver

use std::path::PathBuf;

use anyhow::Result;
use cep_weather::config::GatewayConfig;
use cep_weather::gateway::{self, GatewayState};
use cep_weather::{telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::load_from_path(std::env::args().nth(1).map(PathBuf::from))?;
    let guard = telemetry::init(&config.logging, &config.telemetry)?;

    tracing::info!(
        "Starting gateway v{}, resolver at {}",
        cep_weather::VERSION,
        config.resolver.base_url
    );

    let state = GatewayState::from_config(&config)?;
    let result = web::serve(gateway::router(state), &config.server).await;

    guard.shutdown();
    result
}
