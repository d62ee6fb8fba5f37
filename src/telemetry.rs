//! Logging and OpenTelemetry trace export
//!
//! Sets up `tracing-subscriber` with an env filter and a pretty or JSON fmt
//! layer. When telemetry is enabled, spans are also bridged to OpenTelemetry
//! and exported in batches over OTLP/HTTP to the collector.

use std::time::Duration;

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider, Tracer};
use opentelemetry_semantic_conventions::resource::SERVICE_NAME;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LoggingConfig, TelemetryConfig};

/// Keeps the tracer provider alive; call [`TelemetryGuard::shutdown`] on exit
#[must_use = "spans are only flushed when the guard is shut down"]
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Flush pending spans and stop the exporter
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!("Tracer provider shutdown failed: {}", e);
            }
        }
    }
}

/// Build the tracer provider exporting to the configured collector
pub fn build_tracer_provider(telemetry: &TelemetryConfig) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(telemetry.collector_endpoint.clone())
        .with_timeout(Duration::from_secs(telemetry.timeout_seconds.into()))
        .build()
        .with_context(|| "Failed to build OTLP span exporter")?;

    let resource = Resource::builder_empty()
        .with_attributes([KeyValue::new(SERVICE_NAME, telemetry.service_name.clone())])
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
        .with_resource(resource)
        .build())
}

/// Install the global subscriber for one service
pub fn init(logging: &LoggingConfig, telemetry: &TelemetryConfig) -> Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .with_context(|| format!("Invalid log level '{}'", logging.level))?;

    let fmt_layer = match logging.format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().boxed(),
        _ => tracing_subscriber::fmt::layer().boxed(),
    };

    let provider = if telemetry.enabled {
        Some(build_tracer_provider(telemetry)?)
    } else {
        None
    };
    let bridge = provider
        .as_ref()
        .map(|provider| otel_layer(provider.tracer(telemetry.service_name.clone())));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(bridge)
        .with(filter)
        .try_init()
        .with_context(|| "Failed to install tracing subscriber")?;

    if telemetry.enabled {
        tracing::info!(
            "Exporting spans for {} to {}",
            telemetry.service_name,
            telemetry.collector_endpoint
        );
    } else {
        tracing::info!("Span export disabled for {}", telemetry.service_name);
    }

    Ok(TelemetryGuard { provider })
}

/// `tracing` to OpenTelemetry bridge layer
pub fn otel_layer<S>(tracer: Tracer) -> tracing_opentelemetry::OpenTelemetryLayer<S, Tracer>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    tracing_opentelemetry::layer().with_tracer(tracer)
}
