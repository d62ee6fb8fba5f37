//! Outbound HTTP client shared by every hop
//!
//! All calls go through [`TracePropagation`], which opens a client span per
//! request and writes its trace context into the outbound headers.

use std::time::Duration;

use anyhow::{Context, Result};
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use tracing::{Instrument, field};

use crate::propagation;

/// Middleware that brackets each outbound request with a client span
#[derive(Debug, Clone, Copy, Default)]
pub struct TracePropagation;

#[async_trait::async_trait]
impl Middleware for TracePropagation {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        // The query string is left out: it carries the weather API key.
        let span = tracing::info_span!(
            "outbound_request",
            otel.kind = "client",
            http.request.method = %req.method(),
            server.address = req.url().host_str().unwrap_or_default(),
            url.path = req.url().path(),
            http.response.status_code = field::Empty,
        );
        propagation::inject_span(&span, req.headers_mut());

        let result = next
            .run(req, extensions)
            .instrument(span.clone())
            .await
            .map_err(without_url);
        match &result {
            Ok(response) => {
                span.record("http.response.status_code", response.status().as_u16());
            }
            Err(e) => {
                let _enter = span.enter();
                tracing::warn!("Outbound request failed: {}", e);
            }
        }
        result
    }
}

/// Transport errors print the full URL, query string included
fn without_url(err: reqwest_middleware::Error) -> reqwest_middleware::Error {
    match err {
        reqwest_middleware::Error::Reqwest(err) => {
            reqwest_middleware::Error::Reqwest(err.without_url())
        }
        other => other,
    }
}

/// Build a client with a per-request deadline and trace propagation
pub fn build_client(timeout: Duration) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("cep-weather/", env!("CARGO_PKG_VERSION")))
        .build()
        .with_context(|| "Failed to create HTTP client")?;

    Ok(ClientBuilder::new(client).with(TracePropagation).build())
}
