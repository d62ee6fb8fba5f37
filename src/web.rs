use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use tower_http::trace::TraceLayer;
use tracing::{Span, field};

use crate::config::ServerConfig;
use crate::propagation;

/// Wrap `router` with an ingress span that continues the caller's trace
pub fn traced(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                let span = tracing::info_span!(
                    "request",
                    otel.kind = "server",
                    http.request.method = %request.method(),
                    url.path = %request.uri().path(),
                    http.response.status_code = field::Empty,
                );
                propagation::set_parent_from_headers(&span, request.headers());
                span
            })
            .on_response(|response: &Response<Body>, latency: Duration, span: &Span| {
                span.record("http.response.status_code", response.status().as_u16());
                tracing::debug!("Answered {} in {:?}", response.status(), latency);
            }),
    )
}

/// Render `reply` and stamp the trace context of `span` on its headers
pub fn with_trace_context(span: &Span, reply: impl IntoResponse) -> axum::response::Response {
    let mut response = reply.into_response();
    propagation::inject_span(span, response.headers_mut());
    response
}

pub async fn serve(app: Router, server: &ServerConfig) -> Result<()> {
    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "Web server failed")?;
    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
