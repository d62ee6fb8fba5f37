//! Gateway service: validates a posted CEP and forwards it to the resolver

use std::time::Duration;

use anyhow::Result;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::post;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{Instrument, Span, field, info, warn};

use crate::config::GatewayConfig;
use crate::http_client::build_client;
use crate::postal_code::{self, NormalizedPostalCode};
use crate::translate::Outcome;
use crate::web;

/// Body of `POST /temperature`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemperatureRequest {
    pub cep: String,
}

impl TemperatureRequest {
    /// A body that is not a JSON object with a string `cep` counts as an empty CEP
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|e| {
            tracing::debug!("Unparseable request body: {}", e);
            Self::default()
        })
    }
}

/// HTTP client for the resolver's `/temperature/{zipcode}` endpoint
#[derive(Clone)]
pub struct ResolverClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl ResolverClient {
    pub fn new(client: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Forward `code`, returning whatever status and body come back
    pub async fn fetch(&self, code: &NormalizedPostalCode) -> crate::Result<(StatusCode, Bytes)> {
        let url = format!("{}/temperature/{}", self.base_url, code);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body))
    }
}

#[derive(Clone)]
pub struct GatewayState {
    resolver: ResolverClient,
}

impl GatewayState {
    pub fn new(resolver: ResolverClient) -> Self {
        Self { resolver }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let client = build_client(Duration::from_secs(config.resolver.timeout_seconds.into()))?;
        Ok(Self::new(ResolverClient::new(
            client,
            config.resolver.base_url.as_str(),
        )))
    }

    /// Validate locally, then classify what the resolver answers
    pub async fn forward(&self, request: &TemperatureRequest) -> Outcome {
        let code = match postal_code::validate(&request.cep) {
            Ok(code) => code,
            Err(e) => {
                info!("Rejected CEP {:?}: {}", request.cep, e);
                return Outcome::Invalid;
            }
        };
        Span::current().record("cep", code.as_str());

        match self.resolver.fetch(&code).await {
            Ok((status, body)) => {
                let outcome = Outcome::from_resolver_reply(status, &body);
                info!("Resolver answered {} for {}", status, code);
                outcome
            }
            Err(e) => {
                warn!("Resolver unreachable for {}: {}", code, e);
                Outcome::from_transport_failure(&e)
            }
        }
    }
}

pub fn router(state: GatewayState) -> Router {
    web::traced(
        Router::new()
            .route("/temperature", post(post_temperature))
            .with_state(state),
    )
}

async fn post_temperature(State(state): State<GatewayState>, body: Bytes) -> Response {
    let span = tracing::info_span!("handler", cep = field::Empty);

    let request = span.in_scope(|| TemperatureRequest::from_body(&body));
    let outcome = state.forward(&request).instrument(span.clone()).await;

    web::with_trace_context(&span, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temperature::TemperatureReport;
    use axum::body::Body;
    use axum::http::Request;
    use rstest::rstest;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(base_url: &str) -> Router {
        let client = build_client(Duration::from_secs(2)).unwrap();
        router(GatewayState::new(ResolverClient::new(client, base_url)))
    }

    async fn post_json(app: Router, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri("/temperature")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[rstest]
    #[case(r#"{"cep":"01310100"}"#, "01310100")]
    #[case(r#"{"cep":"01310-100"}"#, "01310100")]
    #[case("not json", "")]
    #[case(r#"{"cep":29010}"#, "")]
    #[case("{}", "")]
    fn test_request_from_body(#[case] body: &str, #[case] expected: &str) {
        let request = TemperatureRequest::from_body(body.as_bytes());
        let cep = postal_code::validate(&request.cep)
            .map(|code| code.to_string())
            .unwrap_or_default();
        assert_eq!(cep, expected);
    }

    #[tokio::test]
    async fn test_forwards_normalized_code() {
        let server = MockServer::start().await;
        let report = TemperatureReport::new("São Paulo", 23.4);
        Mock::given(method("GET"))
            .and(path("/temperature/01310100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&report))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = post_json(app(&server.uri()), r#"{"cep":"01310-100"}"#).await;

        assert_eq!(status, StatusCode::OK);
        let received: TemperatureReport = serde_json::from_str(&body).unwrap();
        assert_eq!(received, report);
    }

    #[rstest]
    #[case(r#"{"cep":"123"}"#)]
    #[case(r#"{"cep":"0131010a"}"#)]
    #[case(r#"{"cep":""}"#)]
    #[case("garbage")]
    #[tokio::test]
    async fn test_invalid_cep_never_reaches_resolver(#[case] body: &str) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (status, body) = post_json(app(&server.uri()), body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "invalid zipcode");
    }

    #[rstest]
    #[case(404, "can not find zipcode")]
    #[case(200, r#"{"city":"","temp_C":20.0,"temp_F":68.0,"temp_K":293.2}"#)]
    #[case(200, "<html>bad gateway</html>")]
    #[case(500, "")]
    #[tokio::test]
    async fn test_unusable_resolver_reply_is_not_found(#[case] status: u16, #[case] reply: &str) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/temperature/99999999"))
            .respond_with(ResponseTemplate::new(status).set_body_string(reply))
            .mount(&server)
            .await;

        let (status, body) = post_json(app(&server.uri()), r#"{"cep":"99999999"}"#).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "can not find zipcode");
    }

    #[tokio::test]
    async fn test_resolver_rejection_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid zipcode"))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = post_json(app(&server.uri()), r#"{"cep":"01310100"}"#).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "can not find zipcode");
    }

    #[tokio::test]
    async fn test_unreachable_resolver_is_invalid() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (status, body) = post_json(app(&format!("http://{addr}")), r#"{"cep":"01310100"}"#).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "invalid zipcode");
    }
}
