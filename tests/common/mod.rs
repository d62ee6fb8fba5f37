//! Both services running on ephemeral ports against mocked providers

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use cep_weather::config::{GeocodingConfig, WeatherConfig};
use cep_weather::gateway::{self, GatewayState, ResolverClient};
use cep_weather::http_client::build_client;
use cep_weather::resolver::{self, ResolverState};
use cep_weather::{ViaCepClient, WeatherApiClient};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct Stack {
    pub providers: MockServer,
    pub gateway: SocketAddr,
    pub resolver: SocketAddr,
}

impl Stack {
    pub fn gateway_url(&self) -> String {
        format!("http://{}/temperature", self.gateway)
    }
}

pub async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// ViaCEP knows 01310100 (São Paulo) and 29000000 (no city); WeatherAPI reports 23.4C in São Paulo
pub async fn mount_providers(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ws/01310100/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cep": "01310-100",
            "logradouro": "Avenida Paulista",
            "bairro": "Bela Vista",
            "localidade": "São Paulo",
            "uf": "SP",
            "ibge": "3550308",
            "ddd": "11"
        })))
        .mount(server)
        .await;

    // Registered code without a city
    Mock::given(method("GET"))
        .and(path("/ws/29000000/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cep": "29000-000",
            "logradouro": "",
            "bairro": "",
            "localidade": "",
            "uf": "ES",
            "ibge": "",
            "ddd": "27"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ws/99999999/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "erro": true })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("q", "Sao Paulo"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": { "name": "Sao Paulo", "region": "Sao Paulo", "country": "Brazil" },
            "current": { "temp_c": 23.4 }
        })))
        .mount(server)
        .await;
}

pub async fn start() -> Stack {
    let providers = MockServer::start().await;
    mount_providers(&providers).await;

    let geocoding = GeocodingConfig {
        base_url: format!("{}/ws", providers.uri()),
        timeout_seconds: 5,
    };
    let weather = WeatherConfig {
        base_url: format!("{}/v1", providers.uri()),
        api_key: Some("test-key".to_string()),
        timeout_seconds: 5,
    };
    let client = build_client(Duration::from_secs(5)).unwrap();
    let resolver_state = ResolverState::new(
        Arc::new(ViaCepClient::new(client.clone(), &geocoding)),
        Arc::new(WeatherApiClient::new(client, &weather).unwrap()),
    );
    let resolver = spawn(resolver::router(resolver_state)).await;

    let resolver_client = ResolverClient::new(
        build_client(Duration::from_secs(5)).unwrap(),
        format!("http://{resolver}"),
    );
    let gateway = spawn(gateway::router(GatewayState::new(resolver_client))).await;

    Stack {
        providers,
        gateway,
        resolver,
    }
}
