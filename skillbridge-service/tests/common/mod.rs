#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use service_core::config::Config;
use skillbridge_service::config::SkillbridgeConfig;
use skillbridge_service::services::history::StoreError;
use skillbridge_service::services::providers::mock::MockTextProvider;
use skillbridge_service::services::providers::{FinishReason, ProviderError, ProviderResponse};
use skillbridge_service::services::{
    Dependency, HistoryRecord, HistoryStore, MemoryHistoryStore, RequestFacade, TextProvider,
    TextReportRenderer,
};
use skillbridge_service::startup::{build_router, AppState, Application};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Configuration as if read from an environment holding only `vars`, on a
/// random port.
pub fn test_config(vars: &[(&str, &str)]) -> SkillbridgeConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let common = Config { port: 0 };
    SkillbridgeConfig::from_lookup(common, |key| vars.get(key).cloned())
}

pub fn memory_store() -> Dependency<dyn HistoryStore> {
    Dependency::present(Arc::new(MemoryHistoryStore::new()) as Arc<dyn HistoryStore>)
}

pub fn facade(
    model: Arc<dyn TextProvider>,
    store: Dependency<dyn HistoryStore>,
) -> RequestFacade {
    RequestFacade::new(model, store, Arc::new(TextReportRenderer))
}

pub fn router(facade: RequestFacade) -> Router {
    build_router(AppState {
        config: test_config(&[]),
        facade,
    })
}

/// Router backed by the mock model and an in-memory store.
pub fn default_router() -> Router {
    router(facade(Arc::new(MockTextProvider::new(true)), memory_store()))
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("response body is JSON")
}

/// Model that always fails with the given message.
pub struct FailingProvider(pub String);

#[async_trait]
impl TextProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn model(&self) -> &str {
        "failing-model"
    }

    async fn generate(&self, _prompt: &str) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::ApiError(self.0.clone()))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Model that answers without any text.
pub struct SilentProvider;

#[async_trait]
impl TextProvider for SilentProvider {
    fn name(&self) -> &str {
        "silent"
    }

    fn model(&self) -> &str {
        "silent-model"
    }

    async fn generate(&self, _prompt: &str) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse {
            text: None,
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Store whose every operation fails.
pub struct UnavailableStore;

#[async_trait]
impl HistoryStore for UnavailableStore {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn persist(&self, _record: HistoryRecord) -> Result<String, StoreError> {
        Err(StoreError::Operation("connection reset".to_string()))
    }

    async fn fetch_all(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        Err(StoreError::Operation("connection reset".to_string()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(StoreError::Connection("connection reset".to_string()))
    }
}

/// A running server on a random local port.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(config: SkillbridgeConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let address = format!("http://127.0.0.1:{}", port);
        let client = reqwest::Client::new();

        // Wait for the server to answer before handing it out
        for _ in 0..50 {
            if client
                .get(format!("{}/health", address))
                .timeout(Duration::from_secs(1))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Self {
            address,
            port,
            client,
        }
    }
}
