//! Liveness, readiness and startup tests.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use skillbridge_service::services::{init_metrics, Dependency, HistoryStore, TextProvider};
use skillbridge_service::services::providers::mock::MockTextProvider;
use skillbridge_service::startup::{init_history_store, init_model_provider, Application};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn root_returns_constant_status() {
    let degraded = router(facade(
        Arc::new(FailingProvider("down".to_string())),
        Dependency::absent("disabled"),
    ));

    for app in [default_router(), degraded] {
        let response = send(&app, get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"status": "SkillBridge backend is running"})
        );
    }
}

#[tokio::test]
async fn health_check_returns_ok() {
    let response = send(&default_router(), get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "skillbridge-service");
}

#[tokio::test]
async fn readiness_reports_store_state_without_failing() {
    let present = send(&default_router(), get("/ready")).await;
    assert_eq!(present.status(), StatusCode::OK);
    assert_eq!(
        body_json(present).await,
        json!({"status": "ready", "history_store": "present", "model": "mock-model"})
    );

    let store: Dependency<dyn HistoryStore> = Dependency::absent("MONGODB_URI is not set");
    let degraded = router(facade(Arc::new(MockTextProvider::new(true)), store));
    let absent = send(&degraded, get("/ready")).await;
    assert_eq!(absent.status(), StatusCode::OK);
    assert_eq!(body_json(absent).await["history_store"], "absent");

    let store = Dependency::present(Arc::new(UnavailableStore) as Arc<dyn HistoryStore>);
    let unreachable = send(
        &router(facade(Arc::new(MockTextProvider::new(true)), store)),
        get("/ready"),
    )
    .await;
    assert_eq!(unreachable.status(), StatusCode::OK);
    assert_eq!(body_json(unreachable).await["history_store"], "unreachable");
}

#[tokio::test]
async fn readiness_fails_when_model_is_unhealthy() {
    let app = router(facade(Arc::new(MockTextProvider::new(false)), memory_store()));

    let response = send(&app, get("/ready")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await,
        json!({"status": "not_ready", "history_store": "present", "model": "mock-model"})
    );
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    init_metrics();
    let app = default_router();
    send(&app, post_json("/api/recommend", r#"{"input": "rust"}"#)).await;

    let response = send(&app, get("/metrics")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("skillbridge_requests_total"));
}

#[test]
fn gemini_without_project_is_fatal() {
    let config = test_config(&[("GOOGLE_API_KEY", "key")]);
    assert!(init_model_provider(&config).is_err());
}

#[test]
fn gemini_without_credentials_is_fatal() {
    let config = test_config(&[("GCP_PROJECT_ID", "skillbridge-dev")]);
    assert!(init_model_provider(&config).is_err());
}

#[test]
fn gemini_with_project_and_key_starts() {
    let config = test_config(&[
        ("GCP_PROJECT_ID", "skillbridge-dev"),
        ("GOOGLE_API_KEY", "key"),
        ("MODEL_ID", "gemini-1.5-pro"),
    ]);

    let provider = init_model_provider(&config).unwrap();

    assert_eq!(provider.name(), "gemini");
    assert_eq!(provider.model(), "gemini-1.5-pro");
}

#[tokio::test]
async fn store_initialization_degrades_instead_of_failing() {
    let disabled = test_config(&[("HISTORY_STORE_ENABLED", "false")]);
    assert!(!init_history_store(&disabled).await.is_present());

    let missing_uri = test_config(&[]);
    assert!(!init_history_store(&missing_uri).await.is_present());

    let unreachable = test_config(&[
        ("MONGODB_URI", "mongodb://127.0.0.1:1/?directConnection=true"),
        ("MONGODB_CONNECT_TIMEOUT_SECS", "1"),
    ]);
    assert!(!init_history_store(&unreachable).await.is_present());

    let memory = test_config(&[("HISTORY_STORE_BACKEND", "memory")]);
    assert!(init_history_store(&memory).await.is_present());
}

#[tokio::test]
async fn application_refuses_to_start_without_model() {
    let config = test_config(&[("HISTORY_STORE_BACKEND", "memory")]);
    assert!(Application::build(config).await.is_err());
}

#[tokio::test]
async fn application_serves_over_http() {
    let app = TestApp::spawn(test_config(&[
        ("MODEL_PROVIDER", "mock"),
        ("HISTORY_STORE_ENABLED", "false"),
    ]))
    .await;

    let response = app
        .client
        .get(format!("{}/", app.address))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "SkillBridge backend is running");

    let response = app
        .client
        .post(format!("{}/api/save", app.address))
        .json(&json!({"input": "rust"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 503);
}
