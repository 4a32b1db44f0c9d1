//! Application startup and lifecycle management.
//!
//! Dependencies are built once here and injected into the [`RequestFacade`].
//! The model provider is mandatory: failing to build it aborts startup. The
//! history store is optional and degrades to [`Dependency::Absent`].

use crate::config::{ModelProviderKind, SkillbridgeConfig, StoreBackend};
use crate::handlers;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::mock::MockTextProvider;
use crate::services::{
    Dependency, HistoryStore, MemoryHistoryStore, MongoHistoryStore, RequestFacade,
    TextProvider, TextReportRenderer,
};
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: SkillbridgeConfig,
    pub facade: RequestFacade,
}

/// Build the model provider selected by configuration.
pub fn init_model_provider(config: &SkillbridgeConfig) -> Result<Arc<dyn TextProvider>, AppError> {
    match config.model.provider {
        ModelProviderKind::Mock => {
            tracing::warn!("Using mock text provider; recommendations are not generated");
            Ok(Arc::new(
                MockTextProvider::new(true).with_model(config.model.model_id.clone()),
            ))
        }
        ModelProviderKind::Gemini => {
            let gemini_config = GeminiConfig {
                project_id: config.gcp.project_id.clone(),
                location: config.gcp.location.clone(),
                model: config.model.model_id.clone(),
                api_key: config.model.api_key.clone(),
                access_token: config.model.access_token.clone(),
                api_base: config.model.api_base.clone(),
                timeout: Duration::from_secs(config.model.timeout_secs),
            };
            let provider = GeminiTextProvider::new(gemini_config).map_err(|e| {
                tracing::error!("Failed to initialize Gemini text provider: {}", e);
                AppError::ConfigError(anyhow::anyhow!(e))
            })?;

            tracing::info!(
                project = %config.gcp.project_id,
                location = %config.gcp.location,
                model = %config.model.model_id,
                "Initialized Gemini text provider"
            );
            Ok(Arc::new(provider))
        }
    }
}

/// Try to bring up the history store. Never fails: any problem leaves the
/// store absent and persistence endpoints answer 503.
pub async fn init_history_store(config: &SkillbridgeConfig) -> Dependency<dyn HistoryStore> {
    let settings = &config.history_store;

    if !settings.enabled {
        tracing::info!("History store disabled by configuration");
        return Dependency::absent("disabled by configuration");
    }

    match settings.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory history store; records are lost on restart");
            Dependency::present(Arc::new(MemoryHistoryStore::new()) as Arc<dyn HistoryStore>)
        }
        StoreBackend::MongoDb => {
            let Some(uri) = settings.mongodb_uri.as_deref() else {
                tracing::warn!("MONGODB_URI is not set; history features disabled");
                return Dependency::absent("MONGODB_URI is not set");
            };

            match MongoHistoryStore::connect(
                uri,
                &settings.database,
                &settings.collection,
                Duration::from_secs(settings.connect_timeout_secs),
            )
            .await
            {
                Ok(store) => Dependency::present(Arc::new(store) as Arc<dyn HistoryStore>),
                Err(e) => {
                    tracing::warn!(error = %e, "History store unavailable; history features disabled");
                    Dependency::absent(e.to_string())
                }
            }
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
        .expose_headers([header::CONTENT_DISPOSITION])
}

/// Build the HTTP router for the given state.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_endpoint))
        .route("/api/recommend", post(handlers::api::recommend))
        .route("/api/save", post(handlers::api::save))
        .route("/api/history", get(handlers::api::history))
        .route("/api/export_pdf", post(handlers::api::export_pdf))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: SkillbridgeConfig) -> Result<Self, AppError> {
        let model = init_model_provider(&config)?;
        let store = init_history_store(&config).await;
        let facade = RequestFacade::new(model, store, Arc::new(TextReportRenderer));

        Self::with_facade(config, facade).await
    }

    /// Bind a listener for an already assembled facade.
    pub async fn with_facade(
        config: SkillbridgeConfig,
        facade: RequestFacade,
    ) -> Result<Self, AppError> {
        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port = port,
            history_store = facade.store().is_present(),
            model = %facade.model().model(),
            "SkillBridge service configured"
        );

        let router = build_router(AppState { config, facade });

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
