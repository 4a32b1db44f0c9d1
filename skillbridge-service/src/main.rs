use service_core::observability::init_tracing;
use skillbridge_service::config::SkillbridgeConfig;
use skillbridge_service::services::init_metrics;
use skillbridge_service::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let otlp_endpoint = std::env::var("OTLP_ENDPOINT")
        .ok()
        .filter(|endpoint| !endpoint.trim().is_empty());
    init_tracing("skillbridge-service", &log_level, otlp_endpoint.as_deref());

    init_metrics();

    let config = SkillbridgeConfig::load();

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start skillbridge-service: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}
