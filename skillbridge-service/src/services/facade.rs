//! Request facade: input validation, delegation to the backend ports and
//! mapping of their outcomes onto [`ServiceError`].

use super::dependency::Dependency;
use super::history::{HistoryRecord, HistoryStore};
use super::metrics::{
    record_pdf_export, record_provider_latency, record_request, record_store_operation,
    record_tokens,
};
use super::pdf::{PdfError, PdfRenderer};
use super::providers::TextProvider;
use crate::error::ServiceError;
use std::sync::Arc;
use std::time::Instant;

/// Substituted when the model answers without usable text.
pub const NO_RECOMMENDATIONS: &str = "No recommendations available.";

/// Rendered instead of an empty export body.
pub const NO_CONTENT: &str = "No content provided";

pub const REPORT_FILENAME: &str = "SkillBridge_Report.pdf";

pub const HEALTH_STATUS: &str = "SkillBridge backend is running";

const HISTORY_FEATURE: &str = "History storage";

const PROMPT_TEMPLATE: &str = "You are SkillBridge, a career guidance assistant. \
Based on the user's background and goals below, recommend the skills they should \
develop next, learning resources or courses for each skill, and career paths those \
skills open up. Keep the answer concise and practical.\n\nUser input:\n";

/// Build the prompt sent to the model for a recommendation request.
pub fn build_prompt(input: &str) -> String {
    format!("{}{}", PROMPT_TEMPLATE, input)
}

/// Dependency state reported by the readiness endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    pub model: String,
    pub model_healthy: bool,
    pub history_store: StoreState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Present,
    Unreachable,
    Absent,
}

impl StoreState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreState::Present => "present",
            StoreState::Unreachable => "unreachable",
            StoreState::Absent => "absent",
        }
    }
}

/// A rendered report ready to be served once.
#[derive(Debug, Clone)]
pub struct PdfArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct RequestFacade {
    model: Arc<dyn TextProvider>,
    store: Dependency<dyn HistoryStore>,
    pdf: Arc<dyn PdfRenderer>,
}

impl RequestFacade {
    pub fn new(
        model: Arc<dyn TextProvider>,
        store: Dependency<dyn HistoryStore>,
        pdf: Arc<dyn PdfRenderer>,
    ) -> Self {
        Self { model, store, pdf }
    }

    pub fn model(&self) -> &Arc<dyn TextProvider> {
        &self.model
    }

    pub fn store(&self) -> &Dependency<dyn HistoryStore> {
        &self.store
    }

    /// Generate recommendations for the given input.
    pub async fn recommend(&self, input: &str) -> Result<String, ServiceError> {
        if input.is_empty() {
            record_request("recommend", "invalid_argument");
            return Err(ServiceError::InvalidArgument(
                "Input must not be empty".to_string(),
            ));
        }

        let prompt = build_prompt(input);
        let model = self.model.model().to_string();
        let start = Instant::now();

        let result = self.model.generate(&prompt).await;
        record_provider_latency(&model, start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            tracing::error!(
                provider = %self.model.name(),
                model = %model,
                kind = e.kind(),
                "Model generation failed: {}",
                e
            );
            record_request("recommend", "upstream_failure");
            ServiceError::UpstreamFailure(e.to_string())
        })?;

        record_tokens(&model, response.input_tokens, response.output_tokens);
        tracing::info!(
            model = %model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = response.finish_reason.as_str(),
            "Generated recommendations"
        );

        let text = match response.text {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                tracing::warn!(model = %model, "Model returned no usable text, using fallback");
                NO_RECOMMENDATIONS.to_string()
            }
        };

        record_request("recommend", "ok");
        Ok(text)
    }

    /// Persist a record and return its generated identifier.
    pub async fn save(&self, record: HistoryRecord) -> Result<String, ServiceError> {
        let store = self.store.require(HISTORY_FEATURE).inspect_err(|_| {
            record_request("save", "feature_disabled");
        })?;

        match store.persist(record).await {
            Ok(doc_id) => {
                record_store_operation("persist", "ok");
                record_request("save", "ok");
                tracing::info!(store = %store.name(), doc_id = %doc_id, "Saved history record");
                Ok(doc_id)
            }
            Err(e) => {
                tracing::error!(store = %store.name(), "Failed to save history record: {}", e);
                record_store_operation("persist", "error");
                record_request("save", "upstream_failure");
                Err(ServiceError::UpstreamFailure(e.to_string()))
            }
        }
    }

    /// Every persisted record, in backend order.
    pub async fn history(&self) -> Result<Vec<HistoryRecord>, ServiceError> {
        let store = self.store.require(HISTORY_FEATURE).inspect_err(|_| {
            record_request("history", "feature_disabled");
        })?;

        match store.fetch_all().await {
            Ok(records) => {
                record_store_operation("fetch_all", "ok");
                record_request("history", "ok");
                Ok(records)
            }
            Err(e) => {
                tracing::error!(store = %store.name(), "Failed to fetch history: {}", e);
                record_store_operation("fetch_all", "error");
                record_request("history", "upstream_failure");
                Err(ServiceError::UpstreamFailure(e.to_string()))
            }
        }
    }

    /// Render `content` into a fresh temporary PDF and read it back.
    pub async fn export_pdf(&self, content: &str) -> Result<PdfArtifact, ServiceError> {
        let text = if content.is_empty() {
            NO_CONTENT.to_string()
        } else {
            content.to_string()
        };
        let renderer = Arc::clone(&self.pdf);

        let rendered = tokio::task::spawn_blocking(move || render_to_temp_file(&*renderer, &text))
            .await
            .map_err(|e| {
                tracing::error!("PDF rendering task failed: {}", e);
                record_pdf_export("error");
                record_request("export_pdf", "upstream_failure");
                ServiceError::UpstreamFailure(format!("PDF rendering task failed: {}", e))
            })?;

        match rendered {
            Ok(bytes) => {
                record_pdf_export("ok");
                record_request("export_pdf", "ok");
                tracing::info!(size = bytes.len(), "Exported PDF report");
                Ok(PdfArtifact {
                    filename: REPORT_FILENAME.to_string(),
                    bytes,
                })
            }
            Err(e) => {
                tracing::error!("PDF export failed: {}", e);
                record_pdf_export("error");
                record_request("export_pdf", "upstream_failure");
                Err(ServiceError::UpstreamFailure(e.to_string()))
            }
        }
    }

    /// Constant liveness status.
    pub fn health(&self) -> &'static str {
        HEALTH_STATUS
    }

    /// Ask each backend whether it can currently serve requests.
    pub async fn readiness(&self) -> Readiness {
        let model_healthy = match self.model.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(provider = %self.model.name(), "Model health check failed: {}", e);
                false
            }
        };

        let history_store = match &self.store {
            Dependency::Present(store) => match store.health_check().await {
                Ok(()) => StoreState::Present,
                Err(e) => {
                    tracing::warn!(store = %store.name(), "History store health check failed: {}", e);
                    StoreState::Unreachable
                }
            },
            Dependency::Absent { .. } => StoreState::Absent,
        };

        Readiness {
            model: self.model.model().to_string(),
            model_healthy,
            history_store,
        }
    }
}

// The temp file is removed when `file` drops, after the bytes are read.
fn render_to_temp_file(renderer: &dyn PdfRenderer, text: &str) -> Result<Vec<u8>, PdfError> {
    let file = tempfile::Builder::new()
        .prefix("skillbridge-report-")
        .suffix(".pdf")
        .tempfile()?;
    renderer.render(text, file.path())?;
    Ok(std::fs::read(file.path())?)
}
