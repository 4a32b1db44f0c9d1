//! JSON API endpoints.

use crate::error::ServiceError;
use crate::services::HistoryRecord;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub input: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommendations: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub status: String,
    pub doc_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportPdfRequest {
    #[serde(default)]
    pub content: String,
}

// Malformed or mistyped bodies are the caller's fault: always 400.
fn reject(rejection: JsonRejection) -> AppError {
    tracing::warn!(status = %rejection.status(), "Rejected request body: {}", rejection.body_text());
    ServiceError::InvalidArgument(rejection.body_text()).into()
}

pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, AppError> {
    let Json(request) = payload.map_err(reject)?;
    let recommendations = state.facade.recommend(&request.input).await?;
    Ok(Json(RecommendResponse { recommendations }))
}

/// Persist an arbitrary JSON object.
pub async fn save(
    State(state): State<AppState>,
    payload: Result<Json<HistoryRecord>, JsonRejection>,
) -> Result<Json<SaveResponse>, AppError> {
    let Json(record) = payload.map_err(reject)?;
    let doc_id = state.facade.save(record).await?;
    Ok(Json(SaveResponse {
        status: "saved".to_string(),
        doc_id,
    }))
}

pub async fn history(State(state): State<AppState>) -> Result<Json<Vec<HistoryRecord>>, AppError> {
    Ok(Json(state.facade.history().await?))
}

/// Render the posted text and return it as a one-shot download.
pub async fn export_pdf(
    State(state): State<AppState>,
    payload: Result<Json<ExportPdfRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(reject)?;
    let artifact = state.facade.export_pdf(&request.content).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.filename),
            ),
        ],
        artifact.bytes,
    )
        .into_response())
}
