//! Gemini provider implementation.
//!
//! Implements text generation against the Vertex AI `generateContent` endpoint
//! for a Google publisher model, authenticated with either an OAuth access
//! token or an API key.

use super::{FinishReason, ProviderError, ProviderResponse, TextProvider};
use crate::config::PROJECT_NOT_CONFIGURED;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini provider configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub project_id: String,
    pub location: String,
    pub model: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    /// Base URL override; defaults to the regional Vertex AI host.
    pub api_base: Option<String>,
    pub timeout: Duration,
}

#[derive(Clone)]
enum Credential {
    AccessToken(String),
    ApiKey(String),
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    credential: Credential,
    base_url: String,
    client: Client,
}

impl GeminiTextProvider {
    /// Build the provider. Fails when the project or a credential is missing,
    /// since recommendations cannot work without either.
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        if config.project_id.trim().is_empty() || config.project_id == PROJECT_NOT_CONFIGURED {
            return Err(ProviderError::NotConfigured(
                "GCP_PROJECT_ID is not set".to_string(),
            ));
        }

        let credential = match (&config.access_token, &config.api_key) {
            (Some(token), _) if !token.is_empty() => Credential::AccessToken(token.clone()),
            (_, Some(key)) if !key.is_empty() => Credential::ApiKey(key.clone()),
            _ => {
                return Err(ProviderError::NotConfigured(
                    "Neither GOOGLE_ACCESS_TOKEN nor GOOGLE_API_KEY is set".to_string(),
                ));
            }
        };

        let base_url = config
            .api_base
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", config.location))
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            credential,
            base_url,
            client,
        })
    }

    /// Build the API URL for the configured model and method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
            self.base_url, self.config.project_id, self.config.location, self.config.model, method
        )
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        tracing::debug!(
            model = %self.config.model,
            location = %self.config.location,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let builder = self.client.post(self.api_url("generateContent")).json(&request);
        let builder = match &self.credential {
            Credential::AccessToken(token) => builder.bearer_auth(token),
            Credential::ApiKey(key) => builder.query(&[("key", key.as_str())]),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            match status.as_u16() {
                429 => return Err(ProviderError::RateLimited),
                400 => {
                    return Err(ProviderError::InvalidRequest(format!(
                        "Gemini rejected the request: {}",
                        error_text
                    )));
                }
                _ => {}
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        // A blocked prompt comes back with no candidates at all.
        if let Some(reason) = api_response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            tracing::warn!(
                model = %self.config.model,
                block_reason = %reason,
                "Gemini blocked the prompt"
            );
            return Err(ProviderError::ContentFiltered);
        }

        let candidate = api_response.candidates.first();

        let finish_reason = candidate
            .map(|c| match c.finish_reason.as_deref() {
                Some("STOP") => FinishReason::Complete,
                Some("MAX_TOKENS") => FinishReason::Length,
                Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                    FinishReason::ContentFilter
                }
                _ => FinishReason::Complete,
            })
            .unwrap_or(FinishReason::Complete);

        if finish_reason == FinishReason::ContentFilter {
            return Err(ProviderError::ContentFiltered);
        }

        // Concatenate the text parts of the first candidate
        let text = candidate
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty());

        let usage = api_response.usage_metadata.unwrap_or_default();

        Ok(ProviderResponse {
            text,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let configured = match &self.credential {
            Credential::AccessToken(token) => !token.is_empty(),
            Credential::ApiKey(key) => !key.is_empty(),
        };

        if configured {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Gemini credential not configured".to_string(),
            ))
        }
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}
