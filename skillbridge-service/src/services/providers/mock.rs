//! Mock provider implementation for local development and tests.

use super::{FinishReason, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;

/// Deterministic text provider that echoes the prompt back.
pub struct MockTextProvider {
    enabled: bool,
    model: String,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            model: "mock-model".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        Ok(ProviderResponse {
            text: Some(format!("Mock response for: {}", prompt)),
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_prompt() {
        let provider = MockTextProvider::new(true);
        let response = provider.generate("learn rust").await.unwrap();

        assert_eq!(response.text.as_deref(), Some("Mock response for: learn rust"));
        assert_eq!(response.finish_reason, FinishReason::Complete);
    }

    #[tokio::test]
    async fn disabled_provider_fails() {
        let provider = MockTextProvider::new(false);
        let result = provider.generate("x").await;

        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
        assert!(provider.health_check().await.is_err());
    }
}
