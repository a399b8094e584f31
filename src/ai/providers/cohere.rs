//! Cohere API Provider
//!
//! This module implements the AiProvider trait for Cohere's generate API.

use crate::ai::client::HttpClient;
use crate::ai::extract;
use crate::ai::provider::{
    AiProvider, CredentialField, Credentials, GenerationRequest, ProviderCapabilities, RateLimit,
};
use crate::error::{PaletteForgeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cohere API base URL
const COHERE_API_BASE: &str = "https://api.cohere.ai/v1";

/// Default model
const DEFAULT_MODEL: &str = "command";

/// Credential fields accepted by this provider
pub(crate) const REQUIREMENTS: &[CredentialField] = &[
    CredentialField {
        name: "api_key",
        required: true,
        description: "Cohere API key",
    },
    CredentialField {
        name: "model",
        required: false,
        description: "Cohere model to use (defaults to command)",
    },
];

/// Cohere generate provider
#[derive(Debug)]
pub struct CohereProvider {
    /// Vendor credentials
    credentials: Credentials,
    /// Model to use (e.g. "command", "command-r-plus")
    model: String,
    /// HTTP client for making requests
    client: HttpClient,
}

impl CohereProvider {
    /// Create a new Cohere provider
    pub fn new(credentials: Credentials) -> Result<Self> {
        check_credentials(&credentials)?;
        let client = HttpClient::for_credentials(&credentials)?;
        let model = credentials
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self {
            credentials,
            model,
            client,
        })
    }

    /// Generate endpoint, honoring a base URL override
    fn endpoint(&self) -> String {
        let base = self
            .credentials
            .base_url
            .as_deref()
            .unwrap_or(COHERE_API_BASE);
        format!("{}/generate", base.trim_end_matches('/'))
    }

    /// Shape a generation request into the generate body
    ///
    /// Cohere takes a single prompt string, so the JSON instruction is
    /// embedded in the prompt text.
    fn build_request(&self, request: &GenerationRequest) -> CohereRequest {
        CohereRequest {
            model: self.model.clone(),
            prompt: request.completion_prompt(),
            max_tokens: request.option_u32("max_tokens").unwrap_or(512),
            temperature: request.option_f32("temperature").unwrap_or(0.7),
        }
    }
}

#[async_trait]
impl AiProvider for CohereProvider {
    fn name(&self) -> &str {
        "cohere"
    }

    fn display_name(&self) -> &str {
        "Cohere"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_colors: 10,
            supports_streaming: false,
            supports_batch: true,
            supports_style_transfer: false,
            max_prompt_length: 4000,
            rate_limit: RateLimit {
                requests_per_minute: 100,
                tokens_per_minute: 10_000,
            },
        }
    }

    fn requirements(&self) -> &'static [CredentialField] {
        REQUIREMENTS
    }

    fn model_id(&self) -> Option<&str> {
        Some(&self.model)
    }

    fn validate_credentials(&self) -> Result<()> {
        check_credentials(&self.credentials)
    }

    fn is_ready(&self) -> bool {
        !self.credentials.api_key.is_empty()
    }

    async fn generate_colors(&self, request: &GenerationRequest) -> Result<Value> {
        let body = self.build_request(request);
        let headers = HttpClient::bearer_headers(&self.credentials.api_key)?;
        let response_text = self
            .client
            .post_json(self.name(), &self.endpoint(), headers, &body)
            .await?;

        let response: CohereResponse = serde_json::from_str(&response_text).map_err(|e| {
            PaletteForgeError::malformed(self.name(), format!("failed to decode response: {e}"))
        })?;

        let text = response
            .generations
            .first()
            .map(|generation| generation.text.as_str())
            .ok_or_else(|| PaletteForgeError::malformed(self.name(), "empty generations array"))?;

        extract::extract_json(self.name(), text)
    }

    async fn probe(&self) -> Result<()> {
        let body = CohereRequest {
            model: self.model.clone(),
            prompt: "Hi".to_string(),
            max_tokens: 1,
            temperature: 0.0,
        };
        let headers = HttpClient::bearer_headers(&self.credentials.api_key)?;
        self.client
            .post_json(self.name(), &self.endpoint(), headers, &body)
            .await?;
        Ok(())
    }
}

/// Static credential check shared by construction and `validate_credentials`
fn check_credentials(credentials: &Credentials) -> Result<()> {
    if credentials.api_key.trim().is_empty() {
        return Err(PaletteForgeError::missing_credential("cohere", "api_key"));
    }
    Ok(())
}

/// Cohere API request format
#[derive(Debug, Serialize)]
struct CohereRequest {
    model: String,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
}

/// Cohere API response format
#[derive(Debug, Deserialize)]
struct CohereResponse {
    generations: Vec<CohereGeneration>,
}

/// Generation in a Cohere response
#[derive(Debug, Deserialize)]
struct CohereGeneration {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = CohereProvider::new(Credentials::new("test-key")).unwrap();
        assert_eq!(provider.model, DEFAULT_MODEL);
        assert_eq!(provider.name(), "cohere");
    }

    #[test]
    fn test_provider_with_custom_model() {
        let provider =
            CohereProvider::new(Credentials::new("test-key").with_model("command-r-plus"))
                .unwrap();
        assert_eq!(provider.model, "command-r-plus");
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = CohereProvider::new(Credentials::default()).unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_prompt_embeds_json_instruction() {
        let provider = CohereProvider::new(Credentials::new("test-key")).unwrap();
        let request = GenerationRequest::new("deep sea").with_num_colors(6);
        let body = provider.build_request(&request);

        assert!(body.prompt.contains("deep sea"));
        assert!(body.prompt.contains("6 colors"));
        assert!(body.prompt.contains("\"metadata\""));
    }
}
