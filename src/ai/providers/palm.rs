//! Google PaLM API Provider
//!
//! This module implements the AiProvider trait for the PaLM text generation
//! API. The model is part of the endpoint path and the prompt travels inside
//! a nested `prompt.text` object.

use crate::ai::client::HttpClient;
use crate::ai::extract;
use crate::ai::provider::{
    AiProvider, CredentialField, Credentials, GenerationRequest, ProviderCapabilities, RateLimit,
};
use crate::error::{PaletteForgeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// PaLM API base URL
const PALM_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta2";

/// Default model
const DEFAULT_MODEL: &str = "text-bison-001";

/// Credential fields accepted by this provider
pub(crate) const REQUIREMENTS: &[CredentialField] = &[
    CredentialField {
        name: "api_key",
        required: true,
        description: "PaLM API key",
    },
    CredentialField {
        name: "model",
        required: false,
        description: "PaLM model to use (defaults to text-bison-001)",
    },
];

/// PaLM text generation provider
#[derive(Debug)]
pub struct PalmProvider {
    /// Vendor credentials
    credentials: Credentials,
    /// Model to use
    model: String,
    /// HTTP client for making requests
    client: HttpClient,
}

impl PalmProvider {
    /// Create a new PaLM provider
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

    /// Text generation endpoint, honoring a base URL override
    fn endpoint(&self) -> String {
        let base = self
            .credentials
            .base_url
            .as_deref()
            .unwrap_or(PALM_API_BASE);
        format!(
            "{}/models/{}:generateText",
            base.trim_end_matches('/'),
            self.model
        )
    }

    /// Shape a generation request into the generateText body
    fn build_request(&self, request: &GenerationRequest) -> PalmRequest {
        PalmRequest {
            prompt: PalmPrompt {
                text: request.completion_prompt(),
            },
            temperature: request.option_f32("temperature").unwrap_or(0.7),
            candidate_count: 1,
            max_output_tokens: request.option_u32("max_tokens").unwrap_or(512),
        }
    }
}

#[async_trait]
impl AiProvider for PalmProvider {
    fn name(&self) -> &str {
        "palm"
    }

    fn display_name(&self) -> &str {
        "PaLM"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_colors: 10,
            supports_streaming: false,
            supports_batch: true,
            supports_style_transfer: false,
            max_prompt_length: 8000,
            rate_limit: RateLimit {
                requests_per_minute: 60,
                tokens_per_minute: 30_000,
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

        let response: PalmResponse = serde_json::from_str(&response_text).map_err(|e| {
            PaletteForgeError::malformed(self.name(), format!("failed to decode response: {e}"))
        })?;

        let text = response
            .candidates
            .first()
            .map(|candidate| candidate.output.as_str())
            .ok_or_else(|| PaletteForgeError::malformed(self.name(), "empty candidates array"))?;

        extract::extract_json(self.name(), text)
    }

    async fn probe(&self) -> Result<()> {
        let body = PalmRequest {
            prompt: PalmPrompt {
                text: "Hi".to_string(),
            },
            temperature: 0.0,
            candidate_count: 1,
            max_output_tokens: 1,
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
        return Err(PaletteForgeError::missing_credential("palm", "api_key"));
    }
    Ok(())
}

/// PaLM API request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PalmRequest {
    prompt: PalmPrompt,
    temperature: f32,
    candidate_count: u32,
    max_output_tokens: u32,
}

/// Nested prompt object
#[derive(Debug, Serialize)]
struct PalmPrompt {
    text: String,
}

/// PaLM API response format
#[derive(Debug, Deserialize)]
struct PalmResponse {
    #[serde(default)]
    candidates: Vec<PalmCandidate>,
}

/// Candidate in a PaLM response
#[derive(Debug, Deserialize)]
struct PalmCandidate {
    output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = PalmProvider::new(Credentials::new("test-key")).unwrap();
        assert_eq!(provider.model, DEFAULT_MODEL);
        assert_eq!(provider.name(), "palm");
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = PalmProvider::new(Credentials::default()).unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_endpoint_contains_model_and_action() {
        let provider = PalmProvider::new(Credentials::new("test-key")).unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta2/models/text-bison-001:generateText"
        );
    }

    #[test]
    fn test_request_body_is_camel_cased() {
        let provider = PalmProvider::new(Credentials::new("test-key")).unwrap();
        let body = provider.build_request(&GenerationRequest::new("desert dusk"));
        let encoded = serde_json::to_value(&body).unwrap();

        assert!(encoded.get("maxOutputTokens").is_some());
        assert!(encoded.get("candidateCount").is_some());
        assert!(encoded["prompt"]["text"]
            .as_str()
            .unwrap()
            .contains("desert dusk"));
    }
}
