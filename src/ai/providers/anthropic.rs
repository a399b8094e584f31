//! Anthropic Claude API Provider
//!
//! This module implements the AiProvider trait for Anthropic's Messages API.

use crate::ai::client::HttpClient;
use crate::ai::extract;
use crate::ai::provider::{
    AiProvider, CredentialField, Credentials, GenerationRequest, ProviderCapabilities, RateLimit,
};
use crate::error::{PaletteForgeError, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Anthropic API base URL
const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";

/// Default model
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Credential fields accepted by this provider
pub(crate) const REQUIREMENTS: &[CredentialField] = &[
    CredentialField {
        name: "api_key",
        required: true,
        description: "Anthropic API key",
    },
    CredentialField {
        name: "model",
        required: false,
        description: "Claude model to use (defaults to claude-3-5-sonnet-20241022)",
    },
];

/// Anthropic Claude provider
#[derive(Debug)]
pub struct AnthropicProvider {
    /// Vendor credentials
    credentials: Credentials,
    /// Model to use
    model: String,
    /// HTTP client for making requests
    client: HttpClient,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
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

    /// Messages endpoint, honoring a base URL override
    fn endpoint(&self) -> String {
        let base = self
            .credentials
            .base_url
            .as_deref()
            .unwrap_or(ANTHROPIC_API_BASE);
        format!("{}/messages", base.trim_end_matches('/'))
    }

    /// Build headers for the Anthropic API
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HttpClient::custom_auth_headers("x-api-key", &self.credentials.api_key)?;
        headers.insert(
            HttpClient::header_name("anthropic-version")?,
            HttpClient::header_value(ANTHROPIC_VERSION)?,
        );
        Ok(headers)
    }

    /// Shape a generation request into the messages body
    fn build_request(&self, request: &GenerationRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: request.option_u32("max_tokens").unwrap_or(1024),
            system: Some(request.system_instruction()),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            temperature: Some(request.option_f32("temperature").unwrap_or(0.7)),
        }
    }

    /// Concatenate the text blocks of a response
    fn extract_content(response: &AnthropicResponse) -> String {
        response
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect()
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn display_name(&self) -> &str {
        "Anthropic"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_colors: 10,
            supports_streaming: true,
            supports_batch: true,
            supports_style_transfer: true,
            max_prompt_length: 20_000,
            rate_limit: RateLimit {
                requests_per_minute: 1000,
                tokens_per_minute: 80_000,
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
        let headers = self.build_headers()?;
        let response_text = self
            .client
            .post_json(self.name(), &self.endpoint(), headers, &body)
            .await?;

        let response: AnthropicResponse = serde_json::from_str(&response_text).map_err(|e| {
            PaletteForgeError::malformed(self.name(), format!("failed to decode response: {e}"))
        })?;

        let content = Self::extract_content(&response);
        if content.is_empty() {
            return Err(PaletteForgeError::malformed(
                self.name(),
                "empty completion content",
            ));
        }

        extract::extract_json(self.name(), &content)
    }

    async fn probe(&self) -> Result<()> {
        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: 1,
            system: None,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: "Hi".to_string(),
            }],
            temperature: None,
        };
        let headers = self.build_headers()?;
        self.client
            .post_json(self.name(), &self.endpoint(), headers, &body)
            .await?;
        Ok(())
    }
}

/// Static credential check shared by construction and `validate_credentials`
fn check_credentials(credentials: &Credentials) -> Result<()> {
    if credentials.api_key.trim().is_empty() {
        return Err(PaletteForgeError::missing_credential(
            "anthropic",
            "api_key",
        ));
    }
    Ok(())
}

/// Anthropic API request format
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Anthropic API message format
#[derive(Debug, Serialize, Clone)]
struct AnthropicMessage {
    role: String,
    content: String,
}

/// Anthropic API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

/// Content block in an Anthropic response
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = AnthropicProvider::new(Credentials::new("test-key")).unwrap();
        assert_eq!(provider.model, DEFAULT_MODEL);
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_provider_with_custom_model() {
        let provider =
            AnthropicProvider::new(Credentials::new("test-key").with_model("claude-3-opus"))
                .unwrap();
        assert_eq!(provider.model, "claude-3-opus");
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = AnthropicProvider::new(Credentials::default()).unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_headers_carry_api_version() {
        let provider = AnthropicProvider::new(Credentials::new("test-key")).unwrap();
        let headers = provider.build_headers().unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "test-key");
        assert_eq!(headers.get("anthropic-version").unwrap(), ANTHROPIC_VERSION);
    }

    #[test]
    fn test_request_uses_system_field() {
        let provider = AnthropicProvider::new(Credentials::new("test-key")).unwrap();
        let request = GenerationRequest::new("autumn leaves").with_num_colors(4);
        let body = provider.build_request(&request);

        assert!(body.system.as_deref().unwrap().contains("4 hex color codes"));
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
        assert_eq!(body.messages[0].content, "autumn leaves");
    }

    #[test]
    fn test_extract_content_skips_non_text_blocks() {
        let response = AnthropicResponse {
            content: vec![
                ContentBlock {
                    block_type: "tool_use".to_string(),
                    text: String::new(),
                },
                ContentBlock {
                    block_type: "text".to_string(),
                    text: "{\"colors\": []}".to_string(),
                },
            ],
        };
        assert_eq!(
            AnthropicProvider::extract_content(&response),
            "{\"colors\": []}"
        );
    }
}
