//! OpenAI API Provider
//!
//! This module implements the AiProvider trait for OpenAI's chat-completions API.

use crate::ai::client::HttpClient;
use crate::ai::extract;
use crate::ai::provider::{
    AiProvider, CredentialField, Credentials, GenerationRequest, ProviderCapabilities, RateLimit,
};
use crate::error::{PaletteForgeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAI API base URL
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Default model
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Credential fields accepted by this provider
pub(crate) const REQUIREMENTS: &[CredentialField] = &[
    CredentialField {
        name: "api_key",
        required: true,
        description: "OpenAI API key",
    },
    CredentialField {
        name: "organization",
        required: false,
        description: "OpenAI organization ID sent as the OpenAI-Organization header",
    },
    CredentialField {
        name: "model",
        required: false,
        description: "Chat model to use (defaults to gpt-4o-mini)",
    },
];

/// OpenAI chat-completions provider
#[derive(Debug)]
pub struct OpenAiProvider {
    /// Vendor credentials
    credentials: Credentials,
    /// Model to use (e.g. "gpt-4o", "gpt-4o-mini")
    model: String,
    /// HTTP client for making requests
    client: HttpClient,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
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

    /// Chat-completions endpoint, honoring a base URL override
    fn endpoint(&self) -> String {
        let base = self
            .credentials
            .base_url
            .as_deref()
            .unwrap_or(OPENAI_API_BASE);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    /// Build headers for the OpenAI API
    fn build_headers(&self) -> Result<reqwest::header::HeaderMap> {
        let mut headers = HttpClient::bearer_headers(&self.credentials.api_key)?;
        if let Some(organization) = &self.credentials.organization {
            headers.insert(
                HttpClient::header_name("OpenAI-Organization")?,
                HttpClient::header_value(organization)?,
            );
        }
        Ok(headers)
    }

    /// Shape a generation request into the chat-completions body
    fn build_request(&self, request: &GenerationRequest) -> OpenAiRequest {
        OpenAiRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAiMessage {
                    role: "system".to_string(),
                    content: request.system_instruction(),
                },
                OpenAiMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            max_tokens: Some(request.option_u32("max_tokens").unwrap_or(1024)),
            temperature: Some(request.option_f32("temperature").unwrap_or(0.7)),
        }
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn display_name(&self) -> &str {
        "OpenAI"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_colors: 10,
            supports_streaming: true,
            supports_batch: true,
            supports_style_transfer: true,
            max_prompt_length: 4000,
            rate_limit: RateLimit {
                requests_per_minute: 3500,
                tokens_per_minute: 90_000,
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

        let response: OpenAiResponse = serde_json::from_str(&response_text).map_err(|e| {
            PaletteForgeError::malformed(self.name(), format!("failed to decode response: {e}"))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                PaletteForgeError::malformed(self.name(), "missing completion content")
            })?;

        extract::extract_json(self.name(), &content)
    }

    async fn probe(&self) -> Result<()> {
        let body = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: "Hi".to_string(),
            }],
            max_tokens: Some(1),
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
        return Err(PaletteForgeError::missing_credential("openai", "api_key"));
    }
    Ok(())
}

/// OpenAI API request format
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// OpenAI API message format
#[derive(Debug, Serialize, Clone)]
struct OpenAiMessage {
    role: String,
    content: String,
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

/// Choice in an OpenAI response
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

/// Message in an OpenAI response
#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<String>,
}
