//! Azure OpenAI Provider
//!
//! This module implements the AiProvider trait for Azure-hosted OpenAI
//! deployments. The endpoint is derived from the resource name and
//! deployment ID, and authentication uses the `api-key` header instead of a
//! bearer token.

use crate::ai::client::HttpClient;
use crate::ai::extract;
use crate::ai::provider::{
    AiProvider, CredentialField, Credentials, GenerationRequest, ProviderCapabilities, RateLimit,
};
use crate::error::{PaletteForgeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API version pinned in the query string
const AZURE_API_VERSION: &str = "2023-05-15";

/// Default model label in request bodies
const DEFAULT_MODEL: &str = "gpt-4";

/// Credential fields accepted by this provider
pub(crate) const REQUIREMENTS: &[CredentialField] = &[
    CredentialField {
        name: "api_key",
        required: true,
        description: "Azure OpenAI API key",
    },
    CredentialField {
        name: "resource_name",
        required: true,
        description: "Azure OpenAI resource name (forms the endpoint host)",
    },
    CredentialField {
        name: "deployment_id",
        required: true,
        description: "Azure OpenAI deployment ID",
    },
    CredentialField {
        name: "model",
        required: false,
        description: "Model label sent in request bodies (defaults to gpt-4)",
    },
];

/// Azure OpenAI deployments provider
#[derive(Debug)]
pub struct AzureOpenAiProvider {
    /// Vendor credentials
    credentials: Credentials,
    /// Model label for request bodies
    model: String,
    /// HTTP client for making requests
    client: HttpClient,
}

impl AzureOpenAiProvider {
    /// Create a new Azure OpenAI provider
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

    /// Deployment chat-completions endpoint
    ///
    /// `base_url` overrides the `https://{resource}.openai.azure.com` root
    /// when present.
    fn endpoint(&self) -> String {
        let root = match self.credentials.base_url.as_deref() {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}.openai.azure.com",
                self.credentials.resource_name.as_deref().unwrap_or("")
            ),
        };
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            root,
            self.credentials.deployment_id.as_deref().unwrap_or(""),
            AZURE_API_VERSION
        )
    }

    /// Build headers for the Azure OpenAI API
    fn build_headers(&self) -> Result<reqwest::header::HeaderMap> {
        HttpClient::custom_auth_headers("api-key", &self.credentials.api_key)
    }

    /// Shape a generation request into the chat-completions body
    fn build_request(&self, request: &GenerationRequest) -> AzureRequest {
        AzureRequest {
            model: self.model.clone(),
            messages: vec![
                AzureMessage {
                    role: "system".to_string(),
                    content: request.system_instruction(),
                },
                AzureMessage {
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
impl AiProvider for AzureOpenAiProvider {
    fn name(&self) -> &str {
        "azure"
    }

    fn display_name(&self) -> &str {
        "Azure OpenAI"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_colors: 10,
            supports_streaming: true,
            supports_batch: true,
            supports_style_transfer: false,
            max_prompt_length: 4000,
            rate_limit: RateLimit {
                requests_per_minute: 2400,
                tokens_per_minute: 120_000,
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

        let response: AzureResponse = serde_json::from_str(&response_text).map_err(|e| {
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
        let body = AzureRequest {
            model: self.model.clone(),
            messages: vec![AzureMessage {
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
///
/// `resource_name` is only required when no base URL override supplies the
/// endpoint root.
fn check_credentials(credentials: &Credentials) -> Result<()> {
    if credentials.api_key.trim().is_empty() {
        return Err(PaletteForgeError::missing_credential("azure", "api_key"));
    }
    let has_resource = credentials
        .resource_name
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty());
    if credentials.base_url.is_none() && !has_resource {
        return Err(PaletteForgeError::missing_credential(
            "azure",
            "resource_name",
        ));
    }
    if credentials
        .deployment_id
        .as_deref()
        .unwrap_or("")
        .trim()
        .is_empty()
    {
        return Err(PaletteForgeError::missing_credential(
            "azure",
            "deployment_id",
        ));
    }
    Ok(())
}

/// Azure OpenAI request format
#[derive(Debug, Serialize)]
struct AzureRequest {
    model: String,
    messages: Vec<AzureMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Message format
#[derive(Debug, Serialize, Clone)]
struct AzureMessage {
    role: String,
    content: String,
}

/// Azure OpenAI response format (OpenAI-compatible)
#[derive(Debug, Deserialize)]
struct AzureResponse {
    choices: Vec<AzureChoice>,
}

/// Choice in a response
#[derive(Debug, Deserialize)]
struct AzureChoice {
    message: AzureChoiceMessage,
}

/// Message in a response
#[derive(Debug, Deserialize)]
struct AzureChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("test-key")
            .with_resource_name("acme-colors")
            .with_deployment_id("gpt4-palette")
    }

    #[test]
    fn test_provider_creation() {
        let provider = AzureOpenAiProvider::new(credentials()).unwrap();
        assert_eq!(provider.name(), "azure");
        assert_eq!(provider.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let err = AzureOpenAiProvider::new(Credentials::default()).unwrap_err();
        assert!(err.to_string().contains("api_key"));

        let err = AzureOpenAiProvider::new(Credentials::new("k")).unwrap_err();
        assert!(err.to_string().contains("resource_name"));

        let err =
            AzureOpenAiProvider::new(Credentials::new("k").with_resource_name("r")).unwrap_err();
        assert!(err.to_string().contains("deployment_id"));
    }

    #[test]
    fn test_endpoint_from_resource_and_deployment() {
        let provider = AzureOpenAiProvider::new(credentials()).unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://acme-colors.openai.azure.com/openai/deployments/gpt4-palette/chat/completions?api-version=2023-05-15"
        );
    }

    #[test]
    fn test_base_url_override_replaces_resource_root() {
        let provider = AzureOpenAiProvider::new(
            Credentials::new("test-key")
                .with_base_url("http://localhost:9000")
                .with_deployment_id("gpt4-palette"),
        )
        .unwrap();
        assert!(provider
            .endpoint()
            .starts_with("http://localhost:9000/openai/deployments/gpt4-palette/"));
    }

    #[test]
    fn test_api_key_header() {
        let provider = AzureOpenAiProvider::new(credentials()).unwrap();
        let headers = provider.build_headers().unwrap();
        assert_eq!(headers.get("api-key").unwrap(), "test-key");
        assert!(headers.get("authorization").is_none());
    }
}
