//! HuggingFace Inference API Provider
//!
//! This module implements the AiProvider trait for HuggingFace's hosted
//! inference API. Unlike the chat vendors, the target model is part of the
//! endpoint path, so `model_id` is a required credential field.

use crate::ai::client::HttpClient;
use crate::ai::extract;
use crate::ai::provider::{
    AiProvider, CredentialField, Credentials, GenerationRequest, ProviderCapabilities, RateLimit,
};
use crate::error::{PaletteForgeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HuggingFace inference API base URL
const HUGGINGFACE_API_BASE: &str = "https://api-inference.huggingface.co";

/// Credential fields accepted by this provider
pub(crate) const REQUIREMENTS: &[CredentialField] = &[
    CredentialField {
        name: "api_key",
        required: true,
        description: "HuggingFace API token",
    },
    CredentialField {
        name: "model_id",
        required: true,
        description: "Hosted model ID, e.g. mistralai/Mistral-7B-Instruct-v0.2",
    },
];

/// HuggingFace hosted inference provider
#[derive(Debug)]
pub struct HuggingFaceProvider {
    /// Vendor credentials
    credentials: Credentials,
    /// Hosted model ID (part of the endpoint path)
    model_id: String,
    /// HTTP client for making requests
    client: HttpClient,
}

impl HuggingFaceProvider {
    /// Create a new HuggingFace provider
    pub fn new(credentials: Credentials) -> Result<Self> {
        check_credentials(&credentials)?;
        let client = HttpClient::for_credentials(&credentials)?;
        let model_id = credentials
            .model_id
            .clone()
            .unwrap_or_default();
        Ok(Self {
            credentials,
            model_id,
            client,
        })
    }

    /// Model inference endpoint, honoring a base URL override
    fn endpoint(&self) -> String {
        let base = self
            .credentials
            .base_url
            .as_deref()
            .unwrap_or(HUGGINGFACE_API_BASE);
        format!("{}/models/{}", base.trim_end_matches('/'), self.model_id)
    }

    /// Shape a generation request into the inference body
    fn build_request(&self, request: &GenerationRequest) -> HuggingFaceRequest {
        HuggingFaceRequest {
            inputs: request.completion_prompt(),
            parameters: HuggingFaceParameters {
                max_new_tokens: request.option_u32("max_tokens").unwrap_or(512),
                temperature: request.option_f32("temperature").unwrap_or(0.7),
                return_full_text: false,
            },
        }
    }
}

#[async_trait]
impl AiProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn display_name(&self) -> &str {
        "HuggingFace"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_colors: 10,
            supports_streaming: false,
            supports_batch: false,
            supports_style_transfer: false,
            max_prompt_length: 2000,
            rate_limit: RateLimit {
                requests_per_minute: 60,
                tokens_per_minute: 10_000,
            },
        }
    }

    fn requirements(&self) -> &'static [CredentialField] {
        REQUIREMENTS
    }

    fn model_id(&self) -> Option<&str> {
        Some(&self.model_id)
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

        // The inference API answers with an array of generated sequences
        let response: Vec<HuggingFaceGeneration> =
            serde_json::from_str(&response_text).map_err(|e| {
                PaletteForgeError::malformed(
                    self.name(),
                    format!("failed to decode response: {e}"),
                )
            })?;

        let text = response
            .first()
            .map(|generation| generation.generated_text.as_str())
            .ok_or_else(|| PaletteForgeError::malformed(self.name(), "empty generation array"))?;

        extract::extract_json(self.name(), text)
    }

    async fn probe(&self) -> Result<()> {
        let body = HuggingFaceRequest {
            inputs: "Hi".to_string(),
            parameters: HuggingFaceParameters {
                max_new_tokens: 1,
                temperature: 0.1,
                return_full_text: false,
            },
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
        return Err(PaletteForgeError::missing_credential(
            "huggingface",
            "api_key",
        ));
    }
    if credentials
        .model_id
        .as_deref()
        .unwrap_or("")
        .trim()
        .is_empty()
    {
        return Err(PaletteForgeError::missing_credential(
            "huggingface",
            "model_id",
        ));
    }
    Ok(())
}

/// HuggingFace inference request format
#[derive(Debug, Serialize)]
struct HuggingFaceRequest {
    inputs: String,
    parameters: HuggingFaceParameters,
}

/// Generation parameters
#[derive(Debug, Serialize)]
struct HuggingFaceParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
}

/// One generated sequence in a HuggingFace response
#[derive(Debug, Deserialize)]
struct HuggingFaceGeneration {
    generated_text: String,
}
