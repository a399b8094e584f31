//! AI Provider Trait
//!
//! This module defines the trait-based abstraction for palette providers,
//! enabling easy integration of multiple AI services (OpenAI, Anthropic,
//! Cohere, HuggingFace, PaLM, Azure OpenAI).

use crate::color;
use crate::error::{PaletteForgeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Default number of colors when the caller does not specify one
pub const DEFAULT_NUM_COLORS: u8 = 5;

/// Lower bound on palette size
pub const MIN_NUM_COLORS: u8 = 2;

/// A palette generation request
///
/// Immutable per invocation; validated by the provider contract before any
/// network call is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Text prompt describing the desired palette
    pub prompt: String,
    /// Number of colors to generate
    pub num_colors: u8,
    /// Additional provider-specific options (scalar values only)
    pub options: HashMap<String, Value>,
}

impl GenerationRequest {
    /// Create a new request with the default color count
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            num_colors: DEFAULT_NUM_COLORS,
            options: HashMap::new(),
        }
    }

    /// Set the number of colors
    pub fn with_num_colors(mut self, num_colors: u8) -> Self {
        self.num_colors = num_colors;
        self
    }

    /// Add a provider-specific option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Validate the request against a provider's capabilities
    ///
    /// Runs before any network call. Empty prompts, out-of-range color
    /// counts, over-long prompts, and non-scalar options all fail here.
    pub fn validate(&self, capabilities: &ProviderCapabilities) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(PaletteForgeError::InvalidRequest(
                "prompt cannot be empty".to_string(),
            ));
        }

        if self.num_colors < MIN_NUM_COLORS || self.num_colors > capabilities.max_colors {
            return Err(PaletteForgeError::InvalidRequest(format!(
                "number of colors must be between {} and {}",
                MIN_NUM_COLORS, capabilities.max_colors
            )));
        }

        if self.prompt.len() > capabilities.max_prompt_length {
            return Err(PaletteForgeError::InvalidRequest(format!(
                "prompt exceeds maximum length of {} bytes",
                capabilities.max_prompt_length
            )));
        }

        if !color::is_valid_provider_options(&self.options) {
            return Err(PaletteForgeError::InvalidRequest(
                "invalid provider options: values must be scalar".to_string(),
            ));
        }

        Ok(())
    }

    /// Instruction sent as the system message to chat-style vendors
    pub fn system_instruction(&self) -> String {
        format!(
            "You are a color palette designer. Respond with a single JSON object with two keys: \
            \"colors\", an array of exactly {} hex color codes (format \"#RRGGBB\"), and \
            \"metadata\", an object with string fields \"theme\", \"mood\" and \"description\". \
            Return only JSON, no prose.",
            self.num_colors
        )
    }

    /// Full prompt for completion-style vendors that take a single text input
    pub fn completion_prompt(&self) -> String {
        format!(
            "Generate a color palette with {} colors based on this description: {}. \
            Respond with a single JSON object with two keys: \"colors\", an array of exactly {} \
            hex color codes (format \"#RRGGBB\"), and \"metadata\", an object with string fields \
            \"theme\", \"mood\" and \"description\". Return only JSON, no prose.",
            self.num_colors, self.prompt, self.num_colors
        )
    }

    /// Read a floating-point option, if present and numeric
    pub fn option_f32(&self, key: &str) -> Option<f32> {
        self.options.get(key).and_then(Value::as_f64).map(|v| v as f32)
    }

    /// Read an integer option, if present and numeric
    pub fn option_u32(&self, key: &str) -> Option<u32> {
        self.options
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }
}

/// Descriptive metadata attached to a generated palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteMetadata {
    /// Palette theme as described by the model
    pub theme: String,
    /// Palette mood as described by the model
    pub mood: String,
    /// Free-text description of the palette
    pub description: String,
    /// Provider key, stamped by the contract (never vendor data)
    pub provider: String,
    /// Model used for generation, if known
    pub model: Option<String>,
    /// Unix timestamp of generation, stamped by the contract
    pub timestamp: i64,
}

/// A generated color palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteResult {
    /// Ordered hex color codes, each matching `#RRGGBB`
    pub colors: Vec<String>,
    /// Palette metadata
    pub metadata: PaletteMetadata,
}

/// Vendor rate limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub requests_per_minute: u32,
    pub tokens_per_minute: u32,
}

/// Static per-vendor capability descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Largest palette the vendor is asked to produce
    pub max_colors: u8,
    /// Whether the vendor API supports streaming responses
    pub supports_streaming: bool,
    /// Whether the vendor API supports batched requests
    pub supports_batch: bool,
    /// Whether the vendor can restyle an existing palette
    pub supports_style_transfer: bool,
    /// Maximum accepted prompt length in bytes
    pub max_prompt_length: usize,
    /// Published rate limits
    pub rate_limit: RateLimit,
}

/// Static descriptor for one credential field, used for UI population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialField {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// Vendor credential bundle
///
/// Supplied once at provider construction and never mutated. `base_url`
/// overrides the vendor endpoint root, which is also how tests point a
/// provider at a mock server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// API key (required by every vendor)
    pub api_key: String,
    /// Organization header value (OpenAI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Endpoint root override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default 30)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Retry budget for retryable HTTP statuses (default 3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Model override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Azure resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    /// Azure deployment ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    /// HuggingFace hosted model ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default retry budget
pub const DEFAULT_MAX_RETRIES: u32 = 3;

impl Credentials {
    /// Create credentials holding just an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Set the organization
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Set the endpoint root override
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout in seconds
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the Azure resource name
    pub fn with_resource_name(mut self, resource_name: impl Into<String>) -> Self {
        self.resource_name = Some(resource_name.into());
        self
    }

    /// Set the Azure deployment ID
    pub fn with_deployment_id(mut self, deployment_id: impl Into<String>) -> Self {
        self.deployment_id = Some(deployment_id.into());
        self
    }

    /// Set the HuggingFace model ID
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Effective timeout in seconds
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Effective retry budget
    pub fn retry_limit(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }
}

/// Trait for palette providers
///
/// Vendor implementations supply request shaping and response parsing via
/// `generate_colors`; the shared request lifecycle (input validation,
/// credential check, result normalization) is a provided method.
#[async_trait]
pub trait AiProvider: Send + Sync + std::fmt::Debug {
    /// Stable provider key (e.g. "openai")
    fn name(&self) -> &str;

    /// Human-readable provider name (e.g. "OpenAI")
    fn display_name(&self) -> &str;

    /// Static capability descriptor
    fn capabilities(&self) -> ProviderCapabilities;

    /// Static credential field descriptors
    fn requirements(&self) -> &'static [CredentialField];

    /// Configured model identifier, if any
    fn model_id(&self) -> Option<&str>;

    /// Check credential field presence without performing I/O
    ///
    /// Reports the first missing required field.
    fn validate_credentials(&self) -> Result<()>;

    /// True iff an API key is present and non-empty. Pure predicate.
    fn is_ready(&self) -> bool;

    /// Vendor hook: perform the HTTP call and return the palette payload
    /// extracted from the vendor response, as loose JSON
    async fn generate_colors(&self, request: &GenerationRequest) -> Result<Value>;

    /// Issue one minimal (max_tokens = 1) request to verify the credentials
    /// actually work against the live API
    async fn probe(&self) -> Result<()>;

    /// Generate a color palette
    ///
    /// Validates the request, delegates to the vendor hook, then normalizes
    /// the payload into a [`PaletteResult`].
    async fn generate_palette(&self, request: &GenerationRequest) -> Result<PaletteResult> {
        request.validate(&self.capabilities())?;
        self.validate_credentials()?;
        let raw = self.generate_colors(request).await?;
        validate_and_format(self.name(), self.model_id(), raw)
    }
}

/// Normalize a vendor palette payload into a [`PaletteResult`]
///
/// The payload must carry a `colors` array of valid hex strings and a
/// `metadata` object with string `theme`, `mood` and `description` fields.
/// `metadata.provider` and `metadata.timestamp` are stamped here, overriding
/// anything the vendor returned for those keys.
pub fn validate_and_format(
    provider: &str,
    model: Option<&str>,
    raw: Value,
) -> Result<PaletteResult> {
    let colors_value = raw
        .get("colors")
        .and_then(Value::as_array)
        .ok_or_else(|| PaletteForgeError::malformed(provider, "missing colors array"))?;

    let mut colors = Vec::with_capacity(colors_value.len());
    for entry in colors_value {
        let code = entry
            .as_str()
            .ok_or_else(|| PaletteForgeError::malformed(provider, "color entry is not a string"))?;
        if !color::is_valid_hex_color(code) {
            return Err(PaletteForgeError::malformed(
                provider,
                format!("invalid color code: {code}"),
            ));
        }
        colors.push(code.to_string());
    }

    let metadata = raw
        .get("metadata")
        .and_then(Value::as_object)
        .ok_or_else(|| PaletteForgeError::malformed(provider, "missing metadata"))?;

    let mut fields = [String::new(), String::new(), String::new()];
    for (slot, name) in fields.iter_mut().zip(["theme", "mood", "description"]) {
        *slot = metadata
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PaletteForgeError::malformed(
                    provider,
                    format!("missing or invalid metadata field: {name}"),
                )
            })?
            .to_string();
    }
    let [theme, mood, description] = fields;

    Ok(PaletteResult {
        colors,
        metadata: PaletteMetadata {
            theme,
            mood,
            description,
            provider: provider.to_string(),
            model: model.map(str::to_string),
            timestamp: chrono::Utc::now().timestamp(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn capabilities() -> ProviderCapabilities {
        ProviderCapabilities {
            max_colors: 10,
            supports_streaming: false,
            supports_batch: false,
            supports_style_transfer: false,
            max_prompt_length: 4000,
            rate_limit: RateLimit {
                requests_per_minute: 60,
                tokens_per_minute: 60_000,
            },
        }
    }

    #[test]
    fn test_request_defaults() {
        let request = GenerationRequest::new("sunset over the ocean");
        assert_eq!(request.num_colors, DEFAULT_NUM_COLORS);
        assert!(request.options.is_empty());
        assert!(request.validate(&capabilities()).is_ok());
    }

    #[test]
    fn test_request_rejects_empty_prompt() {
        let request = GenerationRequest::new("   ");
        let err = request.validate(&capabilities()).unwrap_err();
        assert!(matches!(err, PaletteForgeError::InvalidRequest(_)));
    }

    #[test]
    fn test_request_rejects_out_of_range_color_counts() {
        for n in [0, 1, 11, 200] {
            let request = GenerationRequest::new("forest").with_num_colors(n);
            assert!(
                request.validate(&capabilities()).is_err(),
                "num_colors {n} should be rejected"
            );
        }
        for n in [2, 5, 10] {
            let request = GenerationRequest::new("forest").with_num_colors(n);
            assert!(request.validate(&capabilities()).is_ok());
        }
    }

    #[test]
    fn test_request_rejects_non_scalar_options() {
        let request =
            GenerationRequest::new("forest").with_option("weights", json!([1, 2, 3]));
        assert!(request.validate(&capabilities()).is_err());
    }

    #[test]
    fn test_request_rejects_over_long_prompt() {
        let request = GenerationRequest::new("x".repeat(4001));
        assert!(request.validate(&capabilities()).is_err());
    }

    #[test]
    fn test_option_accessors() {
        let request = GenerationRequest::new("forest")
            .with_option("temperature", 0.4)
            .with_option("max_tokens", 256);
        assert_eq!(request.option_f32("temperature"), Some(0.4));
        assert_eq!(request.option_u32("max_tokens"), Some(256));
        assert_eq!(request.option_f32("missing"), None);
    }

    #[test]
    fn test_credentials_builder() {
        let credentials = Credentials::new("test-key")
            .with_model("gpt-4")
            .with_timeout(10)
            .with_max_retries(1);
        assert_eq!(credentials.api_key, "test-key");
        assert_eq!(credentials.model.as_deref(), Some("gpt-4"));
        assert_eq!(credentials.timeout_secs(), 10);
        assert_eq!(credentials.retry_limit(), 1);
    }

    #[test]
    fn test_credentials_defaults() {
        let credentials = Credentials::new("test-key");
        assert_eq!(credentials.timeout_secs(), DEFAULT_TIMEOUT_SECS);
        assert_eq!(credentials.retry_limit(), DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_validate_and_format_stamps_provider_and_timestamp() {
        let raw = json!({
            "colors": ["#FF0000", "#00FF00", "#0000FF"],
            "metadata": {
                "theme": "bold",
                "mood": "energetic",
                "description": "primary triad",
                "provider": "vendor-supplied",
                "timestamp": 1
            }
        });

        let result = validate_and_format("openai", Some("gpt-4o-mini"), raw).unwrap();
        assert_eq!(result.colors.len(), 3);
        assert_eq!(result.metadata.provider, "openai");
        assert_eq!(result.metadata.model.as_deref(), Some("gpt-4o-mini"));
        let now = chrono::Utc::now().timestamp();
        assert!((now - result.metadata.timestamp).abs() < 5);
    }

    #[test]
    fn test_validate_and_format_rejects_invalid_hex() {
        for bad in ["red", "#12345", "#GGGGGG"] {
            let raw = json!({
                "colors": ["#FF0000", bad],
                "metadata": {"theme": "t", "mood": "m", "description": "d"}
            });
            let err = validate_and_format("openai", None, raw).unwrap_err();
            assert!(
                matches!(err, PaletteForgeError::MalformedResponse { .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_and_format_rejects_missing_colors() {
        let raw = json!({"metadata": {"theme": "t", "mood": "m", "description": "d"}});
        assert!(validate_and_format("openai", None, raw).is_err());

        // A bare array has no colors key either
        let raw = json!(["#FF0000"]);
        assert!(validate_and_format("openai", None, raw).is_err());
    }

    #[test]
    fn test_validate_and_format_rejects_missing_metadata_fields() {
        for missing in ["theme", "mood", "description"] {
            let mut metadata = serde_json::Map::new();
            for name in ["theme", "mood", "description"] {
                if name != missing {
                    metadata.insert(name.to_string(), json!("value"));
                }
            }
            let raw = json!({"colors": ["#FF0000"], "metadata": metadata});
            let err = validate_and_format("openai", None, raw).unwrap_err();
            assert!(err.to_string().contains(missing));
        }
    }
}
