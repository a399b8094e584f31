//! Error types for Palette-Forge
//!
//! Every failure in the crate maps into one of the variants below, so callers
//! can distinguish "the vendor was unreachable" from "the vendor answered but
//! not usefully" without matching on vendor-specific types.

use thiserror::Error;

/// Result type alias for Palette-Forge
pub type Result<T> = std::result::Result<T, PaletteForgeError>;

/// Main error type for Palette-Forge
#[derive(Error, Debug)]
pub enum PaletteForgeError {
    /// Request validation failures, detected before any network call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A required credential field is absent or empty
    #[error("{provider}: missing required credential field `{field}`")]
    MissingCredential { provider: String, field: String },

    /// Connection-level failure (DNS, timeout, refused connection)
    #[error("Transport error from {provider}: {message}")]
    Transport { provider: String, message: String },

    /// The vendor answered with a non-2xx status
    #[error("{provider} API error (status {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// The vendor answered 2xx but the body could not be turned into a palette
    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },

    /// Factory lookup failure
    #[error("Unknown provider type: {0}")]
    UnknownProvider(String),

    /// Factory construction failure, wrapping the underlying cause
    #[error("Failed to construct provider {provider}: {message}")]
    ProviderCreation { provider: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PaletteForgeError {
    /// Shorthand for a malformed-response error
    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a missing-credential error
    pub fn missing_credential(provider: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingCredential {
            provider: provider.into(),
            field: field.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_display_names_field() {
        let err = PaletteForgeError::missing_credential("azure", "deployment_id");
        assert!(err.to_string().contains("deployment_id"));
        assert!(err.to_string().contains("azure"));
    }

    #[test]
    fn test_api_error_display_carries_status() {
        let err = PaletteForgeError::Api {
            provider: "openai".to_string(),
            status: 429,
            message: "rate limited".to_string(),
        };
        assert!(err.to_string().contains("429"));
    }
}
