//! Provider Factory
//!
//! Maps a vendor key to a concrete provider implementation and constructs it
//! from a credential bundle.

use crate::ai::provider::{AiProvider, CredentialField, Credentials};
use crate::ai::providers::{anthropic, azure, cohere, huggingface, openai, palm};
use crate::error::{PaletteForgeError, Result};
use tracing::debug;

/// Known vendor kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic Claude messages
    Anthropic,
    /// Cohere generate
    Cohere,
    /// HuggingFace hosted inference
    HuggingFace,
    /// Google PaLM text generation
    Palm,
    /// Azure-hosted OpenAI deployments
    AzureOpenAi,
}

impl ProviderKind {
    /// All known kinds, in display order
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Cohere,
        ProviderKind::HuggingFace,
        ProviderKind::Palm,
        ProviderKind::AzureOpenAi,
    ];

    /// Parse a vendor key, case-insensitively
    pub fn parse(kind: &str) -> Result<Self> {
        match kind.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "cohere" => Ok(ProviderKind::Cohere),
            "huggingface" => Ok(ProviderKind::HuggingFace),
            "palm" => Ok(ProviderKind::Palm),
            "azure" | "azure-openai" => Ok(ProviderKind::AzureOpenAi),
            _ => Err(PaletteForgeError::UnknownProvider(kind.to_string())),
        }
    }

    /// Stable provider key
    pub fn key(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Cohere => "cohere",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Palm => "palm",
            ProviderKind::AzureOpenAi => "azure",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Cohere => "Cohere",
            ProviderKind::HuggingFace => "HuggingFace",
            ProviderKind::Palm => "PaLM",
            ProviderKind::AzureOpenAi => "Azure OpenAI",
        }
    }

    /// Static credential requirements for this kind
    pub fn requirements(&self) -> &'static [CredentialField] {
        match self {
            ProviderKind::OpenAi => openai::REQUIREMENTS,
            ProviderKind::Anthropic => anthropic::REQUIREMENTS,
            ProviderKind::Cohere => cohere::REQUIREMENTS,
            ProviderKind::HuggingFace => huggingface::REQUIREMENTS,
            ProviderKind::Palm => palm::REQUIREMENTS,
            ProviderKind::AzureOpenAi => azure::REQUIREMENTS,
        }
    }
}

/// Static description of an available provider, used for UI population
#[derive(Debug, Clone, Copy)]
pub struct ProviderInfo {
    pub key: &'static str,
    pub display_name: &'static str,
    pub requirements: &'static [CredentialField],
}

/// Provider factory
pub struct ProviderFactory;

impl ProviderFactory {
    /// Construct a provider from a vendor key and credentials
    ///
    /// The key lookup is case-insensitive. Unknown keys fail with
    /// [`PaletteForgeError::UnknownProvider`]; construction failures are
    /// wrapped in [`PaletteForgeError::ProviderCreation`] carrying the
    /// underlying message.
    pub fn create(kind: &str, credentials: Credentials) -> Result<Box<dyn AiProvider>> {
        let kind = ProviderKind::parse(kind)?;
        Self::create_kind(kind, credentials)
    }

    /// Construct a provider from an already-parsed kind
    pub fn create_kind(kind: ProviderKind, credentials: Credentials) -> Result<Box<dyn AiProvider>> {
        debug!(provider = kind.key(), "constructing provider");
        let wrap = |e: PaletteForgeError| PaletteForgeError::ProviderCreation {
            provider: kind.key().to_string(),
            message: e.to_string(),
        };

        let provider: Box<dyn AiProvider> = match kind {
            ProviderKind::OpenAi => Box::new(openai::OpenAiProvider::new(credentials).map_err(wrap)?),
            ProviderKind::Anthropic => {
                Box::new(anthropic::AnthropicProvider::new(credentials).map_err(wrap)?)
            }
            ProviderKind::Cohere => Box::new(cohere::CohereProvider::new(credentials).map_err(wrap)?),
            ProviderKind::HuggingFace => {
                Box::new(huggingface::HuggingFaceProvider::new(credentials).map_err(wrap)?)
            }
            ProviderKind::Palm => Box::new(palm::PalmProvider::new(credentials).map_err(wrap)?),
            ProviderKind::AzureOpenAi => {
                Box::new(azure::AzureOpenAiProvider::new(credentials).map_err(wrap)?)
            }
        };

        Ok(provider)
    }

    /// Static table of all known providers and their credential requirements
    pub fn available_providers() -> Vec<ProviderInfo> {
        ProviderKind::ALL
            .iter()
            .map(|kind| ProviderInfo {
                key: kind.key(),
                display_name: kind.display_name(),
                requirements: kind.requirements(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(ProviderKind::parse("OPENAI").unwrap(), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::parse("openai").unwrap(), ProviderKind::OpenAi);
        assert_eq!(
            ProviderKind::parse("Anthropic").unwrap(),
            ProviderKind::Anthropic
        );
        assert_eq!(
            ProviderKind::parse("azure-openai").unwrap(),
            ProviderKind::AzureOpenAi
        );
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        let err = ProviderKind::parse("not-a-real-vendor").unwrap_err();
        assert!(matches!(err, PaletteForgeError::UnknownProvider(_)));
        assert!(err.to_string().contains("not-a-real-vendor"));
    }

    #[test]
    fn test_create_returns_named_provider() {
        let provider = ProviderFactory::create("OPENAI", Credentials::new("test-key")).unwrap();
        assert_eq!(provider.name(), "openai");

        let provider = ProviderFactory::create("openai", Credentials::new("test-key")).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_create_wraps_construction_failure() {
        let err = ProviderFactory::create("openai", Credentials::default()).unwrap_err();
        match err {
            PaletteForgeError::ProviderCreation { provider, message } => {
                assert_eq!(provider, "openai");
                assert!(message.contains("api_key"));
            }
            other => panic!("expected ProviderCreation, got {other:?}"),
        }
    }

    #[test]
    fn test_available_providers_lists_all_six() {
        let providers = ProviderFactory::available_providers();
        assert_eq!(providers.len(), 6);

        let keys: Vec<_> = providers.iter().map(|p| p.key).collect();
        assert_eq!(
            keys,
            vec!["openai", "anthropic", "cohere", "huggingface", "palm", "azure"]
        );

        for info in providers {
            assert!(info
                .requirements
                .iter()
                .any(|field| field.name == "api_key" && field.required));
        }
    }
}
