//! Configuration module
//!
//! This module handles configuration management: API key storage, model
//! overrides, environment overlay, and credential assembly for the factory.

pub mod storage;

use crate::ai::provider::Credentials;
use crate::ai::ProviderKind;
use crate::error::{PaletteForgeError, Result};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Environment variable carrying the API key for each provider
fn api_key_env_var(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi => "OPENAI_API_KEY",
        ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        ProviderKind::Cohere => "COHERE_API_KEY",
        ProviderKind::HuggingFace => "HUGGINGFACE_API_KEY",
        ProviderKind::Palm => "PALM_API_KEY",
        ProviderKind::AzureOpenAi => "AZURE_OPENAI_API_KEY",
    }
}

/// Application settings
pub struct Settings {
    /// API keys per provider
    pub api_keys: HashMap<String, String>,
    /// Model overrides per provider
    pub models: HashMap<String, String>,
    /// Currently selected provider
    pub current_provider: Option<String>,
}

impl Settings {
    /// Create new settings, loading from disk if available
    pub fn new() -> Self {
        match storage::Config::load() {
            Ok(config) => Self::from_config(config),
            Err(_) => Self {
                api_keys: HashMap::new(),
                models: storage::Config::default_models(),
                current_provider: None,
            },
        }
    }

    /// Build settings from a loaded configuration
    pub fn from_config(config: storage::Config) -> Self {
        Self {
            api_keys: config.api_keys,
            models: config.models,
            current_provider: config.current_provider,
        }
    }

    /// Overlay API keys from the environment
    ///
    /// Loads `.env` if present, then applies the per-provider key variables
    /// (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, ...). Environment values win
    /// over file values.
    pub fn apply_env(&mut self) {
        dotenv::dotenv().ok();

        for kind in ProviderKind::ALL {
            if let Ok(key) = env::var(api_key_env_var(kind)) {
                if !key.is_empty() {
                    self.api_keys.insert(kind.key().to_string(), key);
                }
            }
        }
    }

    /// Store an API key for a provider
    ///
    /// The first configured provider becomes the current one.
    pub fn set_api_key(&mut self, provider: String, key: String) {
        self.api_keys.insert(provider.clone(), key);
        if self.current_provider.is_none() {
            self.current_provider = Some(provider);
        }
    }

    /// Get the API key for a provider
    pub fn get_api_key(&self, provider: &str) -> Option<&String> {
        self.api_keys.get(provider)
    }

    /// Set the model for a provider
    pub fn set_model(&mut self, provider: String, model: String) {
        self.models.insert(provider, model);
    }

    /// Get the model for a provider
    pub fn get_model(&self, provider: &str) -> Option<String> {
        self.models.get(provider).cloned()
    }

    /// Remove the model override for a provider
    pub fn remove_model(&mut self, provider: &str) {
        self.models.remove(provider);
    }

    /// Set the current provider
    pub fn set_current_provider(&mut self, provider: String) {
        self.current_provider = Some(provider);
    }

    /// Get the current provider
    pub fn get_current_provider(&self) -> Option<&String> {
        self.current_provider.as_ref()
    }

    /// List all providers with a configured API key
    pub fn list_providers(&self) -> Vec<String> {
        self.api_keys.keys().cloned().collect()
    }

    /// Assemble a credential bundle for a provider
    ///
    /// Pulls the API key and model from the settings; Azure's resource name
    /// and deployment ID come from `AZURE_OPENAI_RESOURCE_NAME` and
    /// `AZURE_OPENAI_DEPLOYMENT_ID` since they are deployment-specific.
    pub fn credentials_for(&self, kind: ProviderKind) -> Result<Credentials> {
        let api_key = self.get_api_key(kind.key()).ok_or_else(|| {
            PaletteForgeError::Config(format!(
                "no API key configured for provider {}",
                kind.key()
            ))
        })?;

        let mut credentials = Credentials::new(api_key);

        if let Some(model) = self.get_model(kind.key()) {
            credentials = match kind {
                // HuggingFace's model is a credential, not a body field
                ProviderKind::HuggingFace => credentials.with_model_id(model),
                _ => credentials.with_model(model),
            };
        }

        if kind == ProviderKind::AzureOpenAi {
            if let Ok(resource) = env::var("AZURE_OPENAI_RESOURCE_NAME") {
                credentials = credentials.with_resource_name(resource);
            }
            if let Ok(deployment) = env::var("AZURE_OPENAI_DEPLOYMENT_ID") {
                credentials = credentials.with_deployment_id(deployment);
            }
        }

        Ok(credentials)
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        let config = storage::Config {
            api_keys: self.api_keys.clone(),
            models: self.models.clone(),
            current_provider: self.current_provider.clone(),
        };
        config.save()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared application settings
pub type SharedSettings = Arc<RwLock<Settings>>;

/// Create new shared settings, loading from disk if available
pub fn create_shared_settings() -> SharedSettings {
    Arc::new(RwLock::new(Settings::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_settings() -> Settings {
        Settings {
            api_keys: HashMap::new(),
            models: storage::Config::default_models(),
            current_provider: None,
        }
    }

    #[test]
    fn test_first_api_key_selects_current_provider() {
        let mut settings = empty_settings();
        settings.set_api_key("anthropic".to_string(), "sk-ant-test".to_string());
        assert_eq!(
            settings.get_current_provider(),
            Some(&"anthropic".to_string())
        );

        settings.set_api_key("openai".to_string(), "sk-test".to_string());
        assert_eq!(
            settings.get_current_provider(),
            Some(&"anthropic".to_string())
        );
    }

    #[test]
    fn test_credentials_for_uses_stored_key_and_model() {
        let mut settings = empty_settings();
        settings.set_api_key("openai".to_string(), "sk-test".to_string());
        settings.set_model("openai".to_string(), "gpt-4o".to_string());

        let credentials = settings.credentials_for(ProviderKind::OpenAi).unwrap();
        assert_eq!(credentials.api_key, "sk-test");
        assert_eq!(credentials.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_credentials_for_huggingface_maps_model_to_model_id() {
        let mut settings = empty_settings();
        settings.set_api_key("huggingface".to_string(), "hf-test".to_string());

        let credentials = settings.credentials_for(ProviderKind::HuggingFace).unwrap();
        assert!(credentials.model.is_none());
        assert_eq!(
            credentials.model_id.as_deref(),
            Some("mistralai/Mistral-7B-Instruct-v0.2")
        );
    }

    #[test]
    fn test_credentials_for_unconfigured_provider_fails() {
        let settings = empty_settings();
        let err = settings.credentials_for(ProviderKind::Cohere).unwrap_err();
        assert!(matches!(err, PaletteForgeError::Config(_)));
    }
}
