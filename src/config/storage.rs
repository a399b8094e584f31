//! Configuration Storage
//!
//! Persistent storage of per-provider settings: API keys, model overrides,
//! and the currently selected provider.

use crate::error::{PaletteForgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Persistent configuration data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API keys per provider
    pub api_keys: HashMap<String, String>,
    /// Model overrides per provider
    pub models: HashMap<String, String>,
    /// Currently selected provider
    pub current_provider: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: HashMap::new(),
            models: Self::default_models(),
            current_provider: None,
        }
    }
}

impl Config {
    /// Default models for each provider
    pub fn default_models() -> HashMap<String, String> {
        let mut models = HashMap::new();

        models.insert("openai".to_string(), "gpt-4o-mini".to_string());
        models.insert(
            "anthropic".to_string(),
            "claude-3-5-sonnet-20241022".to_string(),
        );
        models.insert("cohere".to_string(), "command".to_string());
        models.insert(
            "huggingface".to_string(),
            "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
        );
        models.insert("palm".to_string(), "text-bison-001".to_string());
        models.insert("azure".to_string(), "gpt-4".to_string());

        models
    }

    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the configuration directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                PaletteForgeError::Config("could not find configuration directory".to_string())
            })?
            .join("palette-forge");

        fs::create_dir_all(&config_dir)?;

        Ok(config_dir)
    }

    /// Get the configuration file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file()?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            PaletteForgeError::Config(format!("failed to parse config file: {e}"))
        })?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            PaletteForgeError::Config(format!("failed to serialize config: {e}"))
        })?;

        fs::write(path, content)?;

        Ok(())
    }

    /// Get the model for a provider
    pub fn get_model(&self, provider: &str) -> Option<String> {
        self.models.get(provider).cloned()
    }

    /// Set the model for a provider
    pub fn set_model(&mut self, provider: String, model: String) {
        self.models.insert(provider, model);
    }

    /// Set the API key for a provider
    pub fn set_api_key(&mut self, provider: String, key: String) {
        self.api_keys.insert(provider, key);
    }

    /// Get the API key for a provider
    pub fn get_api_key(&self, provider: &str) -> Option<&String> {
        self.api_keys.get(provider)
    }

    /// List all configured providers
    pub fn list_providers(&self) -> Vec<String> {
        self.api_keys.keys().cloned().collect()
    }
}
