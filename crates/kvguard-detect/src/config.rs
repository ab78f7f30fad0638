//! Engine configuration

use kvguard_core::{PiiCategory, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Configuration for the detection engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Pattern registry settings
    #[serde(default)]
    pub patterns: PatternConfig,

    /// Semantic detector settings
    #[serde(default)]
    pub semantic: SemanticConfig,
}

impl EngineConfig {
    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }
}

/// Pattern registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Built-in rules to skip
    #[serde(default)]
    pub disabled: Vec<PiiCategory>,

    /// Replacement (or additional) expressions by category
    #[serde(default)]
    pub overrides: BTreeMap<PiiCategory, String>,

    /// Matches whose value matches any of these are never reported
    #[serde(default)]
    pub allowlist: Vec<String>,
}

/// Semantic detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Enable the semantic detector
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with each request
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Hard deadline for one semantic call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Candidates below this confidence are dropped
    #[serde(default)]
    pub min_confidence: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Sent as `HTTP-Referer` for OpenRouter attribution
    #[serde(default)]
    pub app_url: Option<String>,

    /// Sent as `X-Title` for OpenRouter attribution
    #[serde(default = "default_app_title")]
    pub app_title: Option<String>,
}

impl SemanticConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
            min_confidence: 0.0,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            app_url: None,
            app_title: default_app_title(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "x-ai/grok-4-fast:free".to_string()
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_app_title() -> Option<String> {
    Some("KVGuard - Personal Data Detection".to_string())
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.1
}
