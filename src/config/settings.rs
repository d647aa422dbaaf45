use crate::view::conversation::TurnPolicy;
use crate::view::poller::PollConfig;
use anyhow::{ensure, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

pub const BASE_URL_VAR: &str = "CLIENT_BASE_URL";
pub const API_KEY_VAR: &str = "CLIENT_API_KEY";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_KEY: &str = "API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub store: StoreSettings,
    pub polling: PollConfig,
    pub view: ViewSettings,
    pub model: ModelSettings,
    pub page: PageSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Per-request timeout; 0 leaves it to the HTTP layer
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSettings {
    pub local_role: String,
    pub turn_policy: TurnPolicy,
}

/// Generation parameters shown in the settings panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    pub model: String,
    pub models: Vec<String>,
    pub tools: Vec<String>,
    pub available_tools: Vec<String>,
    pub custom_mode: bool,
    pub sampling: bool,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub random_seed: u32,
    pub repetition_penalty: f32,
    pub min_new_tokens: u32,
    pub max_new_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSettings {
    pub title: String,
    pub caption: String,
    pub welcome: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Everything needed to build a store client
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreSettings {
                request_timeout_secs: 30,
            },
            polling: PollConfig::default(),
            view: ViewSettings {
                local_role: "assistant".to_string(),
                turn_policy: TurnPolicy::LastRole,
            },
            model: ModelSettings::default(),
            page: PageSettings {
                title: "💬 Chat".to_string(),
                caption: "Powered by OpenRouter".to_string(),
                welcome: "Welcome to our AI system! Meet your personal travel agent 🪄 ✨!"
                    .to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "deepseek/deepseek-r1".to_string(),
            models: vec![
                "deepseek/deepseek-r1".to_string(),
                "google/gemini-2.0-flash-exp".to_string(),
            ],
            tools: vec!["Web Search".to_string()],
            available_tools: vec![
                "Deep Research".to_string(),
                "Web Search".to_string(),
                "Computer Use".to_string(),
            ],
            custom_mode: false,
            sampling: true,
            temperature: 0.6,
            top_p: 0.9,
            top_k: 50,
            random_seed: 0,
            repetition_penalty: 1.0,
            min_new_tokens: 0,
            max_new_tokens: 1024,
        }
    }
}

impl ModelSettings {
    pub const MAX_NEW_TOKENS_LIMIT: u32 = 16384;

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.models.contains(&self.model),
            "model '{}' is not one of {:?}",
            self.model,
            self.models
        );
        for tool in &self.tools {
            ensure!(
                self.available_tools.contains(tool),
                "tool '{}' is not one of {:?}",
                tool,
                self.available_tools
            );
        }
        ensure!(
            (0.0..=2.0).contains(&self.temperature),
            "temperature must be within 0.0..=2.0, got {}",
            self.temperature
        );
        ensure!(
            (0.0..=1.0).contains(&self.top_p),
            "top_p must be within 0.0..=1.0, got {}",
            self.top_p
        );
        ensure!(self.top_k <= 100, "top_k must be at most 100, got {}", self.top_k);
        ensure!(
            (1.0..=2.0).contains(&self.repetition_penalty),
            "repetition_penalty must be within 1.0..=2.0, got {}",
            self.repetition_penalty
        );
        ensure!(
            self.min_new_tokens <= self.max_new_tokens,
            "min_new_tokens ({}) exceeds max_new_tokens ({})",
            self.min_new_tokens,
            self.max_new_tokens
        );
        ensure!(
            self.max_new_tokens <= Self::MAX_NEW_TOKENS_LIMIT,
            "max_new_tokens must be at most {}, got {}",
            Self::MAX_NEW_TOKENS_LIMIT,
            self.max_new_tokens
        );
        Ok(())
    }
}

impl Settings {
    /// Compiled defaults, then `config/{CONFIG_ENV}`, then `APP__*` variables
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());
        Self::build(File::with_name(&format!("config/{}", config_env)).required(false))
    }

    /// Like `new`, but reads an explicit settings file that must exist
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Store credentials from the environment, falling back to development defaults
    pub fn store_config(&self) -> StoreConfig {
        let (base_url, api_key) = credentials_from(|key| env::var(key).ok());
        StoreConfig {
            base_url,
            api_key,
            request_timeout_secs: self.store.request_timeout_secs,
        }
    }
}

/// Both variables must be set; otherwise both fall back together.
pub fn credentials_from(lookup: impl Fn(&str) -> Option<String>) -> (String, String) {
    let base_url = lookup(BASE_URL_VAR).filter(|v| !v.is_empty());
    let api_key = lookup(API_KEY_VAR).filter(|v| !v.is_empty());

    match (base_url, api_key) {
        (Some(base_url), Some(api_key)) => (base_url, api_key),
        _ => {
            tracing::warn!(
                "{} or {} not set, using development store at {}",
                BASE_URL_VAR,
                API_KEY_VAR,
                DEFAULT_BASE_URL
            );
            (DEFAULT_BASE_URL.to_string(), DEFAULT_API_KEY.to_string())
        }
    }
}
