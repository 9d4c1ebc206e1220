// src/config/mod.rs

//! Environment-driven OpenRouter configuration.

use std::env;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "openai/gpt-4.1";
const FALLBACK_MODEL: &str = "openai/gpt-4o-mini";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "environment variable OPENROUTER_API_KEY not set; export it before running"
    )]
    MissingApiKey,
}

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub api_key: String,
    pub base_url: String,
    /// Model used first for every call.
    pub default_model: String,
    /// Swapped in after the first retryable failure with the default model.
    pub fallback_model: String,
    /// Optional attribution headers recommended by OpenRouter.
    pub referer: Option<String>,
    pub title: Option<String>,
}

impl SolverConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            api_key,
            base_url: env_or("OPENROUTER_BASE_URL", DEFAULT_BASE_URL),
            default_model: env_or("OPENROUTER_DEFAULT_MODEL", DEFAULT_MODEL),
            fallback_model: env_or("OPENROUTER_FALLBACK_MODEL", FALLBACK_MODEL),
            referer: env::var("OPENROUTER_REFERER").ok(),
            title: env::var("OPENROUTER_TITLE").ok(),
        })
    }

    /// Configuration with defaults for everything but the key; useful for
    /// pointing the client at a stand-in server.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            default_model: DEFAULT_MODEL.into(),
            fallback_model: FALLBACK_MODEL.into(),
            referer: None,
            title: None,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}
