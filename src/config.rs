//! Configuration management for the diligence pipeline.
//!
//! Configuration is set via environment variables:
//! - `OPENROUTER_API_KEY` - Required. Your OpenRouter API key.
//! - `MODEL_LOW` - Optional. Model for low-complexity agents. Defaults to `openai/gpt-5-mini`.
//! - `MODEL_STANDARD` - Optional. Model for standard agents. Defaults to `anthropic/claude-sonnet-4.5`.
//! - `MODEL_HIGH` - Optional. Model for synthesis agents. Defaults to `anthropic/claude-opus-4.1`.
//! - `AGENT_TIMEOUT_MS` - Optional. Default per-agent timeout. Defaults to `120000`.
//! - `MAX_TIER_CONCURRENCY` - Optional. Max in-flight agents within a tier. Defaults to `8`.
//! - `PIPELINE_DEADLINE_MS` - Optional. Overall run deadline. No deadline if unset.
//! - `TEMPERATURE` - Optional. Default sampling temperature. Defaults to `0.2`.

use thiserror::Error;

use crate::llm::ModelMap;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenRouter API key
    pub api_key: String,

    /// Model ids per complexity tier
    pub models: ModelMap,

    /// Default per-agent timeout in milliseconds
    pub agent_timeout_ms: u64,

    /// Maximum number of agents running concurrently within one tier
    pub max_tier_concurrency: usize,

    /// Optional overall pipeline deadline in milliseconds
    pub pipeline_deadline_ms: Option<u64>,

    /// Default sampling temperature for reasoning calls
    pub temperature: f64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;

        let defaults = ModelMap::default();
        let models = ModelMap {
            low: std::env::var("MODEL_LOW").unwrap_or(defaults.low),
            standard: std::env::var("MODEL_STANDARD").unwrap_or(defaults.standard),
            high: std::env::var("MODEL_HIGH").unwrap_or(defaults.high),
        };

        let agent_timeout_ms = parse_env("AGENT_TIMEOUT_MS", 120_000)?;
        let max_tier_concurrency = parse_env("MAX_TIER_CONCURRENCY", 8usize)?;
        if max_tier_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_TIER_CONCURRENCY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let pipeline_deadline_ms = match std::env::var("PIPELINE_DEADLINE_MS") {
            Ok(v) => Some(v.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue("PIPELINE_DEADLINE_MS".to_string(), v.clone())
            })?),
            Err(_) => None,
        };

        let temperature = parse_env("TEMPERATURE", 0.2f64)?;

        Ok(Self {
            api_key,
            models,
            agent_timeout_ms,
            max_tier_concurrency,
            pipeline_deadline_ms,
            temperature,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            models: ModelMap::default(),
            agent_timeout_ms: 120_000,
            max_tier_concurrency: 8,
            pipeline_deadline_ms: None,
            temperature: 0.2,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), v)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agent_timeout_ms, 120_000);
        assert_eq!(config.max_tier_concurrency, 8);
        assert!(config.pipeline_deadline_ms.is_none());
    }
}
