//! Reasoning-service client abstraction.
//!
//! Provides a trait-based abstraction over the external reasoning service
//! (an LLM provider), with OpenRouter as the primary implementation. The
//! pipeline treats the service as an opaque, costed remote dependency: every
//! call returns content plus a cost and token-usage record, and nothing the
//! service returns is trusted until it passes the normalizer.

mod error;
mod openrouter;

pub use error::{classify_http_status, ReasoningError, ReasoningErrorKind, RetryConfig};
pub use openrouter::{ModelMap, OpenRouterClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use crate::pricing::TokenCounts;

/// Model complexity tier requested by an agent.
///
/// The pipeline maps tiers to concrete model ids via configuration; agents
/// only declare how much reasoning capability their prompt needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelComplexity {
    /// Cheap extraction / classification work
    Low,
    /// Default analysis tier
    Standard,
    /// Cross-domain synthesis requiring the strongest model
    High,
}

/// Options for one reasoning call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Complexity tier, resolved to a model id by the client's model map.
    pub complexity: ModelComplexity,
    /// System prompt prepended to the conversation.
    pub system_prompt: Option<String>,
    /// Sampling temperature (0 = deterministic).
    pub temperature: Option<f64>,
    /// Maximum output tokens to generate.
    pub max_tokens: Option<u64>,
    /// Name of the agent making the call. Threaded explicitly for cost
    /// attribution and telemetry; never stored in process-wide state.
    pub agent: String,
}

impl RequestOptions {
    /// Create options for the given agent at the given tier.
    pub fn new(agent: impl Into<String>, complexity: ModelComplexity) -> Self {
        Self {
            complexity,
            system_prompt: None,
            temperature: None,
            max_tokens: None,
            agent: agent.into(),
        }
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token budget.
    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Result of a text completion call.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Generated text.
    pub content: String,
    /// Cost of this call in cents.
    pub cost_cents: u64,
    /// Token usage, when the provider reported it.
    pub usage: Option<TokenCounts>,
    /// Model that actually served the call.
    pub model: Option<String>,
}

/// Result of a JSON-mode completion call.
///
/// The payload is untrusted `serde_json::Value`: only the normalizer may
/// turn it into typed data.
#[derive(Debug, Clone)]
pub struct JsonCompletion {
    /// Parsed (but unvalidated) JSON payload.
    pub data: serde_json::Value,
    /// Cost of this call in cents.
    pub cost_cents: u64,
    /// Token usage, when the provider reported it.
    pub usage: Option<TokenCounts>,
}

/// Trait for reasoning-service clients.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Send a text completion request.
    async fn complete(
        &self,
        prompt: &str,
        opts: &RequestOptions,
    ) -> Result<Completion, ReasoningError>;

    /// Send a JSON-mode completion request.
    ///
    /// Implementations request structured output from the provider and parse
    /// the body; a non-JSON reply surfaces as `ReasoningError::parse_error`.
    async fn complete_json(
        &self,
        prompt: &str,
        opts: &RequestOptions,
    ) -> Result<JsonCompletion, ReasoningError>;

    /// Stream a completion, invoking `on_token` as tokens arrive.
    ///
    /// Default implementation completes non-streaming and emits the full
    /// content once; clients with a streaming transport may override.
    async fn stream(
        &self,
        prompt: &str,
        opts: &RequestOptions,
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<Completion, ReasoningError> {
        let completion = self.complete(prompt, opts).await?;
        on_token(&completion.content);
        Ok(completion)
    }
}

/// Strip markdown code fences from model output before JSON parsing.
///
/// Models routinely wrap JSON in ```json fences despite instructions not to.
pub(crate) fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
