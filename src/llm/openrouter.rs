//! OpenRouter-backed reasoning client with automatic retry for transient errors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::error::{classify_http_status, ReasoningError, ReasoningErrorKind, RetryConfig};
use super::{
    strip_code_fences, Completion, JsonCompletion, ModelComplexity, ReasoningClient,
    RequestOptions, TokenCounts,
};
use crate::pricing::cost_cents_from_usage;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Mapping from complexity tier to a concrete model id.
#[derive(Debug, Clone)]
pub struct ModelMap {
    pub low: String,
    pub standard: String,
    pub high: String,
}

impl ModelMap {
    /// Resolve a complexity hint to a model id.
    pub fn resolve(&self, complexity: ModelComplexity) -> &str {
        match complexity {
            ModelComplexity::Low => &self.low,
            ModelComplexity::Standard => &self.standard,
            ModelComplexity::High => &self.high,
        }
    }
}

impl Default for ModelMap {
    fn default() -> Self {
        Self {
            low: "openai/gpt-5-mini".to_string(),
            standard: "anthropic/claude-sonnet-4.5".to_string(),
            high: "anthropic/claude-opus-4.1".to_string(),
        }
    }
}

/// OpenRouter API client.
///
/// Transport-level transient errors (rate limits, 5xx, connection failures)
/// are retried here with backoff; everything else is the envelope's problem.
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    models: ModelMap,
    retry_config: RetryConfig,
}

impl OpenRouterClient {
    /// Create a new client with default retry configuration.
    pub fn new(api_key: String, models: ModelMap) -> Self {
        Self {
            client: Client::new(),
            api_key,
            models,
            retry_config: RetryConfig::default(),
        }
    }

    /// Create a new client with custom retry configuration.
    pub fn with_retry_config(api_key: String, models: ModelMap, retry_config: RetryConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            models,
            retry_config,
        }
    }

    /// Parse a Retry-After header if present (seconds form only).
    fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok().map(Duration::from_secs))
    }

    /// Create a ReasoningError from HTTP response status and body.
    fn create_error(
        status: reqwest::StatusCode,
        body: &str,
        retry_after: Option<Duration>,
    ) -> ReasoningError {
        let status_code = status.as_u16();
        match classify_http_status(status_code) {
            ReasoningErrorKind::RateLimited => ReasoningError::rate_limited(body, retry_after),
            ReasoningErrorKind::ClientError => ReasoningError::client_error(status_code, body),
            _ => ReasoningError::server_error(status_code, body),
        }
    }

    fn build_request(&self, prompt: &str, opts: &RequestOptions, json_mode: bool) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = opts.system_prompt {
            messages.push(ChatRequestMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(ChatRequestMessage {
            role: "user",
            content: prompt.to_string(),
        });

        ChatRequest {
            model: self.models.resolve(opts.complexity).to_string(),
            messages,
            temperature: opts.temperature,
            max_tokens: opts.max_tokens,
            response_format: json_mode.then(|| ResponseFormat {
                format_type: "json_object",
            }),
        }
    }

    /// Execute a single request without retry.
    async fn execute_request(
        &self,
        request: &ChatRequest,
        agent: &str,
    ) -> Result<Completion, ReasoningError> {
        let response = match self
            .client
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", format!("diligence/{}", agent))
            .json(request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                if e.is_timeout() {
                    return Err(ReasoningError::network_error(format!(
                        "Request timeout: {}",
                        e
                    )));
                } else if e.is_connect() {
                    return Err(ReasoningError::network_error(format!(
                        "Connection failed: {}",
                        e
                    )));
                }
                return Err(ReasoningError::network_error(format!("Request failed: {}", e)));
            }
        };

        let status = response.status();
        let retry_after = Self::parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(Self::create_error(status, &body, retry_after));
        }

        let parsed: ChatResponseBody = serde_json::from_str(&body).map_err(|e| {
            ReasoningError::parse_error(format!("Failed to parse response: {}, body: {}", e, body))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ReasoningError::parse_error("No choices in response"))?;

        let model = parsed.model.or_else(|| Some(request.model.clone()));
        let usage = parsed
            .usage
            .map(|u| TokenCounts::new(u.prompt_tokens, u.completion_tokens));
        let cost_cents = match (&model, &usage) {
            (Some(m), Some(u)) => cost_cents_from_usage(m, u),
            _ => 0,
        };

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            cost_cents,
            usage,
            model,
        })
    }

    /// Execute a request with automatic retry for transient errors.
    async fn execute_with_retry(
        &self,
        request: &ChatRequest,
        agent: &str,
    ) -> Result<Completion, ReasoningError> {
        let start = Instant::now();
        let mut attempt = 0;
        let mut last_error: Option<ReasoningError> = None;

        loop {
            if start.elapsed() > self.retry_config.max_retry_duration {
                return Err(last_error.unwrap_or_else(|| {
                    ReasoningError::network_error("Max retry duration exceeded")
                }));
            }

            match self.execute_request(request, agent).await {
                Ok(response) => {
                    if attempt > 0 {
                        tracing::info!(
                            agent = %agent,
                            "Request succeeded after {} retries (total time: {:?})",
                            attempt,
                            start.elapsed()
                        );
                    }
                    return Ok(response);
                }
                Err(error) => {
                    let should_retry = self.retry_config.should_retry(&error)
                        && attempt < self.retry_config.max_retries;

                    if !should_retry {
                        tracing::error!(agent = %agent, "Request failed (not retrying): {}", error);
                        return Err(error);
                    }

                    let delay = error.suggested_delay(attempt);
                    let remaining = self
                        .retry_config
                        .max_retry_duration
                        .saturating_sub(start.elapsed());
                    let actual_delay = delay.min(remaining);

                    if actual_delay.is_zero() {
                        tracing::warn!(
                            agent = %agent,
                            "Retry attempt {} failed, no time remaining: {}",
                            attempt + 1,
                            error
                        );
                        return Err(error);
                    }

                    tracing::warn!(
                        agent = %agent,
                        "Retry attempt {} failed with {}, retrying in {:?}: {}",
                        attempt + 1,
                        error.kind,
                        actual_delay,
                        error.message
                    );

                    tokio::time::sleep(actual_delay).await;
                    attempt += 1;
                    last_error = Some(error);
                }
            }
        }
    }
}

#[async_trait]
impl ReasoningClient for OpenRouterClient {
    async fn complete(
        &self,
        prompt: &str,
        opts: &RequestOptions,
    ) -> Result<Completion, ReasoningError> {
        let request = self.build_request(prompt, opts, false);
        tracing::debug!(agent = %opts.agent, model = %request.model, "Sending completion request");
        self.execute_with_retry(&request, &opts.agent).await
    }

    async fn complete_json(
        &self,
        prompt: &str,
        opts: &RequestOptions,
    ) -> Result<JsonCompletion, ReasoningError> {
        let request = self.build_request(prompt, opts, true);
        tracing::debug!(agent = %opts.agent, model = %request.model, "Sending JSON-mode request");
        let completion = self.execute_with_retry(&request, &opts.agent).await?;

        let stripped = strip_code_fences(&completion.content);
        let data: serde_json::Value = serde_json::from_str(stripped).map_err(|e| {
            let preview: String = stripped.chars().take(500).collect();
            ReasoningError::parse_error(format!(
                "Model returned non-JSON output in JSON mode: {}, content: {}",
                e, preview
            ))
        })?;

        Ok(JsonCompletion {
            data,
            cost_cents: completion.cost_cents,
            usage: completion.usage,
        })
    }
}

/// OpenRouter chat request (OpenAI-compatible).
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// OpenRouter chat response (OpenAI-compatible).
#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<UsageBody>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageBody {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_map_resolution() {
        let map = ModelMap::default();
        assert_eq!(map.resolve(ModelComplexity::Low), "openai/gpt-5-mini");
        assert_eq!(
            map.resolve(ModelComplexity::Standard),
            "anthropic/claude-sonnet-4.5"
        );
        assert_eq!(
            map.resolve(ModelComplexity::High),
            "anthropic/claude-opus-4.1"
        );
    }

    #[test]
    fn test_json_mode_request_shape() {
        let client = OpenRouterClient::new("key".into(), ModelMap::default());
        let opts = RequestOptions::new("legal", ModelComplexity::Low)
            .with_system_prompt("sys")
            .with_temperature(0.0);

        let request = client.build_request("analyze", &opts, true);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "openai/gpt-5-mini");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "analyze");
        assert_eq!(value["response_format"]["type"], "json_object");
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn test_text_mode_omits_response_format() {
        let client = OpenRouterClient::new("key".into(), ModelMap::default());
        let opts = RequestOptions::new("memo", ModelComplexity::High);

        let request = client.build_request("write", &opts, false);
        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("response_format").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
