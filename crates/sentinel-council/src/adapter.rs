//! # Provider Adapters
//!
//! One adapter per upstream LLM provider. Each normalizes its own
//! response envelope down to a single contract the Council never needs
//! to special-case: `call` returns raw text, `parse_vote` turns that text
//! into an [`IndividualVote`]. Structurally this is the same
//! trait-with-several-named-implementations shape the evaluator triad
//! used for its three ethical frameworks, generalized here to HTTP
//! provider calls instead of static rule matching.
//!
//! ## Response Shapes Normalized
//!
//! | Provider | Response path |
//! |----------|----------------|
//! | OpenAI-style | `choices[0].message.content` |
//! | Google-style | `candidates[0].content.parts[0].text` |
//! | Cohere-style | `generations[0].text` |
//!
//! ## Concurrency
//!
//! Each adapter call uses an independent `reqwest::Client` and a hard
//! per-call timeout (default 30s, configurable), so adapters are safe to
//! invoke concurrently from [`crate::council::LlmCouncil`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{CouncilError, Result};
use crate::vote::IndividualVote;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Contract every provider adapter implements.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable id used for routing tables and weighting (e.g. `"openai"`).
    fn provider_id(&self) -> &'static str;

    /// Model identifier sent in the request payload.
    fn model_id(&self) -> &str;

    /// Base weight this provider contributes to weighted consensus,
    /// before multiplying by the vote's confidence.
    fn weight(&self) -> f64;

    /// Sends `prompt` to the provider and returns the raw response text.
    async fn call(&self, prompt: &str, timeout: Duration) -> Result<String>;

    /// Parses a raw response into a vote. A parse failure produces a
    /// low-confidence flagged vote rather than propagating the error,
    /// per spec §4.6 step 4.
    fn parse_vote(&self, raw: &str, latency_ms: u64) -> IndividualVote {
        match parse_json_vote(raw) {
            Ok(vote) => IndividualVote {
                provider_id: self.provider_id().to_string(),
                model: self.model_id().to_string(),
                latency_ms,
                error: None,
                ..vote
            },
            Err(parse_err) => IndividualVote::parse_failure(
                self.provider_id(),
                self.model_id(),
                latency_ms,
                parse_err,
            ),
        }
    }

    /// Convenience: call then parse, isolating the error so one
    /// provider's outage never aborts the whole council round.
    async fn vote(&self, prompt: &str) -> IndividualVote {
        let start = std::time::Instant::now();
        match self.call(prompt, DEFAULT_TIMEOUT).await {
            Ok(raw) => self.parse_vote(&raw, start.elapsed().as_millis() as u64),
            Err(err) => IndividualVote::call_failure(
                self.provider_id(),
                self.model_id(),
                start.elapsed().as_millis() as u64,
                err.to_string(),
            ),
        }
    }
}

/// Strips markdown fenced-code wrappers (` ```json ... ``` `) a model may
/// have wrapped its JSON response in, then decodes the vote fields.
fn parse_json_vote(raw: &str) -> std::result::Result<IndividualVote, String> {
    let trimmed = strip_fences(raw.trim());
    let value: Value = serde_json::from_str(trimmed).map_err(|e| e.to_string())?;
    IndividualVote::from_json(&value)
}

fn strip_fences(text: &str) -> &str {
    let text = text.strip_prefix("```json").or_else(|| text.strip_prefix("```")).unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

async fn post_json(url: &str, api_key: &str, body: Value, timeout: Duration) -> Result<Value> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CouncilError::AdapterError(e.to_string()))?;

    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| CouncilError::AdapterError(e.to_string()))?;

    if !response.status().is_success() {
        return Err(CouncilError::AdapterError(format!(
            "upstream returned status {}",
            response.status()
        )));
    }

    response.json::<Value>().await.map_err(|e| CouncilError::AdapterError(e.to_string()))
}

/// OpenAI-compatible chat-completions adapter.
pub struct OpenAiAdapter {
    pub model: String,
    pub api_key: String,
    pub endpoint: String,
}

impl OpenAiAdapter {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider_id(&self) -> &'static str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn weight(&self) -> f64 {
        1.0
    }

    async fn call(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });
        let response = post_json(&self.endpoint, &self.api_key, body, timeout).await?;
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CouncilError::AdapterError("missing choices[0].message.content".to_string()))
    }
}

/// Google Gemini-compatible `generateContent` adapter.
pub struct GoogleAdapter {
    pub model: String,
    pub api_key: String,
    pub endpoint: String,
}

impl GoogleAdapter {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        let model = model.into();
        let endpoint = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
        );
        Self { model, api_key: api_key.into(), endpoint }
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn provider_id(&self) -> &'static str {
        "google"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn weight(&self) -> f64 {
        0.9
    }

    async fn call(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
        });
        let response = post_json(&self.endpoint, &self.api_key, body, timeout).await?;
        response["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                CouncilError::AdapterError(
                    "missing candidates[0].content.parts[0].text".to_string(),
                )
            })
    }
}

/// Cohere `generate` adapter.
pub struct CohereAdapter {
    pub model: String,
    pub api_key: String,
    pub endpoint: String,
}

impl CohereAdapter {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            endpoint: "https://api.cohere.ai/v1/generate".to_string(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for CohereAdapter {
    fn provider_id(&self) -> &'static str {
        "cohere"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn weight(&self) -> f64 {
        0.8
    }

    async fn call(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
        });
        let response = post_json(&self.endpoint, &self.api_key, body, timeout).await?;
        response["generations"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CouncilError::AdapterError("missing generations[0].text".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_removes_json_wrapper() {
        let wrapped = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_fences(wrapped), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_removes_bare_wrapper() {
        let wrapped = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_fences(wrapped), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_passes_through_unwrapped() {
        assert_eq!(strip_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_json_vote_malformed_returns_error() {
        let result = parse_json_vote("not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_weights_differ() {
        let openai = OpenAiAdapter::new("gpt-4", "key");
        let google = GoogleAdapter::new("gemini-pro", "key");
        let cohere = CohereAdapter::new("command", "key");
        assert!(openai.weight() > google.weight());
        assert!(google.weight() > cohere.weight());
    }

    #[test]
    fn test_google_endpoint_includes_model() {
        let google = GoogleAdapter::new("gemini-pro", "key");
        assert!(google.endpoint.contains("gemini-pro"));
    }
}
