//! # Proxy Orchestrator
//!
//! `POST /v1/chat/completions` lives here: extract the last user message,
//! route to an upstream provider, scan the prompt before any network call
//! leaves the process, forward the request, scan the response, and only
//! then hand it back — augmented with `safety_metadata`. Spec §4.10's
//! seven-step lifecycle, built the way `sentinel_council::adapter`
//! normalizes three different provider response envelopes down to one
//! contract, generalized here to full chat-completion payloads rather
//! than single-string council votes.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SentinelConfig;
use crate::engine::ScanningEngine;
use crate::error::{Result, SentinelError};
use crate::verdict::{RiskLevel, SafetyMetadata};

/// Maps a model id prefix to the provider that serves it, per spec §6's
/// auto-route table (`gpt-`/`claude-`/`grok-`/`sonar-` → aggregator,
/// `gemini-` → gemini, `llama-` → groq). Consulted only when the caller
/// didn't supply `X-Upstream-Provider`, or supplied `"auto"`.
fn auto_route(model: &str) -> Option<&'static str> {
    if model.starts_with("gpt-") || model.starts_with("o1") {
        Some("openai")
    } else if model.starts_with("gemini") {
        Some("google")
    } else if model.starts_with("command") {
        Some("cohere")
    } else if model.starts_with("claude-") || model.starts_with("grok-") || model.starts_with("sonar-") {
        Some("openrouter")
    } else if model.starts_with("llama") {
        Some("groq")
    } else {
        None
    }
}

/// Normalizes the `X-Upstream-Provider` header's spec §6 vocabulary
/// (`openai, gemini, gemini2, groq, grok2, openrouter, anthropic, auto`)
/// onto an internal provider id. `"gemini"` maps onto the `"google"`
/// internal id shared with the Council's `GoogleAdapter` config entry;
/// `"auto"` returns `None` so the caller falls through to [`auto_route`]
/// instead of treating it as a literal (unrecognized) provider id.
fn normalize_provider_header(header: &str) -> Option<String> {
    let mapped = match header {
        "openai" => "openai",
        "gemini" => "google",
        "gemini2" => "gemini2",
        "groq" => "groq",
        "grok2" => "grok2",
        "openrouter" => "openrouter",
        "anthropic" => "anthropic",
        "auto" => return None,
        other => return Some(other.to_string()),
    };
    Some(mapped.to_string())
}

fn upstream_endpoint(provider_id: &str, model: &str) -> Option<String> {
    match provider_id {
        "openai" => Some("https://api.openai.com/v1/chat/completions".to_string()),
        "google" | "gemini2" => Some(format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
        )),
        "cohere" => Some("https://api.cohere.ai/v1/chat".to_string()),
        "groq" => Some("https://api.groq.com/openai/v1/chat/completions".to_string()),
        "grok2" => Some("https://api.x.ai/v1/chat/completions".to_string()),
        "openrouter" => Some("https://openrouter.ai/api/v1/chat/completions".to_string()),
        "anthropic" => Some("https://api.anthropic.com/v1/messages".to_string()),
        _ => None,
    }
}

/// Builds the upstream-specific request body from a provider-agnostic
/// `messages` array, mirroring the envelope shapes
/// `sentinel_council::adapter` already normalizes for council votes.
/// `openai`/`groq`/`grok2`/`openrouter` all speak the OpenAI-compatible
/// chat-completions envelope.
fn upstream_body(provider_id: &str, model: &str, messages: &[Value]) -> Value {
    match provider_id {
        "google" | "gemini2" => {
            let contents: Vec<Value> = messages
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "role": if m["role"] == "assistant" { "model" } else { "user" },
                        "parts": [{"text": m["content"]}],
                    })
                })
                .collect();
            serde_json::json!({ "contents": contents })
        }
        "cohere" => serde_json::json!({ "model": model, "messages": messages }),
        "anthropic" => {
            let system = messages
                .iter()
                .find(|m| m["role"] == "system")
                .and_then(|m| m["content"].as_str())
                .map(str::to_string);
            let turns: Vec<Value> = messages.iter().filter(|m| m["role"] != "system").cloned().collect();
            let mut body = serde_json::json!({ "model": model, "messages": turns, "max_tokens": 4096 });
            if let Some(system) = system {
                body["system"] = Value::String(system);
            }
            body
        }
        _ => serde_json::json!({ "model": model, "messages": messages }),
    }
}

fn extract_content(provider_id: &str, response: &Value) -> Option<String> {
    match provider_id {
        "openai" | "groq" | "grok2" | "openrouter" => {
            response["choices"][0]["message"]["content"].as_str().map(str::to_string)
        }
        "google" | "gemini2" => response["candidates"][0]["content"]["parts"][0]["text"].as_str().map(str::to_string),
        "cohere" => response["text"]
            .as_str()
            .or_else(|| response["message"]["content"][0]["text"].as_str())
            .map(str::to_string),
        "anthropic" => response["content"][0]["text"].as_str().map(str::to_string),
        _ => None,
    }
}

/// Returns the last `role: "user"` message's text content, per spec
/// §4.10 step 1.
fn last_user_message(messages: &[Value]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m["role"] == "user")
        .and_then(|m| m["content"].as_str())
        .map(str::to_string)
}

/// Coordinates provider routing, API-key resolution, and the pre/post
/// scan gates around one upstream chat-completions call.
pub struct ProxyOrchestrator {
    engine: Arc<ScanningEngine>,
    config: SentinelConfig,
    http: reqwest::Client,
}

impl ProxyOrchestrator {
    pub fn new(engine: Arc<ScanningEngine>, config: SentinelConfig) -> Self {
        Self { engine, config, http: reqwest::Client::new() }
    }

    /// Spec §4.10's `handle_chat_completion`.
    ///
    /// `header_provider`/`header_key` are `X-Upstream-Provider` /
    /// `X-Upstream-Key`; `per_user_key` is whatever key resolution a
    /// caller's auth layer already looked up for this user.
    pub async fn handle_chat_completion(
        &self,
        body: &Value,
        header_provider: Option<&str>,
        header_key: Option<&str>,
        per_user_key: Option<&str>,
        user_id: Option<String>,
        session_id: Option<String>,
    ) -> Result<Value> {
        let messages = body["messages"].as_array().cloned().unwrap_or_default();
        let prompt = last_user_message(&messages).ok_or(SentinelError::NoUserMessage)?;

        let model = body["model"].as_str().unwrap_or("").to_string();
        let provider_id = header_provider
            .and_then(normalize_provider_header)
            .or_else(|| auto_route(&model).map(str::to_string))
            .ok_or_else(|| SentinelError::UnsupportedProvider(model.clone()))?;

        let provider_config = self
            .config
            .provider(&provider_id)
            .ok_or_else(|| SentinelError::UnsupportedProvider(provider_id.clone()))?;

        let api_key = header_key
            .or(per_user_key)
            .or(provider_config.api_key.as_deref())
            .ok_or_else(|| SentinelError::NoKeyConfigured(provider_id.clone()))?;

        let prompt_score =
            self.engine.scan_prompt(&prompt, user_id.clone(), session_id.clone()).await.map_err(|e| {
                warn!(error = %e, "prompt scan failed");
                SentinelError::ScanFailed(e.to_string())
            })?;

        if matches!(prompt_score.verdict, crate::types::ScanVerdict::Blocked) {
            return Err(SentinelError::SafetyBlockPrompt(prompt_score.explanation.clone()));
        }

        let endpoint = upstream_endpoint(&provider_id, &model)
            .ok_or_else(|| SentinelError::UnsupportedProvider(provider_id.clone()))?;
        let upstream_request = upstream_body(&provider_id, &model, &messages);

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_key)
            .timeout(provider_config.timeout)
            .json(&upstream_request)
            .send()
            .await
            .map_err(|e| SentinelError::UpstreamUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SentinelError::UpstreamError { status: status.as_u16(), message });
        }

        let upstream_json: Value =
            response.json().await.map_err(|e| SentinelError::UpstreamUnreachable(e.to_string()))?;
        let output = extract_content(&provider_id, &upstream_json)
            .ok_or_else(|| SentinelError::UpstreamError { status: status.as_u16(), message: "unrecognized response shape".to_string() })?;

        // Unlike the pre-upstream prompt scan, a failure here is logged and
        // the response still goes out — annotated with `scan_error` rather
        // than failing the whole request (spec §4.10 step 7, §5).
        let (safety_metadata, scan_error) =
            match self.engine.scan_output(&output, &prompt, user_id.clone(), session_id.clone()).await {
                Ok(output_score) => {
                    if matches!(output_score.verdict, crate::types::ScanVerdict::Blocked) {
                        return Err(SentinelError::SafetyBlockOutput(output_score.explanation.clone()));
                    }
                    let metadata = SafetyMetadata {
                        prompt_scanned: true,
                        output_scanned: true,
                        output_risk_score: output_score.risk_score,
                        output_risk_level: RiskLevel::from_score(output_score.risk_score),
                    };
                    (metadata, None)
                }
                Err(e) => {
                    warn!(error = %e, "output scan failed, serving response unscanned");
                    let metadata = SafetyMetadata {
                        prompt_scanned: true,
                        output_scanned: false,
                        output_risk_score: 0.0,
                        output_risk_level: RiskLevel::Safe,
                    };
                    (metadata, Some(e.to_string()))
                }
            };

        debug!(provider = %provider_id, model, "chat completion proxied successfully");

        let mut augmented = upstream_json;
        if let Value::Object(ref mut map) = augmented {
            map.insert("safety_metadata".to_string(), serde_json::to_value(&safety_metadata).unwrap_or(Value::Null));
            if let Some(err) = scan_error {
                map.insert("scan_error".to_string(), Value::String(err));
            }
        }
        Ok(augmented)
    }
}

/// Structured safety-block body per spec §6, returned with HTTP 400 when
/// a scan blocks before or after the upstream call. `code` is
/// `"prompt_injection_detected"` or `"unsafe_output_detected"` depending
/// on which side of the upstream call the block happened
/// (`SentinelError::error_code`).
pub fn safety_block_body(risk_score: f64, reason: &str, code: &str) -> Value {
    serde_json::json!({
        "error": {
            "message": reason,
            "type": "safety_block",
            "code": code,
            "risk_score": risk_score,
            "risk_level": RiskLevel::from_score(risk_score).as_str(),
        }
    })
}

/// Structured upstream-error body per spec §6.
pub fn upstream_error_body(message: &str) -> Value {
    serde_json::json!({
        "error": {
            "message": message,
            "type": "upstream_error",
        }
    })
}
