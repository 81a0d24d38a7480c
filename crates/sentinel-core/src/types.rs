//! # Core Data Model
//!
//! `ScanRequest`, `RiskScore`, and `AgentAction` per spec §3. `AttackEntry`
//! lives in `sentinel_firewall` (the Knowledge Store's own record type) and
//! `CouncilDecision`/`IndividualVote` live in `sentinel_council` (see that
//! crate's `vote.rs` for why) — both are re-exported from [`crate`] so
//! callers have one import path.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::verdict::RiskLevel;

const PREVIEW_LEN: usize = 500;

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_LEN).collect()
}

fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The kind of content a `ScanRequest` was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Prompt,
    Output,
    ContentText,
    ContentImage,
    ContentAudio,
    ContentVideo,
}

/// Immutable record of one scan invocation: what was submitted, hashed
/// and previewed so the original text need not be retained in full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub id: String,
    pub kind: RequestKind,
    pub input_hash: String,
    pub input_preview: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub metadata: Value,
}

impl ScanRequest {
    pub fn new(kind: RequestKind, text: &str, user_id: Option<String>, session_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            input_hash: sha256_hex(text),
            input_preview: preview(text),
            user_id,
            session_id,
            metadata: Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Council/engine-facing verdict a `RiskScore` settles on. Distinct from
/// [`crate::verdict::Verdict`] (the Orchestrator's HTTP-facing verdict) —
/// this one adds `Sanitized`, per spec §3's four-way scan verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanVerdict {
    Allowed,
    Flagged,
    Blocked,
    Sanitized,
}

/// Immutable per-module risk assessment tied back to the `ScanRequest`
/// that produced it. The Scanning Engine exclusively constructs these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScore {
    pub id: String,
    pub scan_request_id: String,
    pub module_type: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub verdict: ScanVerdict,
    pub explanation: String,
    pub signals: Value,
    pub false_positive_probability: Option<f64>,
}

impl RiskScore {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scan_request_id: &str,
        module_type: impl Into<String>,
        risk_score: f64,
        confidence: f64,
        verdict: ScanVerdict,
        explanation: impl Into<String>,
        signals: Value,
        false_positive_probability: Option<f64>,
    ) -> Self {
        let risk_score = risk_score.clamp(0.0, 100.0);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            scan_request_id: scan_request_id.to_string(),
            module_type: module_type.into(),
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            confidence: confidence.clamp(0.0, 1.0),
            verdict,
            explanation: explanation.into(),
            signals,
            false_positive_probability,
        }
    }
}

/// The action kind an agent requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ToolCall,
    FileWrite,
    NetworkRequest,
    Other(String),
}

/// One agent's requested action: the sole mutable record family (spec
/// §3), transitioning once from unexecuted to executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAction {
    pub id: String,
    pub agent_id: String,
    pub session_id: Option<String>,
    pub action_kind: ActionKind,
    pub payload: Value,
    pub scope: Option<String>,
    pub authorized: bool,
    pub risk_score: f64,
    pub safety_flags: Vec<String>,
    pub executed: bool,
    pub execution_result: Option<Value>,
    pub execution_error: Option<String>,
}

impl AgentAction {
    pub fn new(agent_id: impl Into<String>, action_kind: ActionKind, payload: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            session_id: None,
            action_kind,
            payload,
            scope: None,
            authorized: false,
            risk_score: 0.0,
            safety_flags: Vec::new(),
            executed: false,
            execution_result: None,
            execution_error: None,
        }
    }

    /// The only mutation spec §3 allows on this record: transitioning to
    /// executed with a terminal outcome.
    pub fn mark_executed(&mut self, result: std::result::Result<Value, String>) {
        self.executed = true;
        match result {
            Ok(value) => self.execution_result = Some(value),
            Err(err) => self.execution_error = Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_request_input_hash_is_content_addressed() {
        let a = ScanRequest::new(RequestKind::Prompt, "hello", None, None);
        let b = ScanRequest::new(RequestKind::Prompt, "hello", None, None);
        assert_eq!(a.input_hash, b.input_hash);
    }

    #[test]
    fn test_scan_request_id_is_unique_even_for_identical_text() {
        let a = ScanRequest::new(RequestKind::Prompt, "hello", None, None);
        let b = ScanRequest::new(RequestKind::Prompt, "hello", None, None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_scan_request_preview_truncates() {
        let long_text = "a".repeat(1000);
        let request = ScanRequest::new(RequestKind::Prompt, &long_text, None, None);
        assert_eq!(request.input_preview.len(), PREVIEW_LEN);
    }

    #[test]
    fn test_different_text_different_hash() {
        let a = ScanRequest::new(RequestKind::Prompt, "hello", None, None);
        let b = ScanRequest::new(RequestKind::Prompt, "world", None, None);
        assert_ne!(a.input_hash, b.input_hash);
    }

    #[test]
    fn test_risk_score_clamps_and_maps_level() {
        let score = RiskScore::new("req-1", "heuristic", 150.0, 2.0, ScanVerdict::Blocked, "x", Value::Null, None);
        assert_eq!(score.risk_score, 100.0);
        assert_eq!(score.confidence, 1.0);
        assert_eq!(score.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_agent_action_starts_unexecuted() {
        let action = AgentAction::new("agent-1", ActionKind::ToolCall, Value::Null);
        assert!(!action.executed);
        assert!(action.execution_result.is_none());
    }

    #[test]
    fn test_agent_action_mark_executed_success() {
        let mut action = AgentAction::new("agent-1", ActionKind::ToolCall, Value::Null);
        action.mark_executed(Ok(serde_json::json!({"status": "ok"})));
        assert!(action.executed);
        assert!(action.execution_result.is_some());
        assert!(action.execution_error.is_none());
    }
}
