//! # Vote and Decision Records
//!
//! `IndividualVote` and `CouncilDecision` are defined here rather than in
//! `sentinel-core::types` because the Council exclusively owns
//! `IndividualVote` construction (spec §3) and `sentinel-core` depends on
//! this crate, not the reverse — defining them downstream would create a
//! dependency cycle. `sentinel-core` re-exports both from here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consensus::Verdict;

/// One provider's independent assessment of a single council round.
/// Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndividualVote {
    pub provider_id: String,
    pub model: String,
    pub verdict: Verdict,
    pub risk_score: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub signals: HashMap<String, Value>,
    pub latency_ms: u64,
    pub error: Option<String>,
}

impl IndividualVote {
    /// Builds a vote from a parsed JSON response matching the council's
    /// output contract (global safety prompt + role's `signals_detected`
    /// extension). Missing optional fields degrade gracefully; a missing
    /// `verdict` or out-of-range `risk_score`/`confidence` is an error.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let verdict_str = value["verdict"].as_str().ok_or("missing \"verdict\" field")?;
        let verdict = Verdict::parse_model_label(verdict_str)?;

        let risk_score = value["risk_score"]
            .as_f64()
            .ok_or("missing or non-numeric \"risk_score\" field")?
            .clamp(0.0, 100.0);

        let confidence = value["confidence"]
            .as_f64()
            .ok_or("missing or non-numeric \"confidence\" field")?
            .clamp(0.0, 1.0);

        let reasoning = value["reasoning"].as_str().unwrap_or("").to_string();

        let signals = value["signals_detected"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .enumerate()
                    .map(|(i, v)| (format!("signal_{i}"), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            provider_id: String::new(),
            model: String::new(),
            verdict,
            risk_score,
            confidence,
            reasoning,
            signals,
            latency_ms: 0,
            error: None,
        })
    }

    /// A vote recording that the response couldn't be parsed as valid
    /// JSON. Low confidence, flagged, per spec §4.6 step 4.
    pub fn parse_failure(provider_id: &str, model: &str, latency_ms: u64, reason: String) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            model: model.to_string(),
            verdict: Verdict::Flagged,
            risk_score: 50.0,
            confidence: 0.3,
            reasoning: format!("response could not be parsed: {reason}"),
            signals: HashMap::new(),
            latency_ms,
            error: Some(reason),
        }
    }

    /// A vote recording that the upstream call itself failed (network,
    /// auth, timeout). The Council treats this as "no opinion" unless
    /// every provider fails in the same round.
    pub fn call_failure(provider_id: &str, model: &str, latency_ms: u64, reason: String) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            model: model.to_string(),
            verdict: Verdict::Flagged,
            risk_score: 50.0,
            confidence: 0.0,
            reasoning: format!("provider call failed: {reason}"),
            signals: HashMap::new(),
            latency_ms,
            error: Some(reason),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Final aggregated outcome of one Council round across all dispatched
/// providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilDecision {
    pub id: String,
    pub scan_request_id: String,
    pub verdict: Verdict,
    pub consensus_score: f64,
    pub weighted_score: f64,
    pub votes_by_provider: HashMap<String, Verdict>,
    pub effective_weights: HashMap<String, f64>,
    pub reasoning: String,
    pub dissenting_opinions: Vec<String>,
}
