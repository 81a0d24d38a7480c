//! # Risk Levels and Safety Metadata
//!
//! [`RiskLevel`] is the human-facing tier every numeric risk score maps
//! to (spec §4.2). The per-scan pass/fail/flag verdict itself is
//! [`sentinel_council::Verdict`], re-exported from [`crate`] — there is
//! deliberately no second `Verdict` type here; the Orchestrator's
//! HTTP-facing outcome lives in `orchestrator.rs` instead, named for what
//! it carries rather than competing for the same name.

use serde::{Deserialize, Serialize};

/// Human-facing risk tier a numeric score maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Spec §4.2: safe < 20 <= low < 40 <= medium < 60 <= high < 80 <= critical.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Critical
        } else if score >= 60.0 {
            Self::High
        } else if score >= 40.0 {
            Self::Medium
        } else if score >= 20.0 {
            Self::Low
        } else {
            Self::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attached to a proxied response once both the prompt and the model's
/// output have been scanned, per spec §6's success-response shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyMetadata {
    pub prompt_scanned: bool,
    pub output_scanned: bool,
    pub output_risk_score: f64,
    pub output_risk_level: RiskLevel,
}
