//! Weighted consensus engine for the LLM Council.
//!
//! Generalizes the 2/3-majority Byzantine vote-counting the evaluator
//! triad used into a continuous weighted scheme: each vote contributes
//! `provider_weight * confidence` instead of one unit, and the final
//! verdict is derived from accumulated weight and a critical-agreement
//! check on the two most confident votes, per spec §4.6 step 6.

use serde::{Deserialize, Serialize};

use crate::error::{CouncilError, Result};
use crate::vote::IndividualVote;

/// Council-facing risk verdict. Ordered so escalation (never lowering a
/// verdict once raised) is a simple comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verdict {
    Allowed,
    Flagged,
    Blocked,
}

impl Verdict {
    /// Maps a `risk_score` (0-100) to a verdict per spec §4.2:
    /// allowed < 40 <= flagged < 70 <= blocked.
    pub fn from_risk_score(score: f64) -> Self {
        if score >= 70.0 {
            Self::Blocked
        } else if score >= 40.0 {
            Self::Flagged
        } else {
            Self::Allowed
        }
    }

    /// Parses a model's self-reported verdict label. `"uncertain"` maps
    /// to `Flagged` — an uncertain model is never trusted to mean safe.
    pub fn parse_model_label(label: &str) -> std::result::Result<Self, String> {
        match label {
            "allowed" => Ok(Self::Allowed),
            "flagged" => Ok(Self::Flagged),
            "blocked" => Ok(Self::Blocked),
            "uncertain" => Ok(Self::Flagged),
            other => Err(format!("unrecognized verdict label \"{other}\"")),
        }
    }

    /// Escalates `self` to `other` if `other` is more severe, never the
    /// reverse (spec §4.2: verdict may only be escalated).
    pub fn escalate(self, other: Self) -> Self {
        self.max(other)
    }
}

/// A single provider's weighted contribution to one council round.
#[derive(Debug, Clone)]
struct WeightedVote<'a> {
    vote: &'a IndividualVote,
    effective_weight: f64,
}

/// Outcome of weighting and aggregating a round's valid votes.
#[derive(Debug, Clone)]
pub struct WeightedConsensus {
    pub verdict: Verdict,
    pub final_score: f64,
    pub effective_weights: std::collections::HashMap<String, f64>,
    pub critical_disagreement: bool,
}

/// Weighted consensus engine implementing spec §4.6 step 6.
#[derive(Debug, Clone, Default)]
pub struct ConsensusEngine {
    /// `provider_id -> base weight`, falling back to 1.0 when absent.
    provider_weights: std::collections::HashMap<String, f64>,
}

impl ConsensusEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider_weight(mut self, provider_id: impl Into<String>, weight: f64) -> Self {
        self.provider_weights.insert(provider_id.into(), weight);
        self
    }

    fn provider_weight(&self, provider_id: &str) -> f64 {
        self.provider_weights.get(provider_id).copied().unwrap_or(1.0)
    }

    /// Aggregates a round's votes into a single weighted verdict. Only
    /// votes without an error contribute; callers must have already
    /// rejected the round (via `NoValidVotes`) if none remain.
    pub fn evaluate(&self, votes: &[IndividualVote]) -> Result<WeightedConsensus> {
        let valid: Vec<&IndividualVote> = votes.iter().filter(|v| v.is_valid()).collect();
        if valid.is_empty() {
            return Err(CouncilError::NoValidVotes);
        }

        let weighted: Vec<WeightedVote> = valid
            .iter()
            .map(|&vote| WeightedVote {
                vote,
                effective_weight: self.provider_weight(&vote.provider_id) * vote.confidence,
            })
            .collect();

        let total_weight: f64 = weighted.iter().map(|w| w.effective_weight).sum();
        if total_weight <= 0.0 {
            return Err(CouncilError::NoValidVotes);
        }

        let final_score: f64 = weighted
            .iter()
            .map(|w| w.vote.risk_score * w.effective_weight)
            .sum::<f64>()
            / total_weight;

        let mut verdict_weight: std::collections::HashMap<Verdict, f64> =
            std::collections::HashMap::new();
        for w in &weighted {
            *verdict_weight.entry(w.vote.verdict).or_insert(0.0) += w.effective_weight;
        }

        let critical_disagreement = Self::critical_agreement_fails(&weighted);

        let verdict = if critical_disagreement && final_score >= 60.0 {
            Verdict::Flagged
        } else {
            Self::verdict_from_weights(&verdict_weight, total_weight)
                .unwrap_or_else(|| Verdict::from_risk_score(final_score))
        };

        let effective_weights = weighted
            .iter()
            .map(|w| (w.vote.provider_id.clone(), w.effective_weight))
            .collect();

        Ok(WeightedConsensus { verdict, final_score, effective_weights, critical_disagreement })
    }

    /// Blocked needs >=50% of accumulated weight (preferred over
    /// flagged), flagged needs >=40%. Below both, the caller derives a
    /// verdict from `final_score` directly.
    fn verdict_from_weights(
        weights: &std::collections::HashMap<Verdict, f64>,
        total_weight: f64,
    ) -> Option<Verdict> {
        let blocked = weights.get(&Verdict::Blocked).copied().unwrap_or(0.0);
        let flagged = weights.get(&Verdict::Flagged).copied().unwrap_or(0.0);

        if blocked / total_weight >= 0.5 {
            Some(Verdict::Blocked)
        } else if flagged / total_weight >= 0.4 {
            Some(Verdict::Flagged)
        } else {
            None
        }
    }

    /// Compares the two most confident votes: if their risk scores
    /// differ by more than 25 points or they disagree on verdict, the
    /// round fails the critical-agreement check.
    fn critical_agreement_fails(weighted: &[WeightedVote]) -> bool {
        if weighted.len() < 2 {
            return false;
        }
        let mut by_confidence: Vec<&WeightedVote> = weighted.iter().collect();
        by_confidence.sort_by(|a, b| {
            b.vote.confidence.partial_cmp(&a.vote.confidence).unwrap_or(std::cmp::Ordering::Equal)
        });
        let top = by_confidence[0].vote;
        let second = by_confidence[1].vote;
        (top.risk_score - second.risk_score).abs() > 25.0 || top.verdict != second.verdict
    }
}
