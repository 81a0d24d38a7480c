//! # LLM Council
//!
//! The async counterpart to the evaluator triad's "any evaluator can
//! veto, errors isolated per-evaluator" shape, generalized to real
//! upstream providers dispatched concurrently over the network. Where
//! the triad ran three fixed, synchronous, local evaluators, the Council
//! runs a role-routed, variable-size set of remote adapters and must
//! tolerate individual network failures without aborting the round.

use std::sync::Arc;

use sentinel_registry::PersistencePort;

use crate::adapter::ProviderAdapter;
use crate::consensus::{ConsensusEngine, Verdict};
use crate::error::{CouncilError, Result};
use crate::role::SafetyRole;
use crate::safety_prompt::wrap_for_role;
use crate::vote::{CouncilDecision, IndividualVote};

/// Minimum confidence a vote needs to pass the hallucination filter's
/// gate (spec §4.6 step 5a).
const HALLUCINATION_CONFIDENCE_GATE: f64 = 0.7;

/// Max risk-score spread across valid votes for the cross-model fact
/// check to pass (step 5b).
const FACT_CHECK_SCORE_RANGE: f64 = 20.0;

/// Minimum fraction of votes that must agree on verdict for the
/// cross-model fact check to pass (step 5b).
const FACT_CHECK_AGREEMENT: f64 = 0.6;

/// Coordinates role routing, parallel provider dispatch, vote filtering,
/// weighted consensus, and persistence hand-off for one analysis call.
pub struct LlmCouncil {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    consensus: ConsensusEngine,
    persistence: Option<Arc<PersistencePort>>,
}

impl LlmCouncil {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { adapters, consensus: ConsensusEngine::new(), persistence: None }
    }

    pub fn with_persistence(mut self, persistence: Arc<PersistencePort>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_consensus(mut self, consensus: ConsensusEngine) -> Self {
        self.consensus = consensus;
        self
    }

    /// Runs one full council round: route, wrap, dispatch, filter,
    /// aggregate, persist. `scan_request_id` ties the decision back to
    /// the `ScanRequest` that triggered it.
    pub async fn analyze(
        &self,
        prompt: &str,
        analysis_type: &str,
        scan_request_id: &str,
    ) -> Result<CouncilDecision> {
        let role = SafetyRole::from_analysis_type(analysis_type);
        let wrapped_prompt = wrap_for_role(prompt, role.prompt_prefix());
        let selected = self.select_adapters(&role);

        if selected.is_empty() {
            return Err(CouncilError::RoleRoutingError(format!(
                "no adapters configured for role {role}"
            )));
        }

        let raw_votes = Self::dispatch(selected, &wrapped_prompt).await;
        let votes = Self::apply_hallucination_filter(raw_votes);

        let aggregate = self.consensus.evaluate(&votes)?;

        let votes_by_provider =
            votes.iter().map(|v| (v.provider_id.clone(), v.verdict)).collect();

        let dissenting_opinions = votes
            .iter()
            .filter(|v| v.verdict != aggregate.verdict)
            .map(|v| format!("{}: {}", v.provider_id, v.reasoning))
            .collect();

        let decision = CouncilDecision {
            id: uuid::Uuid::new_v4().to_string(),
            scan_request_id: scan_request_id.to_string(),
            verdict: aggregate.verdict,
            consensus_score: if aggregate.critical_disagreement { 0.5 } else { 1.0 },
            weighted_score: aggregate.final_score,
            votes_by_provider,
            effective_weights: aggregate.effective_weights,
            reasoning: Self::summarize_reasoning(&votes),
            dissenting_opinions,
        };

        if let Some(persistence) = &self.persistence {
            persistence
                .insert_council_decision(&decision.id, &decision)
                .map_err(|e| CouncilError::Internal(e.to_string()))?;
            for vote in &votes {
                let vote_id = format!("{}-{}", decision.id, vote.provider_id);
                persistence
                    .insert_individual_vote(&vote_id, vote)
                    .map_err(|e| CouncilError::Internal(e.to_string()))?;
            }
        }

        Ok(decision)
    }

    fn select_adapters(&self, role: &SafetyRole) -> Vec<Arc<dyn ProviderAdapter>> {
        let preferred = role.effective_providers();
        self.adapters
            .iter()
            .filter(|a| preferred.contains(&a.provider_id()))
            .cloned()
            .collect()
    }

    /// Dispatches every selected adapter concurrently. A single
    /// provider's own failure is isolated to its own vote via
    /// `ProviderAdapter::vote`'s internal error handling; `JoinSet`
    /// additionally isolates task-level panics.
    async fn dispatch(
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        prompt: &str,
    ) -> Vec<IndividualVote> {
        let mut set = tokio::task::JoinSet::new();
        for adapter in adapters {
            let prompt = prompt.to_string();
            set.spawn(async move { adapter.vote(&prompt).await });
        }

        let mut votes = Vec::new();
        while let Some(result) = set.join_next().await {
            if let Ok(vote) = result {
                votes.push(vote);
            }
        }
        votes
    }

    /// Spec §4.6 step 5: drops low-confidence or fact-check-failing
    /// votes, but only when at least one other vote still passes —
    /// otherwise every vote proceeds with a warning annotated onto its
    /// reasoning, since a round with zero votes can't reach consensus.
    fn apply_hallucination_filter(votes: Vec<IndividualVote>) -> Vec<IndividualVote> {
        let valid: Vec<&IndividualVote> = votes.iter().filter(|v| v.is_valid()).collect();
        if valid.is_empty() {
            return votes;
        }

        let fact_check_passes = Self::cross_model_fact_check(&valid);

        let passing: Vec<bool> = votes
            .iter()
            .map(|v| v.is_valid() && v.confidence >= HALLUCINATION_CONFIDENCE_GATE && fact_check_passes)
            .collect();

        if passing.iter().any(|&p| p) {
            votes
                .into_iter()
                .zip(passing)
                .filter(|(_, passes)| *passes)
                .map(|(v, _)| v)
                .collect()
        } else {
            votes
                .into_iter()
                .map(|mut v| {
                    v.reasoning =
                        format!("[hallucination filter warning: low agreement] {}", v.reasoning);
                    v
                })
                .collect()
        }
    }

    /// Cross-model fact check (step 5b): valid votes must cluster within
    /// a 20-point risk-score range and agree on verdict at least 60% of
    /// the time.
    fn cross_model_fact_check(valid: &[&IndividualVote]) -> bool {
        if valid.len() < 2 {
            return true;
        }
        let scores: Vec<f64> = valid.iter().map(|v| v.risk_score).collect();
        let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if max - min > FACT_CHECK_SCORE_RANGE {
            return false;
        }

        let mut counts: std::collections::HashMap<Verdict, usize> = std::collections::HashMap::new();
        for v in valid {
            *counts.entry(v.verdict).or_insert(0) += 1;
        }
        let majority = counts.values().copied().max().unwrap_or(0);
        majority as f64 / valid.len() as f64 >= FACT_CHECK_AGREEMENT
    }

    fn summarize_reasoning(votes: &[IndividualVote]) -> String {
        votes
            .iter()
            .map(|v| format!("{} ({}): {}", v.provider_id, v.verdict_label(), v.reasoning))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl IndividualVote {
    fn verdict_label(&self) -> &'static str {
        match self.verdict {
            Verdict::Allowed => "allowed",
            Verdict::Flagged => "flagged",
            Verdict::Blocked => "blocked",
        }
    }
}
