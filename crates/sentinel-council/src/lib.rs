//! # LLM Council and Adversarial Hardener
//!
//! Multi-provider consensus voting with a dedicated adversarial-hardening
//! second pass. Defends against single-provider compromise (a jailbroken
//! or miscalibrated model outvoted by a weighted quorum of the others)
//! and against prompts tuned to one exact token sequence (perturbation
//! collapses their effect; a simulator call checks the "what if it
//! worked" outcome directly).
//!
//! ## Threat Model
//!
//! ### Single Provider Compromise
//! If one provider is jailbroken, rate-limited into garbage, or simply
//! wrong, weighted consensus (`effective_weight = provider_weight *
//! confidence`) ensures its vote is diluted by the others rather than
//! trusted outright. A critical-agreement check on the two most
//! confident votes additionally forces an escalation to `flagged` when
//! even the strongest two votes disagree sharply.
//!
//! ### Token-Exact Adversarial Prompts
//! Prompt-injection and jailbreak techniques are frequently brittle:
//! they depend on exact wording, casing, or punctuation. The Adversarial
//! Hardener re-queries under a deterministic perturbation and an
//! adversarial-simulator framing; high variance across these
//! semantically-identical variants is itself treated as evidence of an
//! exploit rather than noise.
//!
//! ### Hallucinated or Fabricated Analysis
//! A provider's vote is not trusted blind: low-confidence votes and
//! votes that disagree with the rest of the round on both score and
//! verdict are filtered before aggregation, with a pass-through warning
//! rather than total loss of signal when no vote clears the bar.
//!
//! ## Architecture
//!
//! ```text
//! role::SafetyRole        adapter::ProviderAdapter (OpenAI/Google/Cohere)
//!        │                        │
//!        └──── council::LlmCouncil::analyze() ────┐
//!                        │                          │
//!           hallucination filter          consensus::ConsensusEngine
//!                        │                          │
//!                        └────── CouncilDecision ───┘
//!                                   │
//!                      hardener::AdversarialHardener
//!                         (injection/adversarial/general only)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sentinel_council::{LlmCouncil, OpenAiAdapter};
//! use std::sync::Arc;
//!
//! let council = LlmCouncil::new(vec![Arc::new(OpenAiAdapter::new("gpt-4", api_key))]);
//! let decision = council.analyze(prompt, "injection", "req-1").await?;
//! ```
//!
//! ## References
//!
//! - [Byzantine Fault Tolerance](https://en.wikipedia.org/wiki/Byzantine_fault)

pub mod adapter;
pub mod consensus;
pub mod council;
pub mod error;
pub mod hardener;
pub mod role;
pub mod safety_prompt;
pub mod vote;

pub use adapter::{CohereAdapter, GoogleAdapter, OpenAiAdapter, ProviderAdapter};
pub use consensus::{ConsensusEngine, Verdict, WeightedConsensus};
pub use council::LlmCouncil;
pub use error::{CouncilError, Result};
pub use hardener::{is_hardenable_analysis_type, should_harden, AdversarialHardener, HardenedScore};
pub use role::{SafetyRole, FALLBACK_PROVIDER};
pub use safety_prompt::{wrap_for_role, GLOBAL_SAFETY_SYSTEM_PROMPT};
pub use vote::{CouncilDecision, IndividualVote};

#[cfg(test)]
mod tests {
    #[test]
    fn test_crate_compiles() {
        let _ = std::hint::black_box(1);
    }
}
