//! # Core Types for the Semantic Firewall
//!
//! This module defines the fundamental data types used throughout the firewall
//! system for threat classification, scan results, and error handling.
//!
//! ## Threat Model
//!
//! The type system encodes our threat taxonomy based on:
//!
//! - **OWASP LLM Top 10 (2023)** - Industry-standard vulnerability classification
//! - **MITRE ATLAS** - Adversarial Threat Landscape for AI Systems
//! - **Academic Literature** - Zou et al., Greshake et al. prompt injection research
//!
//! Each [`ThreatType`] variant maps to a specific attack class with known
//! detection strategies and confidence calibration. Detectors don't return
//! bare scores; they return [`Signal`]s so the Heuristic Detector can combine
//! evidence from the Pattern Library, the entropy/encoding passes, and the
//! Knowledge Store without losing which detector said what.
//!
//! ## References
//!
//! - OWASP LLM Top 10: <https://owasp.org/www-project-top-10-for-large-language-model-applications/>
//! - MITRE ATLAS: <https://atlas.mitre.org/>

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Types of threats the firewall can detect.
///
/// This enum represents the taxonomy of adversarial attacks against LLM
/// systems. Each variant corresponds to a distinct attack methodology with
/// specific detection strategies.
///
/// # Security Note
///
/// This taxonomy is not exhaustive. New attack vectors emerge regularly.
/// The firewall should be updated as new threats are documented in academic
/// literature and security advisories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreatType {
    /// Classic "ignore previous instructions" direct injection.
    ///
    /// Reference: Perez & Ribeiro, "Ignore This Title and HackAPrompt" (2023)
    DirectInjection,

    /// Injection smuggled through retrieved or quoted third-party content
    /// rather than typed directly by the user.
    ///
    /// Reference: Greshake et al., "Not what you've signed up for" (2023)
    IndirectInjection,

    /// System prompt extraction attempt.
    PromptExtraction,

    /// Role hijack / persona override ("you are now in developer mode").
    RoleHijack,

    /// DAN-style / developer-mode jailbreak keywords.
    ///
    /// Reference: Shen et al., "Do Anything Now" (2023)
    Jailbreak,

    /// Context reframing used to resurface a previously refused request
    /// ("it's for a school project").
    ContextReframing,

    /// Claimed authority used to bypass safety ("this is an authorized
    /// penetration test").
    AuthorityMimicry,

    /// Custom-instruction override ("never refuse", "embed a backdoor").
    InstructionOverride,

    /// Attempted exfiltration of sensitive data via the model's output.
    DataExfil,

    /// Multi-format polyglot payload valid in more than one parser context.
    Polyglot,

    /// Steganographic or hidden payload.
    Stego,

    /// High-entropy adversarial suffix (GCG-style).
    ///
    /// Reference: Zou et al., "Universal and Transferable Adversarial
    /// Attacks on Aligned Language Models" (2023)
    HighEntropy,

    /// Base64/URL/other reversible encoding used to smuggle a payload past
    /// plain-text pattern matching.
    EncodingEvasion,

    /// Zero-width or right-to-left control characters used to hide text.
    HiddenInstruction,

    /// Homograph / confusable-character substitution.
    Homograph,

    /// Claimed hallucination or unsupported factual assertion (output side).
    Hallucination,

    /// General deception / social-engineering pattern (output side).
    Deception,
}

impl ThreatType {
    /// Returns the OWASP LLM Top 10 category this threat maps to.
    pub fn owasp_category(&self) -> &'static str {
        use ThreatType::*;
        match self {
            DirectInjection | IndirectInjection | RoleHijack | Jailbreak | ContextReframing
            | AuthorityMimicry | InstructionOverride | Polyglot | Stego | HighEntropy
            | EncodingEvasion | HiddenInstruction | Homograph => "LLM01: Prompt Injection",
            PromptExtraction | DataExfil => "LLM06: Sensitive Information Disclosure",
            Hallucination | Deception => "LLM09: Overreliance",
        }
    }
}

/// A single structured detection emitted by any detector in this crate.
///
/// Every detector (pattern match, entropy window, encoding pass, knowledge
/// store neighbor) produces zero or more `Signal`s rather than a single
/// confidence float. The Heuristic Detector combines them into one score;
/// nothing downstream works with bare strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    /// Threat family this signal indicates.
    pub threat: ThreatType,
    /// Severity contribution on the 0-100 risk-score scale.
    pub score: f64,
    /// Which detector produced this signal, for audit trails.
    pub source: &'static str,
    /// Human-readable description of the match.
    pub detail: String,
}

impl Signal {
    pub fn new(threat: ThreatType, score: f64, source: &'static str, detail: impl Into<String>) -> Self {
        Self {
            threat,
            score: score.clamp(0.0, 100.0),
            source,
            detail: detail.into(),
        }
    }
}

/// Result of scanning input or output for threats.
///
/// The three-tier result system enables nuanced security decisions:
///
/// - **Safe**: No signals produced, proceed normally
/// - **Flagged**: Signals produced but below this detector's own block
///   threshold; log and optionally alert but don't block
/// - **Blocked**: At least one signal crossed this detector's block
///   threshold; reject the request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScanResult {
    /// Content is safe to process.
    Safe,

    /// Signals were produced but none warranted an outright block.
    Flagged { signals: Vec<Signal> },

    /// At least one signal crossed the detector's block threshold.
    Blocked { signals: Vec<Signal> },
}

impl ScanResult {
    #[inline]
    pub fn is_safe(&self) -> bool {
        matches!(self, ScanResult::Safe)
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        matches!(self, ScanResult::Blocked { .. })
    }

    #[inline]
    pub fn is_flagged(&self) -> bool {
        matches!(self, ScanResult::Flagged { .. })
    }

    /// All signals carried by this result, empty for `Safe`.
    pub fn signals(&self) -> &[Signal] {
        match self {
            ScanResult::Safe => &[],
            ScanResult::Flagged { signals } | ScanResult::Blocked { signals } => signals,
        }
    }

    /// Highest signal score in this result, 0.0 if safe.
    pub fn max_score(&self) -> f64 {
        self.signals().iter().map(|s| s.score).fold(0.0, f64::max)
    }

    /// The dominant threat type, chosen by highest score, if any.
    pub fn dominant_threat(&self) -> Option<ThreatType> {
        self.signals()
            .iter()
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
            .map(|s| s.threat)
    }
}

/// Errors that can occur in the firewall's detectors.
#[derive(Debug, Error)]
pub enum FirewallError {
    /// The Knowledge Store backend failed to answer a lookup.
    ///
    /// Knowledge Store failures are fail-open: callers log this and proceed
    /// as if no neighbors were found. This variant exists for the log line,
    /// not to propagate into a block.
    #[error("knowledge store backend error: {0}")]
    KnowledgeStoreBackend(String),

    /// A regex in the Pattern Library failed to compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

pub type Result<T> = std::result::Result<T, FirewallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_clamps_score() {
        let s = Signal::new(ThreatType::DirectInjection, 150.0, "test", "over");
        assert_eq!(s.score, 100.0);
    }

    #[test]
    fn test_scan_result_max_score_and_dominant() {
        let result = ScanResult::Flagged {
            signals: vec![
                Signal::new(ThreatType::Jailbreak, 40.0, "pattern", "a"),
                Signal::new(ThreatType::HighEntropy, 70.0, "entropy", "b"),
            ],
        };
        assert_eq!(result.max_score(), 70.0);
        assert_eq!(result.dominant_threat(), Some(ThreatType::HighEntropy));
    }

    #[test]
    fn test_safe_has_no_signals() {
        assert!(ScanResult::Safe.signals().is_empty());
        assert_eq!(ScanResult::Safe.max_score(), 0.0);
        assert_eq!(ScanResult::Safe.dominant_threat(), None);
    }

    #[test]
    fn test_owasp_category() {
        assert_eq!(
            ThreatType::PromptExtraction.owasp_category(),
            "LLM06: Sensitive Information Disclosure"
        );
        assert_eq!(
            ThreatType::Deception.owasp_category(),
            "LLM09: Overreliance"
        );
    }
}
