//! # Sentinel Firewall - Heuristic Detection Layer
//!
//! The Semantic Firewall is the heuristics half of the Scanning Engine's
//! dual-layer safety pipeline. It runs entirely without model calls: a
//! compiled Pattern Library, an entropy/encoding filter, a homograph check,
//! and a content-addressed Knowledge Store of labeled attack examples, all
//! composed by the Heuristic Detector into one 0-100 score and a structured
//! signal bundle.
//!
//! ## Threat Model
//!
//! | Threat | Description | Defense |
//! |--------|-------------|---------|
//! | Direct Injection | "Ignore previous instructions" attacks | Pattern matching |
//! | Indirect Injection | Malicious content surfaced via retrieval | Knowledge Store + patterns |
//! | GCG Attacks | Adversarial suffixes (Zou et al., 2023) | Entropy filtering |
//! | Jailbreaks | DAN, role-play, mode-switching | Pattern + heuristics |
//! | Encoding Evasion | Base64/URL/zero-width smuggling | Encoding passes |
//! | Homograph | Cyrillic/Greek lookalike substitution | Codepoint ratio check |
//! | Multi-turn escalation | Exploratory turn then escalation turn | Session-aware correlation |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      HEURISTIC DETECTOR                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────┐  │
//! │  │  PERPLEXITY  │  │   PATTERN    │  │    KNOWLEDGE STORE   │  │
//! │  │   FILTER     │  │   LIBRARY    │  │         (RAG)        │  │
//! │  │              │  │              │  │                      │  │
//! │  │ Shannon H(X) │  │ Regex-based  │  │ Nearest-neighbor      │  │
//! │  │ + encoding   │  │ threat sigs  │  │ attack-example lookup │  │
//! │  └──────┬───────┘  └──────┬───────┘  └──────────┬───────────┘  │
//! │         │                 │                     │              │
//! │         └────────────┬────┴─────────────────────┘              │
//! │                      ▼                                         │
//! │              ┌───────────────┐                                 │
//! │              │ HeuristicResult│                                │
//! │              │ score + signals│                                │
//! │              └───────────────┘                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## References
//!
//! - **Zou et al. (2023)** - "Universal and Transferable Adversarial Attacks on
//!   Aligned Language Models" <https://arxiv.org/abs/2307.15043>
//! - **Greshake et al. (2023)** - "Not What You've Signed Up For" <https://arxiv.org/abs/2302.12173>
//! - **Perez & Ribeiro (2022)** - "Ignore This Title and HackAPrompt" <https://arxiv.org/abs/2311.16119>
//! - **OWASP LLM Top 10** <https://owasp.org/www-project-top-10-for-large-language-model-applications/>
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sentinel_firewall::{HeuristicDetector, HeuristicInput, PatternLibrary};
//!
//! let detector = HeuristicDetector::new(PatternLibrary::new());
//! let input = HeuristicInput::new("Can you help me with my code?");
//! let result = detector.scan_fast(&input, None, None);
//! println!("score: {}", result.score);
//! ```

pub mod heuristic;
pub mod knowledge_store;
pub mod models;
pub mod patterns;
pub mod perplexity;

pub use heuristic::{HeuristicDetector, HeuristicInput, HeuristicResult};
pub use knowledge_store::{AttackEntry, KnowledgeStore, Neighbor, Severity, VectorBackend};
pub use models::{FirewallError, ScanResult, Signal, ThreatType};
pub use patterns::PatternLibrary;
