//! # Sentinel Registry - Persistence Port
//!
//! The Persistence Port is the storage boundary between the Scanning
//! Engine / Council / Orchestrator and the disk: every `ScanRequest`,
//! `RiskScore`, `CouncilDecision`, `IndividualVote`, and `AgentAction` the
//! system produces passes through here on its way to a Sled-backed tree,
//! and the `AttackEntry` corpus backing the Knowledge Store is seeded and
//! read through the same port.
//!
//! ## Purpose
//!
//! This crate implements three capabilities:
//!
//! 1. **RFC 8785 Canonicalization** - Deterministic JSON serialization and
//!    SHA-256 content-addressing, used to derive stable ids for scan
//!    requests and attack-corpus entries regardless of field ordering.
//!
//! 2. **Generic Tree Storage** - A Sled-backed key-value layer, one tree
//!    per record family, oblivious to the concrete record types (which
//!    live in `sentinel-core`) so the dependency direction stays one-way.
//!
//! 3. **Persistence Port** - The typed facade the rest of the system
//!    calls: insert-once semantics for immutable records, mutable puts
//!    for `AgentAction`, and corpus listing for the Knowledge Store.
//!
//! ## Threat Model
//!
//! | Threat | Description | Defense |
//! |--------|-------------|---------|
//! | Record Tampering | Stored scan history altered after the fact | Write-once trees for immutable records |
//! | Replay | Old scan record reused as if current | Content-addressed ids |
//! | Hash Collision | Crafted text with colliding hash | SHA-256 collision resistance |
//! | Key Reordering | Equivalent JSON hashing differently | RFC 8785 canonicalization |
//! | Corpus Poisoning | Malicious attack example smuggled into the corpus | Insert-once id dedup |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       PERSISTENCE PORT                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌───────────────────┐            ┌──────────────────────────┐ │
//! │  │   CANONICALIZER    │   hash     │        STORAGE           │ │
//! │  │  RFC 8785 + SHA-256 │──────────▶│  one Sled tree per       │ │
//! │  │                     │            │  record family:         │ │
//! │  └───────────────────┘            │  scan_requests           │ │
//! │                                    │  risk_scores             │ │
//! │                                    │  council_decisions       │ │
//! │                                    │  individual_votes        │ │
//! │                                    │  agent_actions           │ │
//! │                                    │  attack_entries          │ │
//! │                                    └──────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## References
//!
//! - **RFC 8785 (2020)** - "JSON Canonicalization Scheme (JCS)"
//!   <https://www.rfc-editor.org/rfc/rfc8785>
//! - **NIST FIPS 180-4** - "Secure Hash Standard (SHS)" - SHA-256 specification.
//!   <https://csrc.nist.gov/publications/detail/fips/180/4/final>
//! - **Sled Documentation** <https://sled.rs/>
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sentinel_registry::{PersistencePort, attack_entry_id};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct ScanRequest { text: String }
//!
//! let port = PersistencePort::open("./registry.db").unwrap();
//! let record = ScanRequest { text: "hello".to_string() };
//! let id = attack_entry_id("user-input", &record.text);
//! port.insert_scan_request(&id, &record).unwrap();
//! ```

pub mod canonicalize;
pub mod models;
pub mod persistence;
pub mod storage;

pub use canonicalize::{attack_entry_id, canonicalize, hash_canonical, hash_text};
pub use models::{Hash, RegistryError, Result, HASH_SIZE};
pub use persistence::PersistencePort;

#[cfg(test)]
mod tests;
