//! # Persistence Port
//!
//! The abstract sink for every record family the Scanning Engine, Council,
//! and Orchestrator produce: `ScanRequest`, `RiskScore`, `CouncilDecision`,
//! `IndividualVote`, `AgentAction`, and the `AttackEntry` corpus backing the
//! Knowledge Store.
//!
//! This crate deliberately does not define those record types — they live
//! in `sentinel-core::types` so the dependency direction stays one-way
//! (`sentinel-core` depends on `sentinel-registry`, never the reverse).
//! `PersistencePort` is generic over any `Serialize + DeserializeOwned`
//! type, keyed by a caller-supplied id string, one [`Storage`] tree per
//! record family.
//!
//! ## Write-once semantics
//!
//! Per spec §3, `ScanRequest`, `RiskScore`, and `AttackEntry` are immutable
//! after insertion. `insert_once` enforces this; `CouncilDecision` and
//! `IndividualVote` are also insert-once in practice (never mutated once
//! recorded) and use the same method. `AgentAction` is the sole mutable
//! record (the `executed` transition), so it uses plain `put`.
//!
//! ## References
//!
//! - Sled documentation: <https://sled.rs/>

use serde::{de::DeserializeOwned, Serialize};

use crate::models::{RegistryError, Result};
use crate::storage::{self, Storage};

/// Facade over [`Storage`] exposing one typed method pair per record
/// family named in spec §6's persisted-state layout.
#[derive(Clone)]
pub struct PersistencePort {
    storage: Storage,
}

impl PersistencePort {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Storage::open(path)?))
    }

    pub fn temporary() -> Result<Self> {
        Ok(Self::new(Storage::temporary()?))
    }

    fn insert_once<T: Serialize>(&self, tree: &str, id: &str, record: &T) -> Result<()> {
        if self.storage.contains(tree, id)? {
            return Err(RegistryError::AlreadyExists(id.to_string()));
        }
        self.storage.put(tree, id, record)
    }

    pub fn insert_scan_request<T: Serialize>(&self, id: &str, record: &T) -> Result<()> {
        self.insert_once(storage::SCAN_REQUESTS, id, record)
    }

    pub fn get_scan_request<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        self.storage.get(storage::SCAN_REQUESTS, id)
    }

    pub fn insert_risk_score<T: Serialize>(&self, id: &str, record: &T) -> Result<()> {
        self.insert_once(storage::RISK_SCORES, id, record)
    }

    pub fn list_risk_scores<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.storage.list(storage::RISK_SCORES)
    }

    pub fn insert_council_decision<T: Serialize>(&self, id: &str, record: &T) -> Result<()> {
        self.insert_once(storage::COUNCIL_DECISIONS, id, record)
    }

    pub fn insert_individual_vote<T: Serialize>(&self, id: &str, record: &T) -> Result<()> {
        self.insert_once(storage::INDIVIDUAL_VOTES, id, record)
    }

    /// `AgentAction` is the one record family mutable in place (the
    /// `executed` transition), so this allows overwrite.
    pub fn put_agent_action<T: Serialize>(&self, id: &str, record: &T) -> Result<()> {
        self.storage.put(storage::AGENT_ACTIONS, id, record)
    }

    pub fn get_agent_action<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        self.storage.get(storage::AGENT_ACTIONS, id)
    }

    /// Inserts an `AttackEntry` into the corpus backing the Knowledge
    /// Store, keyed by its content-address id. A no-op (not an error) if
    /// the entry already exists, since the corpus is frequently reseeded
    /// from the same static baseline.
    pub fn insert_attack_entry<T: Serialize>(&self, id: &str, record: &T) -> Result<()> {
        if self.storage.contains(storage::ATTACK_ENTRIES, id)? {
            return Ok(());
        }
        self.storage.put(storage::ATTACK_ENTRIES, id, record)
    }

    pub fn list_attack_entries<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.storage.list(storage::ATTACK_ENTRIES)
    }

    pub fn attack_entry_count(&self) -> Result<usize> {
        self.storage.len(storage::ATTACK_ENTRIES)
    }

    pub fn flush(&self) -> Result<usize> {
        self.storage.flush()
    }
}
