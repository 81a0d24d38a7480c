//! # Persistent Storage Layer
//!
//! This module provides the low-level Sled-backed storage used by the
//! Persistence Port. Every record type the Port manages lives in its own
//! tree (namespace); records are opaque JSON blobs here — this module knows
//! nothing about `ScanRequest`, `RiskScore`, or any other `sentinel-core`
//! type, it just stores bytes keyed by id under a tree name. That keeps the
//! dependency direction one-way: `sentinel-core` depends on this crate, not
//! the other way around.
//!
//! ## Threat Model
//!
//! - **Data Loss**: ACID transactions ensure consistency even on crash.
//! - **Corruption**: Sled's log-structured storage detects corruption.
//! - **Long-held transactions**: every write here is a single short-lived
//!   insert; no multi-record transaction spans a scan (spec §5).
//!
//! ## Storage Structure
//!
//! One tree per record family: `scan_requests`, `risk_scores`,
//! `council_decisions`, `individual_votes`, `agent_actions`,
//! `attack_entries`.
//!
//! ## References
//!
//! - Sled documentation: <https://sled.rs/>

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::models::{RegistryError, Result};

pub const SCAN_REQUESTS: &str = "scan_requests";
pub const RISK_SCORES: &str = "risk_scores";
pub const COUNCIL_DECISIONS: &str = "council_decisions";
pub const INDIVIDUAL_VOTES: &str = "individual_votes";
pub const AGENT_ACTIONS: &str = "agent_actions";
pub const ATTACK_ENTRIES: &str = "attack_entries";

const ALL_TREES: &[&str] = &[
    SCAN_REQUESTS,
    RISK_SCORES,
    COUNCIL_DECISIONS,
    INDIVIDUAL_VOTES,
    AGENT_ACTIONS,
    ATTACK_ENTRIES,
];

/// Wrapper around a Sled database exposing one tree per record family.
///
/// # Thread Safety
///
/// The underlying Sled database is thread-safe; multiple threads can read
/// and write concurrently.
#[derive(Clone)]
pub struct Storage {
    db: sled::Db,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Storage { db })
    }

    /// Creates a temporary in-memory storage for testing.
    pub fn temporary() -> Result<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Ok(Storage { db })
    }

    fn tree(&self, name: &str) -> Result<sled::Tree> {
        Ok(self.db.open_tree(name)?)
    }

    /// Inserts a record, serialized as JSON, under `tree`/`id`. Overwrites
    /// any existing value at that key; callers enforcing write-once
    /// semantics (scan requests, risk scores, attack entries) should check
    /// `contains` first.
    pub fn put<T: Serialize>(&self, tree: &str, id: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.tree(tree)?.insert(id.as_bytes(), bytes)?;
        Ok(())
    }

    /// Loads and deserializes a record by id, or `None` if absent.
    pub fn get<T: DeserializeOwned>(&self, tree: &str, id: &str) -> Result<Option<T>> {
        match self.tree(tree)?.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Loads a record, returning `RegistryError::NotFound` if absent.
    pub fn require<T: DeserializeOwned>(&self, tree: &str, id: &str) -> Result<T> {
        self.get(tree, id)?.ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub fn contains(&self, tree: &str, id: &str) -> Result<bool> {
        Ok(self.tree(tree)?.contains_key(id.as_bytes())?)
    }

    /// All ids present in `tree`, in lexicographic key order.
    pub fn list_ids(&self, tree: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in self.tree(tree)?.iter() {
            let (key, _) = entry?;
            ids.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(ids)
    }

    /// All records in `tree`, in key order.
    pub fn list<T: DeserializeOwned>(&self, tree: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for entry in self.tree(tree)?.iter() {
            let (_, bytes) = entry?;
            values.push(serde_json::from_slice(&bytes)?);
        }
        Ok(values)
    }

    pub fn len(&self, tree: &str) -> Result<usize> {
        Ok(self.tree(tree)?.len())
    }

    pub fn is_empty(&self, tree: &str) -> Result<bool> {
        Ok(self.tree(tree)?.is_empty())
    }

    /// Flushes all pending writes to disk across every known tree.
    pub fn flush(&self) -> Result<usize> {
        let mut total = 0;
        for name in ALL_TREES {
            total += self.tree(name)?.flush()?;
        }
        Ok(total)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").field("path", &self.db.was_recovered()).finish()
    }
}
