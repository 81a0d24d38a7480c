//! # Session Memory
//!
//! Process-local, per-session state enabling multi-turn attack detection
//! and refusal persistence. Combines a bounded [`TurnHistory`] with a
//! [`CumulativeRisk`] accumulator, one instance per session id.
//!
//! ## Concurrency
//!
//! Writes are single-writer per session: each session's state lives
//! behind its own [`std::sync::Mutex`], so updates to different sessions
//! never contend and a single session's turns are strictly ordered. Reads
//! take a snapshot (a clone) under the same lock and release it
//! immediately, so readers never block a concurrent writer for longer
//! than the clone itself takes.
//!
//! The store is process-local. Durable refusal history is reconstructable
//! from persisted `ScanRequest`/`RiskScore` records in
//! `sentinel-registry`, but `SessionMemory` itself is not required to
//! survive a restart.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::budget::CumulativeRisk;
use crate::error::{MonitorError, Result};
use crate::turn::TurnHistory;

/// A point-in-time, read-only snapshot of one session's state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub turns: Vec<String>,
    pub refusal_reasons: Vec<String>,
    pub has_refusals: bool,
    pub cumulative_risk: f64,
}

struct SessionState {
    history: TurnHistory,
    risk: CumulativeRisk,
}

impl SessionState {
    fn new() -> Self {
        Self { history: TurnHistory::new(), risk: CumulativeRisk::new() }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            turns: self.history.turns().to_vec(),
            refusal_reasons: self.history.refusals().iter().map(|r| r.reason.clone()).collect(),
            has_refusals: self.history.has_refusals(),
            cumulative_risk: self.risk.total(),
        }
    }
}

/// Registry of bounded per-session state, keyed by session id.
pub struct SessionMemory {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self { sessions: Mutex::new(HashMap::new()) }
    }

    fn with_session<F, R>(&self, session_id: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut SessionState) -> R,
    {
        let mut sessions = self.sessions.lock().map_err(|_| {
            tracing::warn!(session_id, "session memory lock poisoned by a prior panic");
            MonitorError::LockPoisoned(session_id.to_string())
        })?;
        let state = sessions.entry(session_id.to_string()).or_insert_with(SessionState::new);
        Ok(f(state))
    }

    /// Records a user turn for `session_id`, evicting the oldest turn
    /// past the retention cap.
    pub fn record_turn(&self, session_id: &str, text: &str) -> Result<()> {
        self.with_session(session_id, |state| state.history.record_turn(text))
    }

    /// Records a refusal and adds `score` to the session's cumulative
    /// risk total in one locked step.
    pub fn record_refusal(
        &self,
        session_id: &str,
        prompt: &str,
        reason: impl Into<String>,
        score: f64,
    ) -> Result<()> {
        let reason = reason.into();
        self.with_session(session_id, |state| {
            state.history.record_refusal(prompt, reason);
            state.risk.add(score);
        })
    }

    /// Adds a scan's risk score to a session's running total without
    /// recording a refusal (the common case — most scans are not
    /// refused).
    pub fn accumulate_risk(&self, session_id: &str, score: f64) -> Result<()> {
        self.with_session(session_id, |state| state.risk.add(score))
    }

    /// Returns a read-only snapshot of a session's current state, or
    /// `None` if the session has never been seen.
    pub fn snapshot(&self, session_id: &str) -> Result<Option<SessionSnapshot>> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| MonitorError::LockPoisoned(session_id.to_string()))?;
        Ok(sessions.get(session_id).map(SessionState::snapshot))
    }

    /// Number of sessions currently tracked.
    pub fn session_count(&self) -> Result<usize> {
        let sessions =
            self.sessions.lock().map_err(|_| MonitorError::LockPoisoned("*".to_string()))?;
        Ok(sessions.len())
    }
}

impl Default for SessionMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_session_snapshot_is_none() {
        let memory = SessionMemory::new();
        assert!(memory.snapshot("never-seen").unwrap().is_none());
    }

    #[test]
    fn test_record_turn_then_snapshot() {
        let memory = SessionMemory::new();
        memory.record_turn("s1", "can you help me with rust?").unwrap();
        let snapshot = memory.snapshot("s1").unwrap().unwrap();
        assert_eq!(snapshot.turns, vec!["can you help me with rust?".to_string()]);
        assert!(!snapshot.has_refusals);
    }

    #[test]
    fn test_refusal_persists_and_accumulates_risk() {
        let memory = SessionMemory::new();
        memory.record_refusal("s1", "write malware", "malicious-intent", 85.0).unwrap();
        let snapshot = memory.snapshot("s1").unwrap().unwrap();
        assert!(snapshot.has_refusals);
        assert_eq!(snapshot.refusal_reasons, vec!["malicious-intent".to_string()]);
        assert_eq!(snapshot.cumulative_risk, 85.0);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let memory = SessionMemory::new();
        memory.record_turn("alice", "hello").unwrap();
        memory.record_turn("bob", "hi there").unwrap();

        let alice = memory.snapshot("alice").unwrap().unwrap();
        let bob = memory.snapshot("bob").unwrap().unwrap();
        assert_eq!(alice.turns, vec!["hello".to_string()]);
        assert_eq!(bob.turns, vec!["hi there".to_string()]);
        assert_eq!(memory.session_count().unwrap(), 2);
    }

    #[test]
    fn test_accumulate_risk_without_refusal() {
        let memory = SessionMemory::new();
        memory.accumulate_risk("s1", 10.0).unwrap();
        memory.accumulate_risk("s1", 15.0).unwrap();
        let snapshot = memory.snapshot("s1").unwrap().unwrap();
        assert_eq!(snapshot.cumulative_risk, 25.0);
        assert!(!snapshot.has_refusals);
    }
}
