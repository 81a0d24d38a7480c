//! # Session Memory
//!
//! Process-local, bounded per-session state enabling multi-turn attack
//! detection and refusal persistence. Every scan that carries a session
//! id reads and writes through here: the Heuristic Detector correlates an
//! exploratory turn against a later escalation turn, and re-checks
//! pressure-tactic phrasing against the session's refusal history.
//!
//! ## Threat Model
//!
//! MCP-adjacent proxy deployments face multi-turn adversaries that never
//! trip a single-prompt detector:
//! - **Escalation**: an innocuous turn sets context, a later turn in the
//!   same session carries the actual attack.
//! - **Low-and-slow probing**: many individually low-scoring prompts in
//!   one session accumulate into a clear abuse pattern.
//! - **Refusal re-framing**: a refused request reappears reworded as
//!   "for a school project" or "my teacher said it's fine."
//!
//! ## Design
//!
//! 1. [`TurnHistory`] bounds the retained turn previews (last 20, capped
//!    at 200 chars) and the full refusal log for one session.
//! 2. [`CumulativeRisk`] accumulates every scan's score for a session,
//!    optionally checked against a ceiling.
//! 3. [`SessionMemory`] is the facade: one [`std::sync::Mutex`]-guarded
//!    state per session id, single-writer-per-session, lock-free
//!    snapshot reads via cloning.
//!
//! ## References
//!
//! - Greshake et al. (2023), "Not What You've Signed Up For" — multi-turn
//!   indirect prompt injection. <https://arxiv.org/abs/2302.12173>
//!
//! ## Example
//!
//! ```rust
//! use sentinel_monitor::SessionMemory;
//!
//! let memory = SessionMemory::new();
//! memory.record_turn("session-1", "what's the weather like?").unwrap();
//! memory.accumulate_risk("session-1", 5.0).unwrap();
//!
//! let snapshot = memory.snapshot("session-1").unwrap().unwrap();
//! assert_eq!(snapshot.cumulative_risk, 5.0);
//! ```

mod budget;
mod error;
mod session;
mod turn;

pub use budget::CumulativeRisk;
pub use error::{MonitorError, Result};
pub use session::{SessionMemory, SessionSnapshot};
pub use turn::{Refusal, TurnHistory, MAX_TURNS, PREVIEW_LEN};
