//! # Bounded Turn History
//!
//! Tracks the last N user turns and recorded refusals for a single
//! session, the way [`crate::cycle::CycleDetector`] tracks a bounded
//! execution path — except here the record never triggers a halt, it is
//! read back by the Heuristic Detector to correlate multi-turn attacks
//! (an exploratory turn followed by an escalation turn) and to enforce
//! refusal persistence (a later turn re-framing a previously refused
//! request).
//!
//! ## Threat Model
//!
//! - **Escalation attacks**: benign-seeming turn establishes context,
//!   a later turn in the same session escalates to the actual attack.
//! - **Refusal re-framing**: a request is refused, then re-issued with
//!   "for a school project" or similar pressure framing.
//!
//! ## Retention Policy
//!
//! The last `MAX_TURNS` (20) turn previews and all refusals are kept;
//! older turns are evicted oldest-first. Previews are capped at
//! `PREVIEW_LEN` (200) chars to bound memory and avoid persisting full
//! prompt text in memory longer than needed.

use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum number of turn previews retained per session.
pub const MAX_TURNS: usize = 20;

/// Maximum length, in chars, of a stored text preview.
pub const PREVIEW_LEN: usize = 200;

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_LEN).collect()
}

/// A recorded refusal: what was asked, why it was refused, and when.
#[derive(Debug, Clone, PartialEq)]
pub struct Refusal {
    pub prompt_preview: String,
    pub reason: String,
    pub timestamp: u64,
}

impl Refusal {
    pub fn new(prompt: &str, reason: impl Into<String>, timestamp: u64) -> Self {
        Self { prompt_preview: preview(prompt), reason: reason.into(), timestamp }
    }
}

/// Bounded per-session turn and refusal history.
#[derive(Debug, Clone, Default)]
pub struct TurnHistory {
    turns: Vec<String>,
    refusals: Vec<Refusal>,
}

impl TurnHistory {
    pub fn new() -> Self {
        Self { turns: Vec::new(), refusals: Vec::new() }
    }

    /// Appends a turn preview, evicting the oldest entry once `MAX_TURNS`
    /// is reached.
    pub fn record_turn(&mut self, text: &str) {
        if self.turns.len() >= MAX_TURNS {
            self.turns.remove(0);
        }
        self.turns.push(preview(text));
    }

    /// Records a refusal at the current wall-clock time.
    pub fn record_refusal(&mut self, prompt: &str, reason: impl Into<String>) {
        let timestamp =
            SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        self.refusals.push(Refusal::new(prompt, reason, timestamp));
    }

    pub fn turns(&self) -> &[String] {
        &self.turns
    }

    pub fn refusals(&self) -> &[Refusal] {
        &self.refusals
    }

    pub fn has_refusals(&self) -> bool {
        !self.refusals.is_empty()
    }

    pub fn last_turn(&self) -> Option<&str> {
        self.turns.last().map(String::as_str)
    }
}
