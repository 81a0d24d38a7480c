//! Error types for Session Memory.
//!
//! Provides structured error handling for per-session turn history and
//! cumulative risk tracking.

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur during session memory operations.
///
/// # Security Notes
///
/// Error messages are designed to provide useful debugging information
/// without leaking sensitive turn content to potential attackers.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A session lock was poisoned by a panicking writer.
    ///
    /// Indicates a prior single-writer update panicked mid-mutation; the
    /// session's state is no longer trustworthy.
    #[error("session lock poisoned for session {0}")]
    LockPoisoned(String),

    /// The cumulative risk budget for a session has been exceeded.
    #[error("risk budget exceeded for session {session_id}: {accumulated} > {limit}")]
    RiskBudgetExceeded {
        /// Session identifier.
        session_id: String,
        /// Accumulated risk total.
        accumulated: f64,
        /// Configured ceiling.
        limit: f64,
    },
}
