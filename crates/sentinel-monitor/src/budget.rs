//! # Cumulative Risk Budget
//!
//! Tracks a per-session running total of risk scores contributed by each
//! scan. Where [`crate::gas::GasBudget`] started full and depleted with
//! every operation, `CumulativeRisk` starts empty and accumulates: each
//! `RiskScore` the Scanning Engine produces for a session adds its score to
//! the running total, and callers can check that total against a
//! configured ceiling to flag sessions drifting toward sustained abuse
//! across many individually-unremarkable turns.
//!
//! ## Design
//!
//! A single session sending twenty prompts that each score 15/100 never
//! trips the per-request verdict threshold, but the cumulative total (300)
//! makes the pattern visible. `CumulativeRisk` exists to surface that.
//!
//! ## Security Notes
//!
//! - The total is monotonically non-decreasing; only `reset` can lower it.
//! - Accumulation happens regardless of the per-request verdict — even
//!   `Safe` scores contribute, so low-and-slow probing still accrues.

use crate::error::{MonitorError, Result};

/// Accumulates per-session risk contributions and checks them against an
/// optional ceiling.
#[derive(Debug, Clone)]
pub struct CumulativeRisk {
    total: f64,
    contributions: u64,
    ceiling: Option<f64>,
}

impl CumulativeRisk {
    /// Creates a tracker with no ceiling; `check` never fails.
    #[must_use]
    pub const fn new() -> Self {
        Self { total: 0.0, contributions: 0, ceiling: None }
    }

    /// Creates a tracker that flags sessions whose running total exceeds
    /// `ceiling`.
    #[must_use]
    pub const fn with_ceiling(ceiling: f64) -> Self {
        Self { total: 0.0, contributions: 0, ceiling: Some(ceiling) }
    }

    /// Returns the accumulated total.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// Returns the number of scores added so far.
    #[inline]
    #[must_use]
    pub const fn contributions(&self) -> u64 {
        self.contributions
    }

    /// Adds `score` (expected in `[0, 100]`) to the running total.
    pub fn add(&mut self, score: f64) {
        self.total += score.max(0.0);
        self.contributions += 1;
    }

    /// Adds `score`, then checks the running total against the configured
    /// ceiling, if any.
    pub fn add_and_check(&mut self, score: f64, session_id: &str) -> Result<()> {
        self.add(score);
        self.check(session_id)
    }

    /// Checks the current total against the ceiling without adding.
    pub fn check(&self, session_id: &str) -> Result<()> {
        if let Some(limit) = self.ceiling {
            if self.total > limit {
                return Err(MonitorError::RiskBudgetExceeded {
                    session_id: session_id.to_string(),
                    accumulated: self.total,
                    limit,
                });
            }
        }
        Ok(())
    }

    /// Resets the running total to zero, keeping the configured ceiling.
    pub fn reset(&mut self) {
        self.total = 0.0;
        self.contributions = 0;
    }
}

impl Default for CumulativeRisk {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_across_additions() {
        let mut risk = CumulativeRisk::new();
        risk.add(15.0);
        risk.add(20.0);
        risk.add(5.0);
        assert_eq!(risk.total(), 40.0);
        assert_eq!(risk.contributions(), 3);
    }

    #[test]
    fn test_no_ceiling_never_fails() {
        let mut risk = CumulativeRisk::new();
        for _ in 0..50 {
            risk.add(90.0);
        }
        assert!(risk.check("session-1").is_ok());
    }

    #[test]
    fn test_ceiling_trips_after_low_and_slow_accumulation() {
        let mut risk = CumulativeRisk::with_ceiling(100.0);
        for _ in 0..6 {
            risk.add(15.0);
        }
        let result = risk.check("session-low-slow");
        assert!(matches!(result, Err(MonitorError::RiskBudgetExceeded { .. })));
    }

    #[test]
    fn test_add_and_check_combines_steps() {
        let mut risk = CumulativeRisk::with_ceiling(50.0);
        assert!(risk.add_and_check(30.0, "s1").is_ok());
        assert!(risk.add_and_check(30.0, "s1").is_err());
    }

    #[test]
    fn test_reset_clears_total_but_keeps_ceiling() {
        let mut risk = CumulativeRisk::with_ceiling(10.0);
        risk.add(50.0);
        risk.reset();
        assert_eq!(risk.total(), 0.0);
        assert!(risk.check("session-1").is_ok());
    }

    #[test]
    fn test_negative_score_does_not_reduce_total() {
        let mut risk = CumulativeRisk::new();
        risk.add(-10.0);
        assert_eq!(risk.total(), 0.0);
    }
}
