//! Error types for the LLM Council and Adversarial Hardener.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CouncilError>;

/// Errors that can occur during council operations.
#[derive(Debug, Error)]
pub enum CouncilError {
    /// Every dispatched provider adapter returned an error or an
    /// unparseable response; there is no vote left to aggregate.
    #[error("no provider produced a valid vote this round")]
    NoValidVotes,

    /// A provider adapter's HTTP call or response shape failed.
    #[error("provider adapter error: {0}")]
    AdapterError(String),

    /// An analysis_type could not be routed to a safety role.
    #[error("role routing error: {0}")]
    RoleRoutingError(String),

    /// Weighted consensus could not be computed (e.g. zero total weight).
    #[error("consensus failure: {0}")]
    ConsensusFailure(String),

    /// Internal council error.
    #[error("internal council error: {0}")]
    Internal(String),
}
