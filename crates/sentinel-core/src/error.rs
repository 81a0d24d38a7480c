//! Error types for the Scanning Engine and Proxy Orchestrator.
//!
//! Spec §7's closed taxonomy: every variant the Orchestrator needs to map
//! onto one specific HTTP status and body shape, plus passthrough
//! variants for the component crates' own errors.

use thiserror::Error;

/// Core result type for sentinel operations.
pub type Result<T> = std::result::Result<T, SentinelError>;

#[derive(Debug, Error)]
pub enum SentinelError {
    /// No user-role message present in the request's `messages` array.
    #[error("no user message found in request")]
    NoUserMessage,

    /// `X-Upstream-Provider` or the model-id auto-route table named a
    /// provider this deployment has no adapter for.
    #[error("unsupported upstream provider: {0}")]
    UnsupportedProvider(String),

    /// No API key resolved through the header / per-user / server-wide
    /// chain.
    #[error("no API key configured for provider {0}")]
    NoKeyConfigured(String),

    /// The upstream provider could not be reached at all (not a non-2xx
    /// response, which is passed through as a status instead).
    #[error("upstream provider unreachable: {0}")]
    UpstreamUnreachable(String),

    /// The upstream provider answered with a non-2xx status, mirrored to
    /// the caller rather than treated as an internal failure.
    #[error("upstream error (status {status}): {message}")]
    UpstreamError { status: u16, message: String },

    /// The prompt scan blocked the request before any upstream call was made.
    #[error("prompt blocked: {0}")]
    SafetyBlockPrompt(String),

    /// The output scan blocked the assistant's response after the
    /// upstream call completed.
    #[error("output blocked: {0}")]
    SafetyBlockOutput(String),

    /// A required pre-upstream scan could not complete. Unlike a
    /// post-upstream scan failure (logged and annotated, never fatal),
    /// this always fails the request — a scan decision can't be skipped
    /// silently.
    #[error("scan failed: {0}")]
    ScanFailed(String),

    /// Configuration error (missing/invalid env var, bad provider table).
    #[error("configuration error: {0}")]
    Config(String),

    /// A persistence write failed. Logged, never rewrites the safety
    /// decision already made.
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),

    /// Internal error with no more specific variant.
    #[error("internal error: {0}")]
    Internal(String),

    /// Registry (Persistence Port) error passthrough.
    #[error("registry error: {0}")]
    Registry(#[from] sentinel_registry::RegistryError),

    /// Session Memory error passthrough.
    #[error("monitor error: {0}")]
    Monitor(#[from] sentinel_monitor::MonitorError),

    /// Council error passthrough. `NoValidVotes` is recovered by the
    /// Engine into a heuristic-only result rather than reaching here, so
    /// this only surfaces genuinely unrecoverable council failures.
    #[error("council error: {0}")]
    Council(#[from] sentinel_council::CouncilError),

    /// Firewall (Heuristic Detector / Knowledge Store) error passthrough.
    #[error("firewall error: {0}")]
    Firewall(#[from] sentinel_firewall::FirewallError),
}

impl SentinelError {
    /// The HTTP status the Orchestrator maps this error onto, per spec §7.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoUserMessage | Self::UnsupportedProvider(_) | Self::NoKeyConfigured(_) => 400,
            Self::SafetyBlockPrompt(_) | Self::SafetyBlockOutput(_) => 400,
            Self::UpstreamError { status, .. } => *status,
            Self::UpstreamUnreachable(_) => 502,
            Self::ScanFailed(_)
            | Self::Config(_)
            | Self::PersistenceFailed(_)
            | Self::Internal(_)
            | Self::Registry(_)
            | Self::Monitor(_)
            | Self::Council(_)
            | Self::Firewall(_) => 500,
        }
    }

    /// Machine-readable error code for the `error.code` field of spec §6's
    /// JSON error bodies. `SafetyBlockPrompt`/`SafetyBlockOutput` get
    /// distinct codes so a caller can tell which side of the upstream
    /// call the block happened on.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoUserMessage => "no_user_message",
            Self::UnsupportedProvider(_) => "unsupported_provider",
            Self::NoKeyConfigured(_) => "no_key_configured",
            Self::UpstreamUnreachable(_) => "upstream_unreachable",
            Self::UpstreamError { .. } => "upstream_error",
            Self::SafetyBlockPrompt(_) => "prompt_injection_detected",
            Self::SafetyBlockOutput(_) => "unsafe_output_detected",
            Self::ScanFailed(_) => "scan_failed",
            Self::Config(_) => "configuration_error",
            Self::PersistenceFailed(_) => "persistence_failed",
            Self::Internal(_)
            | Self::Registry(_)
            | Self::Monitor(_)
            | Self::Council(_)
            | Self::Firewall(_) => "internal_error",
        }
    }
}
