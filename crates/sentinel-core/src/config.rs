//! Configuration for the Scanning Engine and Proxy Orchestrator.
//!
//! Every field is env-overridable per spec §6, read once at process
//! start the way the teacher's `StateMonitorConfig` builder was read
//! once into `Sentinel::new` — no value here is re-read from the
//! environment mid-run.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Per-provider upstream settings: which model to call, how long to wait,
/// and which API key to use absent a caller-supplied one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub model: String,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// Reads `{PREFIX}_MODEL` / `{PREFIX}_TIMEOUT` / `{PREFIX}_API_KEY`,
    /// falling back to `default_model` and a 30s timeout.
    fn from_env(prefix: &str, default_model: &str) -> Self {
        let model = std::env::var(format!("{prefix}_MODEL")).unwrap_or_else(|_| default_model.to_string());
        let timeout_secs: u64 = env_or(&format!("{prefix}_TIMEOUT"), 30);
        let api_key = std::env::var(format!("{prefix}_API_KEY")).ok();
        Self { model, timeout: Duration::from_secs(timeout_secs), api_key }
    }
}

/// Council dispatch and consensus settings (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilConfig {
    pub timeout: Duration,
    pub enable_parallel: bool,
    pub min_consensus: f64,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(env_or("COUNCIL_TIMEOUT", 60)),
            enable_parallel: env_or("COUNCIL_ENABLE_PARALLEL", true),
            min_consensus: env_or("COUNCIL_MIN_CONSENSUS", 0.6),
        }
    }
}

/// Risk-score thresholds gating the Scanning Engine's verdict mapping
/// (spec §4.2/§6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub block: f64,
    pub flag: f64,
    pub confidence: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            block: env_or("RISK_THRESHOLD_BLOCK", 70.0),
            flag: env_or("RISK_THRESHOLD_FLAG", 40.0),
            confidence: env_or("CONFIDENCE_THRESHOLD", 0.7),
        }
    }
}

/// Top-level configuration for one running proxy/scanning process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    pub council: CouncilConfig,
    pub thresholds: RiskThresholds,
    pub providers: HashMap<String, ProviderConfig>,
    pub registry_db_path: std::path::PathBuf,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert("openai".to_string(), ProviderConfig::from_env("OPENAI", "gpt-4o-mini"));
        providers.insert("google".to_string(), ProviderConfig::from_env("GOOGLE", "gemini-1.5-flash"));
        providers.insert("cohere".to_string(), ProviderConfig::from_env("COHERE", "command-r"));
        // Remaining `X-Upstream-Provider` values from spec §6: passthrough-only
        // providers with no corresponding Council judge adapter.
        providers.insert("gemini2".to_string(), ProviderConfig::from_env("GEMINI2", "gemini-2.0-flash"));
        providers.insert("groq".to_string(), ProviderConfig::from_env("GROQ", "llama-3.3-70b-versatile"));
        providers.insert("grok2".to_string(), ProviderConfig::from_env("GROK2", "grok-2-latest"));
        providers.insert("openrouter".to_string(), ProviderConfig::from_env("OPENROUTER", "openrouter/auto"));
        providers.insert("anthropic".to_string(), ProviderConfig::from_env("ANTHROPIC", "claude-3-5-sonnet-latest"));

        Self {
            council: CouncilConfig::default(),
            thresholds: RiskThresholds::default(),
            providers,
            registry_db_path: std::env::var("SENTINEL_DB_PATH")
                .map(std::path::PathBuf::from)
                .unwrap_or_else(|_| std::path::PathBuf::from("./sentinel.db")),
        }
    }
}

impl SentinelConfig {
    pub fn provider(&self, provider_id: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_match_spec() {
        let thresholds = RiskThresholds::default();
        assert_eq!(thresholds.block, 70.0);
        assert_eq!(thresholds.flag, 40.0);
        assert_eq!(thresholds.confidence, 0.7);
    }

    #[test]
    fn test_default_council_config() {
        let council = CouncilConfig::default();
        assert_eq!(council.timeout, Duration::from_secs(60));
        assert!(council.enable_parallel);
        assert_eq!(council.min_consensus, 0.6);
    }

    #[test]
    fn test_default_providers_present() {
        let config = SentinelConfig::default();
        for id in ["openai", "google", "cohere", "gemini2", "groq", "grok2", "openrouter", "anthropic"] {
            assert!(config.provider(id).is_some(), "missing default provider: {id}");
        }
        assert!(config.provider("nonexistent").is_none());
    }
}
