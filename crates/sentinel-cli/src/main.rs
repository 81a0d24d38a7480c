//! Sentinel CLI - command-line entry point for the scanning proxy.
//!
//! A thin binary over [`sentinel_core::Sentinel`]: configuration is entirely
//! env-driven (spec §6), so there is no config-file format to parse here.
//! `Start` builds a `Sentinel` and blocks; `Check` builds one and exits;
//! `Scan` is a one-shot prompt scan for local testing and scripting.

use clap::Parser;
use sentinel_core::{Sentinel, SentinelConfig};

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Sentinel - LLM prompt/output safety scanning proxy")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Build the Sentinel pipeline and hold the process open.
    Start,
    /// Build the Sentinel pipeline and report whether every component
    /// wired up cleanly, then exit.
    Check,
    /// Scan a single prompt through the full pipeline and print the
    /// resulting risk score.
    Scan {
        /// Prompt text to scan.
        text: String,
    },
}

fn status_line(config: &SentinelConfig) -> String {
    let configured: Vec<&str> =
        config.providers.iter().filter(|(_, p)| p.api_key.is_some()).map(|(id, _)| id.as_str()).collect();
    format!(
        "registry={} providers_with_keys={:?} risk_thresholds=(flag={}, block={})",
        config.registry_db_path.display(),
        configured,
        config.thresholds.flag,
        config.thresholds.block,
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Start) => {
            let config = SentinelConfig::default();
            let sentinel = Sentinel::new(config)?;
            tracing::info!("{}", status_line(sentinel.config()));
            println!("Sentinel is running. {}", status_line(sentinel.config()));
            // A full HTTP routing front-end is out of scope (SPEC_FULL.md
            // §1); the binary stays up so a reverse proxy or test harness
            // can drive `Sentinel` in-process.
            std::future::pending::<()>().await;
        }
        Some(Commands::Check) => {
            let config = SentinelConfig::default();
            match Sentinel::new(config) {
                Ok(sentinel) => println!("OK: {}", status_line(sentinel.config())),
                Err(e) => {
                    eprintln!("FAILED: {e}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Scan { text }) => {
            let sentinel = Sentinel::new(SentinelConfig::default())?;
            let score = sentinel.scan_prompt(&text, None, None).await?;
            println!(
                "verdict={:?} risk_score={:.1} risk_level={} explanation={}",
                score.verdict, score.risk_score, score.risk_level, score.explanation
            );
        }
        None => {
            println!("Sentinel - use --help for commands");
        }
    }

    Ok(())
}
