//! # DER Node
//!
//! Command-line driver for the certificate ledger.
//!
//! ## Commands
//!
//! - `scenario` (default): register a producer, issue it a certificate,
//!   run a spoofing attack, roll back to before the attack and validate
//! - `attack <kind>`: run one attack and measure recovery
//! - `activity`: legitimate vs. malicious node breakdown
//!
//! ## Configuration
//!
//! A JSON file given by `--config` or `DER_CONFIG`, then these overrides:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DER_NOISE_SCALE` | `noise.scale` |
//! | `DER_NOISE_SEED` | `noise.seed` |
//! | `DER_FLOOD_TRANSACTIONS` | `flood.transactions` |
//!
//! Ctrl+C cancels a running attack; blocks already appended stay on the chain.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use der_ledger::{
    ActivitySummary, AttackReport, CancelToken, CertificateLedgerApi, IssueOutcome, LedgerConfig,
    LedgerService, MetricsSnapshot, NodeRole, RecoveryReport,
};

/// DER Node: certificate ledger scenarios
#[derive(Parser, Debug)]
#[command(name = "der-node")]
#[command(about = "Run certificate issuance and attack scenarios against a DER ledger")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Register, issue, spoof, roll back and validate
    Scenario {
        /// Producer node (re)registered and issued the certificate
        #[arg(long, default_value = "Node1")]
        node: String,

        /// Certificate contents
        #[arg(long, default_value = "Certificate A")]
        certificate: String,
    },
    /// Run one attack (replay, spoofing, flood) and measure recovery
    Attack {
        /// Attack kind
        kind: String,
    },
    /// Show node activity
    Activity,
}

impl Default for Command {
    fn default() -> Self {
        Self::Scenario {
            node: "Node1".to_string(),
            certificate: "Certificate A".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Report {
    Scenario {
        issued: IssueOutcome,
        attack: AttackReport,
        length_after_rollback: u64,
        chain_valid: bool,
        activity: ActivitySummary,
        metrics: MetricsSnapshot,
    },
    Attack {
        recovery: RecoveryReport,
        metrics: MetricsSnapshot,
    },
    Activity {
        activity: ActivitySummary,
    },
}

impl Report {
    fn render(&self) -> String {
        match self {
            Self::Scenario {
                issued,
                attack,
                length_after_rollback,
                chain_valid,
                activity,
                ..
            } => {
                let mut out = format!(
                    "issued block {} in {:.6}s (noise {:+.4})\n",
                    issued.block.index, issued.duration_seconds, issued.noise
                );
                if let AttackReport::Spoofing(spoof) = attack {
                    out.push_str(&format!(
                        "spoofing: {} issued={}\n",
                        spoof.fake_node_id,
                        spoof.issue_result.is_issued()
                    ));
                }
                out.push_str(&format!(
                    "rolled back to {} blocks, chain valid: {}\n",
                    length_after_rollback, chain_valid
                ));
                out.push_str(&render_activity(activity));
                out
            }
            Self::Attack { recovery, .. } => {
                let mut out = format!(
                    "{}: recovered in {:.6}s, chain valid: {}\n",
                    recovery.attack_type.title(),
                    recovery.recovery_duration_seconds,
                    recovery.chain_valid_after
                );
                if let AttackReport::Flood(flood) = &recovery.attack_report {
                    out.push_str(&format!(
                        "flood: {} tx in {:.6}s (avg {:.9}s), recovery {:.6}s after {} probes\n",
                        flood.transactions_processed,
                        flood.total_time,
                        flood.average_transaction_time,
                        flood.recovery_time,
                        flood.recovery_probes
                    ));
                }
                out
            }
            Self::Activity { activity } => render_activity(activity),
        }
    }
}

fn render_activity(activity: &ActivitySummary) -> String {
    format!(
        "nodes: {} legitimate {} ({:.1}%) malicious {} ({:.1}%)\n",
        activity.total,
        activity.legitimate_count,
        activity.legitimate_percentage,
        activity.malicious_count,
        activity.malicious_percentage
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file and environment.
fn load_config(path: Option<&Path>) -> Result<LedgerConfig> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("DER_CONFIG").map(PathBuf::from));

    let mut config = match &path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            info!(path = %path.display(), "[der-node] loaded config file");
            LedgerConfig::from_json_str(&raw)?
        }
        None => LedgerConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn apply_env_overrides(config: &mut LedgerConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(value) = lookup("DER_NOISE_SCALE") {
        match value.parse() {
            Ok(scale) => config.noise.scale = scale,
            Err(_) => warn!(%value, "[der-node] ignoring invalid DER_NOISE_SCALE"),
        }
    }
    if let Some(value) = lookup("DER_NOISE_SEED") {
        match value.parse() {
            Ok(seed) => config.noise.seed = Some(seed),
            Err(_) => warn!(%value, "[der-node] ignoring invalid DER_NOISE_SEED"),
        }
    }
    if let Some(value) = lookup("DER_FLOOD_TRANSACTIONS") {
        match value.parse() {
            Ok(transactions) => config.flood.transactions = transactions,
            Err(_) => warn!(%value, "[der-node] ignoring invalid DER_FLOOD_TRANSACTIONS"),
        }
    }
}

fn run_command(ledger: &LedgerService, command: Command, cancel: &CancelToken) -> Result<Report> {
    match command {
        Command::Scenario { node, certificate } => {
            ledger.register_node(&node, NodeRole::Producer, true)?;
            let issued = ledger
                .issue_certificate(&node, &certificate)
                .with_context(|| format!("issuing to {}", node))?;
            let checkpoint = ledger.chain_len();

            let attack = ledger.simulate_attack_with_cancel("spoofing", cancel)?;
            let length_after_rollback = ledger.rollback(checkpoint)?;
            let chain_valid = ledger.validate_chain();

            Ok(Report::Scenario {
                issued,
                attack,
                length_after_rollback,
                chain_valid,
                activity: ledger.get_node_activity(),
                metrics: ledger.metrics(),
            })
        }
        Command::Attack { kind } => {
            let recovery = ledger.measure_recovery_with_cancel(&kind, cancel)?;
            Ok(Report::Attack {
                recovery,
                metrics: ledger.metrics(),
            })
        }
        Command::Activity => Ok(Report::Activity {
            activity: ledger.get_node_activity(),
        }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = load_config(args.config.as_deref())?;
    let ledger = Arc::new(LedgerService::new(config).context("failed to initialize ledger")?);
    let cancel = CancelToken::new();
    let command = args.command.unwrap_or_default();

    let mut worker = {
        let ledger = Arc::clone(&ledger);
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || run_command(&ledger, command, &cancel))
    };

    let report = tokio::select! {
        joined = &mut worker => joined?,
        _ = tokio::signal::ctrl_c() => {
            warn!("[der-node] interrupt received, cancelling");
            cancel.cancel();
            worker.await?
        }
    }?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}
