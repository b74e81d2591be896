//! Adversarial scenarios run against the in-process ledger
//!
//! | Kind | Effect on the chain | Integrity after |
//! |------|---------------------|-----------------|
//! | Replay | one honestly-linked duplicate of the tail payload | valid |
//! | Spoofing | one certificate for a freshly registered malicious id | valid |
//! | Flood | `transactions` filler blocks plus recovery probes | valid |
//!
//! None of the scenarios forge links: they show what a single writer accepts
//! without complaint, not how to break the hash chain.

use super::block::Block;
use super::chain::HashChain;
use super::issuer::{CertificateIssuer, IssueOutcome};
use super::noise::rng_from_seed;
use super::registry::{NodeRegistry, NodeRole};
use crate::config::FloodConfig;
use crate::error::{LedgerError, Result};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Payload used for spoofed certificates
pub const SPOOFED_CERTIFICATE: &str = "Fake Certificate";

/// Prefix of synthesized malicious node ids
pub const FAKE_NODE_PREFIX: &str = "FakeNode_";

/// Draws from the 4-digit id space before widening it
const FAKE_ID_DRAWS: usize = 64;

/// Supported attack scenarios
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    /// Duplicate the tail payload into a new block
    Replay,
    /// Certificate for an illegitimately created identity
    Spoofing,
    /// High-volume append burst
    Flood,
}

impl AttackKind {
    /// Every supported kind
    pub const ALL: [AttackKind; 3] = [Self::Replay, Self::Spoofing, Self::Flood];

    /// Short name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replay => "replay",
            Self::Spoofing => "spoofing",
            Self::Flood => "flood",
        }
    }

    /// Display title
    pub fn title(&self) -> &'static str {
        match self {
            Self::Replay => "Replay Attack",
            Self::Spoofing => "Certificate Spoofing",
            Self::Flood => "DDoS Flood",
        }
    }

    /// What the scenario does
    pub fn description(&self) -> &'static str {
        match self {
            Self::Replay => "Resending a valid transaction to disrupt the chain",
            Self::Spoofing => "Issuing a fake certificate",
            Self::Flood => "Flooding the ledger with transactions to degrade throughput",
        }
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttackKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replay" => Ok(Self::Replay),
            "spoofing" => Ok(Self::Spoofing),
            "flood" | "ddos" => Ok(Self::Flood),
            _ => Err(LedgerError::UnknownAttackType {
                requested: s.to_string(),
            }),
        }
    }
}

/// Shared flag for aborting a running simulation from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, untripped token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Cancellation requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Replay scenario metrics
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplayReport {
    /// Payload copied from the previous tail
    pub replayed_payload: String,
    /// The duplicate block
    pub block_added: Block,
    /// Integrity check right after the replay
    pub chain_valid_after: bool,
}

/// Issuance result carried by the spoofing report
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum IssueResult {
    /// Certificate was issued to the fake node
    Issued(IssueOutcome),
    /// Issuance was refused
    Rejected(LedgerError),
}

impl IssueResult {
    /// The certificate went through
    pub fn is_issued(&self) -> bool {
        matches!(self, Self::Issued(_))
    }
}

/// Spoofing scenario metrics
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpoofingReport {
    /// Synthesized malicious id
    pub fake_node_id: String,
    /// What issuance did for it
    pub issue_result: IssueResult,
}

/// Flood scenario metrics; times in seconds
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FloodReport {
    /// Wall time of the burst
    pub total_time: f64,
    /// Mean per-append latency over the burst
    pub average_transaction_time: f64,
    /// Blocks appended in the burst
    pub transactions_processed: u64,
    /// Time from end of burst to the first in-tolerance probe
    pub recovery_time: f64,
    /// Probe blocks appended while recovering
    pub recovery_probes: u64,
    /// Latency of each burst append
    pub per_transaction_times: Vec<f64>,
}

/// Per-kind attack metrics
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttackReport {
    /// Replay metrics
    Replay(ReplayReport),
    /// Spoofing metrics
    Spoofing(SpoofingReport),
    /// Flood metrics
    Flood(FloodReport),
}

impl AttackReport {
    /// Kind that produced this report
    pub fn kind(&self) -> AttackKind {
        match self {
            Self::Replay(_) => AttackKind::Replay,
            Self::Spoofing(_) => AttackKind::Spoofing,
            Self::Flood(_) => AttackKind::Flood,
        }
    }
}

/// Runs named attack scenarios.
#[derive(Debug)]
pub struct AttackSimulator {
    flood: FloodConfig,
    rng: Mutex<StdRng>,
}

impl AttackSimulator {
    /// Simulator with the given flood settings; `seed` fixes id and filler draws
    pub fn new(flood: FloodConfig, seed: Option<u64>) -> Self {
        Self {
            flood,
            rng: Mutex::new(rng_from_seed(seed)),
        }
    }

    /// Flood settings in use
    pub fn flood_config(&self) -> &FloodConfig {
        &self.flood
    }

    /// Execute one scenario
    pub fn run(
        &self,
        kind: AttackKind,
        chain: &mut HashChain,
        registry: &mut NodeRegistry,
        issuer: &CertificateIssuer,
        cancel: &CancelToken,
    ) -> Result<AttackReport> {
        info!(attack = %kind, length = chain.len(), "[der-ledger] simulating {}", kind.title());

        let report = match kind {
            AttackKind::Replay => AttackReport::Replay(self.replay(chain)),
            AttackKind::Spoofing => AttackReport::Spoofing(self.spoof(chain, registry, issuer)?),
            AttackKind::Flood => AttackReport::Flood(self.flood(chain, cancel)?),
        };

        info!(attack = %kind, length = chain.len(), "[der-ledger] attack finished");
        Ok(report)
    }

    fn replay(&self, chain: &mut HashChain) -> ReplayReport {
        let replayed_payload = chain.tail().payload.clone();
        let block_added = chain.append(replayed_payload.clone());
        ReplayReport {
            replayed_payload,
            block_added,
            chain_valid_after: chain.validate(),
        }
    }

    fn spoof(
        &self,
        chain: &mut HashChain,
        registry: &mut NodeRegistry,
        issuer: &CertificateIssuer,
    ) -> Result<SpoofingReport> {
        let fake_node_id = self.unused_fake_id(registry);
        registry.register(fake_node_id.clone(), NodeRole::Malicious, false)?;

        let issue_result = match issuer.issue(chain, registry, &fake_node_id, SPOOFED_CERTIFICATE) {
            Ok(outcome) => IssueResult::Issued(outcome),
            Err(e) => IssueResult::Rejected(e),
        };

        Ok(SpoofingReport {
            fake_node_id,
            issue_result,
        })
    }

    fn unused_fake_id(&self, registry: &NodeRegistry) -> String {
        let mut rng = self.rng.lock();
        for _ in 0..FAKE_ID_DRAWS {
            let id = format!("{}{}", FAKE_NODE_PREFIX, rng.gen_range(1000..=9999));
            if !registry.contains(&id) {
                return id;
            }
        }
        loop {
            let id = format!("{}{}", FAKE_NODE_PREFIX, rng.gen::<u32>());
            if !registry.contains(&id) {
                return id;
            }
        }
    }

    fn flood(&self, chain: &mut HashChain, cancel: &CancelToken) -> Result<FloodReport> {
        let transactions = self.flood.transactions as usize;
        let mut per_transaction_times = Vec::with_capacity(transactions);

        let burst_started = Instant::now();
        {
            let mut rng = self.rng.lock();
            for i in 0..transactions {
                if cancel.is_cancelled() {
                    warn!(appended = i, "[der-ledger] flood cancelled during burst");
                    return Err(LedgerError::SimulationCancelled { probes: 0 });
                }
                let payload = format!("flood_tx_{}_{:016x}", i, rng.gen::<u64>());
                let started = Instant::now();
                chain.append(payload);
                per_transaction_times.push(started.elapsed().as_secs_f64());
            }
        }
        let total_time = burst_started.elapsed().as_secs_f64();

        let average_transaction_time =
            per_transaction_times.iter().sum::<f64>() / transactions.max(1) as f64;
        let threshold = average_transaction_time * self.flood.tolerance;
        let deadline = self.flood.recovery_deadline();

        let recovery_started = Instant::now();
        let mut recovery_probes = 0u64;
        loop {
            if cancel.is_cancelled() {
                warn!(
                    probes = recovery_probes,
                    "[der-ledger] flood cancelled during recovery"
                );
                return Err(LedgerError::SimulationCancelled {
                    probes: recovery_probes,
                });
            }
            let elapsed = recovery_started.elapsed();
            if recovery_probes >= self.flood.max_recovery_probes || elapsed >= deadline {
                warn!(
                    probes = recovery_probes,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "[der-ledger] flood recovery timed out"
                );
                return Err(LedgerError::RecoveryTimeout {
                    probes: recovery_probes,
                    elapsed_seconds: elapsed.as_secs_f64(),
                });
            }

            let started = Instant::now();
            chain.append(format!("recovery_probe_{}", recovery_probes));
            let latency = started.elapsed().as_secs_f64();
            recovery_probes += 1;

            if latency <= threshold {
                break;
            }
        }
        let recovery_time = recovery_started.elapsed().as_secs_f64();

        info!(
            transactions,
            average_us = (average_transaction_time * 1e6) as u64,
            recovery_probes,
            recovery_us = (recovery_time * 1e6) as u64,
            "[der-ledger] flood recovered"
        );

        Ok(FloodReport {
            total_time,
            average_transaction_time,
            transactions_processed: transactions as u64,
            recovery_time,
            recovery_probes,
            per_transaction_times,
        })
    }
}
