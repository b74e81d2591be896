//! # DER Ledger - Certificate Chain for Distributed Energy Resources
//!
//! **Bounded Context:** Certificate Issuance & Ledger Integrity
//!
//! ## Purpose
//!
//! An append-only, hash-linked ledger of certificates issued to DER nodes
//! (producers, consumers, certificate authorities). Each certificate payload
//! carries a Laplace noise term before it is sealed into a block. The ledger
//! also ships an attack harness (replay, spoofing, flood) and measures how
//! long the chain takes to settle after each scenario.
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Service                                            │
//! │  - LedgerService: one RwLock over chain + registry  │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports                                              │
//! │  - Inbound: CertificateLedgerApi                    │
//! │  - Outbound: TimeSource                             │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (pure logic)                                │
//! │  - HashChain, NodeRegistry, CertificateIssuer       │
//! │  - AttackSimulator, RecoveryMonitor, LaplaceNoise   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! | Invariant | Enforced by |
//! |-----------|-------------|
//! | Block 1 is genesis with `prev_hash = "0"` | `HashChain::new` |
//! | `blocks[i].prev_hash == blocks[i-1].hash` | `HashChain::append` |
//! | Rollback never removes genesis | `HashChain::truncate` |
//! | Unknown or blacklisted nodes append nothing | `CertificateIssuer::issue` |
//! | Flood recovery always terminates | probe cap + deadline + cancel token |
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use der_ledger::{CertificateLedgerApi, LedgerConfig, LedgerService};
//!
//! let ledger = LedgerService::new(LedgerConfig::default())?;
//! ledger.issue_certificate("Node1", "Certificate A")?;
//! ledger.simulate_attack("spoofing")?;
//! ledger.rollback(2)?;
//! assert!(ledger.validate_chain());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Domain models and ledger logic
pub mod domain;
/// Hexagonal ports
pub mod ports;
/// Lock-guarded ledger service
pub mod service;

mod config;
mod error;
mod metrics;

pub use config::{BlacklistPolicy, FloodConfig, LedgerConfig, NoiseConfig, SeedNode};
pub use error::{LedgerError, Result};
pub use metrics::{LedgerMetrics, MetricsSnapshot};

pub use domain::{
    ActivitySummary, AttackKind, AttackReport, Block, CancelToken, ChainInspection, FloodReport,
    HashChain, IssueOutcome, IssueResult, Node, NodeRole, RecoveryReport, ReplayReport,
    SpoofingReport,
};

pub use ports::{CertificateLedgerApi, ManualTimeSource, SystemTimeSource, TimeSource};

pub use service::LedgerService;

/// Default Laplace scale for certificate noise
pub const DEFAULT_NOISE_SCALE: f64 = 1.0;

/// Default number of appends in a flood burst
pub const DEFAULT_FLOOD_TRANSACTIONS: u32 = 1000;

/// Probe must be within this factor of the burst average to count as recovered
pub const DEFAULT_RECOVERY_TOLERANCE: f64 = 1.2;

/// Upper bound on post-flood recovery probes
pub const DEFAULT_MAX_RECOVERY_PROBES: u64 = 100_000;

/// Upper bound on post-flood recovery wall time
pub const DEFAULT_RECOVERY_DEADLINE_SECS: f64 = 30.0;

/// Largest accepted recovery deadline (one day)
pub const MAX_RECOVERY_DEADLINE_SECS: f64 = 86_400.0;

/// Largest accepted Laplace scale; samples stay finite well below `f64::MAX`
pub const MAX_NOISE_SCALE: f64 = 1e12;
