//! Domain layer - pure ledger logic
//!
//! Nothing here locks, spawns or performs I/O. Components take the chain and
//! registry by `&mut` so the caller decides how access is serialized.
//!
//! ## Entities
//!
//! - [`Block`]: immutable hash-linked record
//! - [`Node`]: registered DER identity with its certificate history
//!
//! ## Services
//!
//! - [`HashChain`]: append, recompute-and-link validation, truncation
//! - [`NodeRegistry`]: roles, blacklist policy, activity summary
//! - [`CertificateIssuer`]: Laplace-noised issuance
//! - [`AttackSimulator`]: replay, spoofing and flood scenarios
//! - [`RecoveryMonitor`]: timed attack plus re-validation

pub mod attack;
mod block;
mod chain;
mod issuer;
pub mod noise;
mod recovery;
mod registry;

pub use attack::{
    AttackKind, AttackReport, AttackSimulator, CancelToken, FloodReport, IssueResult,
    ReplayReport, SpoofingReport,
};
pub use block::{compute_block_hash, Block, Timestamp, GENESIS_PAYLOAD, GENESIS_PREV_HASH};
pub use chain::{ChainInspection, HashChain};
pub use issuer::{CertificateIssuer, IssueOutcome, NOISE_MARKER};
pub use noise::LaplaceNoise;
pub use recovery::{RecoveryMonitor, RecoveryReport};
pub use registry::{ActivitySummary, Node, NodeRegistry, NodeRole};
