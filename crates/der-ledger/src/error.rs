//! Error types for the certificate ledger

use serde::Serialize;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors returned by ledger operations.
///
/// Every variant is terminal for the call that produced it; nothing in the
/// ledger retries internally. The serialized form carries a `kind` tag so the
/// request layer can map it to a status without string matching.
#[derive(Debug, Clone, Error, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerError {
    /// Node id is not registered
    #[error("Node not found: {node_id}")]
    NodeNotFound {
        /// Requested node id
        node_id: String,
    },

    /// Node id is on the blacklist
    #[error("Node is blacklisted: {node_id}")]
    NodeBlacklisted {
        /// Requested node id
        node_id: String,
    },

    /// Registration refused because the id exists and overwrite was not requested
    #[error("Node already registered: {node_id}")]
    NodeAlreadyRegistered {
        /// Existing node id
        node_id: String,
    },

    /// Blacklist policy does not allow removing entries
    #[error("Blacklist entry for {node_id} cannot be removed under the current policy")]
    BlacklistIrreversible {
        /// Node id whose removal was refused
        node_id: String,
    },

    /// Attack kind string not recognised
    #[error("Unknown attack type: {requested}")]
    UnknownAttackType {
        /// The rejected kind string
        requested: String,
    },

    /// Rollback target outside `[1, length)`
    #[error("Invalid rollback target {requested} for chain of length {length}")]
    InvalidIndex {
        /// Requested number of blocks to keep
        requested: u64,
        /// Chain length at the time of the call
        length: u64,
    },

    /// Block position outside `[0, length)`
    #[error("Block index {index} out of range for chain of length {length}")]
    IndexOutOfRange {
        /// Requested position
        index: u64,
        /// Chain length at the time of the call
        length: u64,
    },

    /// Flood recovery probing exceeded its probe budget or deadline
    #[error("Recovery did not stabilise after {probes} probes ({elapsed_seconds:.3}s)")]
    RecoveryTimeout {
        /// Probes appended before giving up
        probes: u64,
        /// Seconds spent probing
        elapsed_seconds: f64,
    },

    /// Simulation aborted through its cancel token
    #[error("Simulation cancelled after {probes} recovery probes")]
    SimulationCancelled {
        /// Probes appended before cancellation
        probes: u64,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration
        reason: String,
    },
}

impl LedgerError {
    /// Stable snake_case identifier for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound { .. } => "node_not_found",
            Self::NodeBlacklisted { .. } => "node_blacklisted",
            Self::NodeAlreadyRegistered { .. } => "node_already_registered",
            Self::BlacklistIrreversible { .. } => "blacklist_irreversible",
            Self::UnknownAttackType { .. } => "unknown_attack_type",
            Self::InvalidIndex { .. } => "invalid_index",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::RecoveryTimeout { .. } => "recovery_timeout",
            Self::SimulationCancelled { .. } => "simulation_cancelled",
            Self::InvalidConfig { .. } => "invalid_config",
        }
    }

    /// Check if the error is a rejected precondition on issuance
    pub fn is_issuance_rejection(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound { .. } | Self::NodeBlacklisted { .. }
        )
    }
}
