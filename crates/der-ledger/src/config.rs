//! Configuration types for the certificate ledger

use crate::domain::NodeRole;
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::time::Duration;

/// Runtime configuration for a ledger instance
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Certificate noise settings
    pub noise: NoiseConfig,

    /// Flood attack and recovery probing
    pub flood: FloodConfig,

    /// Blacklist expiry and reversibility
    pub blacklist: BlacklistPolicy,

    /// Nodes registered when the ledger is created
    pub seed_nodes: Vec<SeedNode>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            noise: NoiseConfig::default(),
            flood: FloodConfig::default(),
            blacklist: BlacklistPolicy::default(),
            seed_nodes: default_seed_nodes(),
        }
    }
}

impl LedgerConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| LedgerError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the ledger cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(LedgerError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if !self.noise.scale.is_finite()
            || self.noise.scale <= 0.0
            || self.noise.scale > crate::MAX_NOISE_SCALE
        {
            return invalid("noise.scale must be in (0, 1e12]");
        }
        if self.flood.transactions == 0 {
            return invalid("flood.transactions must be at least 1");
        }
        if !self.flood.tolerance.is_finite() || self.flood.tolerance < 1.0 {
            return invalid("flood.tolerance must be >= 1.0");
        }
        if self.flood.max_recovery_probes == 0 {
            return invalid("flood.max_recovery_probes must be at least 1");
        }
        let deadline = self.flood.recovery_deadline_secs;
        if !deadline.is_finite() || deadline <= 0.0 || deadline > crate::MAX_RECOVERY_DEADLINE_SECS
        {
            return invalid("flood.recovery_deadline_secs must be in (0, 86400]");
        }
        Ok(())
    }
}

/// Laplace noise configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Laplace scale parameter `b` (default: 1.0)
    pub scale: f64,

    /// Fixed RNG seed for reproducible runs (default: OS entropy)
    pub seed: Option<u64>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            scale: crate::DEFAULT_NOISE_SCALE,
            seed: None,
        }
    }
}

/// Flood attack configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FloodConfig {
    /// Blocks appended in the burst (default: 1000)
    pub transactions: u32,

    /// A probe counts as recovered when its latency is within
    /// `tolerance * average` (default: 1.2)
    pub tolerance: f64,

    /// Probe budget before `RecoveryTimeout` (default: 100_000)
    pub max_recovery_probes: u64,

    /// Wall-clock budget for probing in seconds (default: 30)
    pub recovery_deadline_secs: f64,
}

impl FloodConfig {
    /// Probing deadline as a `Duration`; saturates instead of overflowing
    pub fn recovery_deadline(&self) -> Duration {
        Duration::try_from_secs_f64(self.recovery_deadline_secs.max(0.0))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            transactions: crate::DEFAULT_FLOOD_TRANSACTIONS,
            tolerance: crate::DEFAULT_RECOVERY_TOLERANCE,
            max_recovery_probes: crate::DEFAULT_MAX_RECOVERY_PROBES,
            recovery_deadline_secs: crate::DEFAULT_RECOVERY_DEADLINE_SECS,
        }
    }
}

/// Blacklist policy.
///
/// The default is permanent and irreversible.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BlacklistPolicy {
    /// Entries may be lifted with `unblacklist`
    pub reversible: bool,

    /// Entries lapse after this many seconds
    pub ttl_secs: Option<u64>,
}

impl BlacklistPolicy {
    /// Expiry as a `Duration`, if any
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

/// Node registered at startup
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SeedNode {
    /// Node id
    pub id: String,
    /// Node role
    pub role: NodeRole,
}

fn default_seed_nodes() -> Vec<SeedNode> {
    [
        ("Node1", NodeRole::Producer),
        ("Node2", NodeRole::Consumer),
        ("Node3", NodeRole::CertificateAuthority),
    ]
    .into_iter()
    .map(|(id, role)| SeedNode {
        id: id.to_string(),
        role,
    })
    .collect()
}
