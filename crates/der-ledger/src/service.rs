//! Ledger Service
//!
//! Owns one chain and one registry behind a single `RwLock` and implements
//! [`CertificateLedgerApi`] on top of the domain components.
//!
//! ## Locking
//!
//! | Operation | Lock |
//! |-----------|------|
//! | issue, attack, recovery, rollback, register, blacklist | write, for the whole call |
//! | validate, get_block, get_chain, activity | read |
//!
//! Holding the write lock across a whole attack keeps every append linked
//! to the tail it read. A long flood therefore blocks readers until it
//! finishes or its cancel token is tripped.

use crate::config::LedgerConfig;
use crate::domain::{
    ActivitySummary, AttackKind, AttackReport, AttackSimulator, Block, CancelToken,
    CertificateIssuer, ChainInspection, HashChain, IssueOutcome, Node, NodeRegistry, NodeRole,
    RecoveryMonitor, RecoveryReport,
};
use crate::error::Result;
use crate::metrics::{LedgerMetrics, MetricsSnapshot};
use crate::ports::{CertificateLedgerApi, SystemTimeSource, TimeSource};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Chain and registry mutated together
#[derive(Debug)]
struct LedgerState {
    chain: HashChain,
    registry: NodeRegistry,
}

/// Shared ledger instance.
///
/// Construct one per simulated network and share it through `Arc`.
#[derive(Debug)]
pub struct LedgerService {
    state: RwLock<LedgerState>,
    issuer: CertificateIssuer,
    simulator: AttackSimulator,
    metrics: LedgerMetrics,
    config: LedgerConfig,
}

impl LedgerService {
    /// Ledger stamped with system time
    pub fn new(config: LedgerConfig) -> Result<Self> {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    /// Ledger stamped by the given clock
    pub fn with_time_source(config: LedgerConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        config.validate()?;

        let chain = HashChain::new(clock);
        let registry =
            NodeRegistry::with_default_nodes(config.blacklist.clone(), &config.seed_nodes);
        let issuer = CertificateIssuer::new(&config.noise);
        // Separate stream from the noise RNG so seeded runs stay reproducible
        let simulator = AttackSimulator::new(
            config.flood.clone(),
            config.noise.seed.map(|s| s.wrapping_add(1)),
        );

        info!(
            genesis = %chain.tail().hash,
            seed_nodes = registry.len(),
            noise_scale = issuer.noise_scale(),
            flood_transactions = config.flood.transactions,
            "[der-ledger] ledger initialized"
        );

        Ok(Self {
            state: RwLock::new(LedgerState { chain, registry }),
            issuer,
            simulator,
            metrics: LedgerMetrics::new(),
            config,
        })
    }

    /// Run an attack with a caller-owned cancel token
    pub fn simulate_attack_with_cancel(
        &self,
        kind: &str,
        cancel: &CancelToken,
    ) -> Result<AttackReport> {
        let kind: AttackKind = kind.parse()?;
        let mut state = self.state.write();
        let LedgerState { chain, registry } = &mut *state;

        let result = self
            .simulator
            .run(kind, chain, registry, &self.issuer, cancel);
        self.metrics.record_attack(result.is_ok());
        result
    }

    /// Measure recovery with a caller-owned cancel token
    pub fn measure_recovery_with_cancel(
        &self,
        kind: &str,
        cancel: &CancelToken,
    ) -> Result<RecoveryReport> {
        let kind: AttackKind = kind.parse()?;
        let mut state = self.state.write();
        let LedgerState { chain, registry } = &mut *state;

        let result = RecoveryMonitor::measure(
            kind,
            chain,
            registry,
            &self.issuer,
            &self.simulator,
            cancel,
        );
        self.metrics.record_attack(result.is_ok());
        if let Ok(report) = &result {
            if !report.chain_valid_after {
                self.metrics.record_integrity_failure();
            }
        }
        result
    }

    /// Integrity walk naming the first broken block
    pub fn inspect_chain(&self) -> ChainInspection {
        self.state.read().chain.inspect()
    }

    /// Current chain length
    pub fn chain_len(&self) -> u64 {
        self.state.read().chain.len()
    }

    /// Copy of a registered node
    pub fn node(&self, node_id: &str) -> Option<Node> {
        self.state.read().registry.lookup(node_id).cloned()
    }

    /// Whether a node is currently barred
    pub fn is_blacklisted(&self, node_id: &str) -> bool {
        self.state.read().registry.is_blacklisted(node_id)
    }

    /// Counter snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Configuration in use
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

impl CertificateLedgerApi for LedgerService {
    fn get_chain(&self) -> Vec<Block> {
        self.state.read().chain.blocks().to_vec()
    }

    fn get_block(&self, index: u64) -> Result<Block> {
        self.state.read().chain.at(index).cloned()
    }

    fn issue_certificate(&self, node_id: &str, cert_data: &str) -> Result<IssueOutcome> {
        let mut state = self.state.write();
        let LedgerState { chain, registry } = &mut *state;

        match self.issuer.issue(chain, registry, node_id, cert_data) {
            Ok(outcome) => {
                self.metrics.record_issued();
                Ok(outcome)
            }
            Err(e) => {
                if e.is_issuance_rejection() {
                    self.metrics.record_rejection();
                }
                Err(e)
            }
        }
    }

    fn simulate_attack(&self, kind: &str) -> Result<AttackReport> {
        self.simulate_attack_with_cancel(kind, &CancelToken::new())
    }

    fn rollback(&self, target_length: u64) -> Result<u64> {
        let mut state = self.state.write();
        let before = state.chain.len();
        let after = state.chain.truncate(target_length)?;

        self.metrics.record_rollback(before - after);
        info!(
            from = before,
            to = after,
            tail = %state.chain.tail().hash,
            "[der-ledger] chain rolled back"
        );
        Ok(after)
    }

    fn validate_chain(&self) -> bool {
        let valid = self.state.read().chain.validate();
        if !valid {
            self.metrics.record_integrity_failure();
        }
        valid
    }

    fn measure_recovery(&self, kind: &str) -> Result<RecoveryReport> {
        self.measure_recovery_with_cancel(kind, &CancelToken::new())
    }

    fn get_node_activity(&self) -> ActivitySummary {
        self.state.read().registry.activity_summary()
    }

    fn register_node(&self, node_id: &str, role: NodeRole, overwrite: bool) -> Result<()> {
        let result = self.state.write().registry.register(node_id, role, overwrite);
        match &result {
            Ok(()) => info!(node_id, %role, "[der-ledger] node registered"),
            Err(e) => warn!(node_id, error = %e, "[der-ledger] registration refused"),
        }
        result
    }

    fn blacklist_node(&self, node_id: &str) {
        self.state.write().registry.blacklist(node_id);
    }

    fn unblacklist_node(&self, node_id: &str) -> Result<bool> {
        self.state.write().registry.unblacklist(node_id)
    }
}
