//! Inbound ports (driving side - API)

use crate::domain::{ActivitySummary, AttackReport, Block, IssueOutcome, NodeRole, RecoveryReport};
use crate::error::Result;

/// Primary port: operations exposed to the request layer.
///
/// Attack kinds arrive as strings and are parsed here, so an unrecognised
/// kind surfaces as `UnknownAttackType` rather than a transport error.
pub trait CertificateLedgerApi: Send + Sync {
    /// Full ledger dump, genesis first
    fn get_chain(&self) -> Vec<Block>;

    /// Block at a 0-based position
    fn get_block(&self, index: u64) -> Result<Block>;

    /// Issue a noised certificate to a registered, non-blacklisted node
    fn issue_certificate(&self, node_id: &str, cert_data: &str) -> Result<IssueOutcome>;

    /// Run an attack scenario by name
    fn simulate_attack(&self, kind: &str) -> Result<AttackReport>;

    /// Keep the first `target_length` blocks
    fn rollback(&self, target_length: u64) -> Result<u64>;

    /// Recompute-and-link integrity check
    fn validate_chain(&self) -> bool;

    /// Run an attack and time the return to a valid state
    fn measure_recovery(&self, kind: &str) -> Result<RecoveryReport>;

    /// Legitimate vs. malicious node breakdown
    fn get_node_activity(&self) -> ActivitySummary;

    /// Register a node; `overwrite` replaces an existing id and resets its history
    fn register_node(&self, node_id: &str, role: NodeRole, overwrite: bool) -> Result<()>;

    /// Bar a node from issuance
    fn blacklist_node(&self, node_id: &str);

    /// Lift a blacklist entry when the policy allows it
    fn unblacklist_node(&self, node_id: &str) -> Result<bool>;
}
