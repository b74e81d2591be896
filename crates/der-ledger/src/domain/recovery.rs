//! Recovery-time measurement around an attack

use super::attack::{AttackKind, AttackReport, AttackSimulator, CancelToken};
use super::chain::HashChain;
use super::issuer::CertificateIssuer;
use super::registry::NodeRegistry;
use crate::error::Result;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Timing and integrity outcome of one attack run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecoveryReport {
    /// Scenario that was run
    pub attack_type: AttackKind,
    /// Scenario metrics
    pub attack_report: AttackReport,
    /// Wall time from attack start until the simulator returned
    pub recovery_duration_seconds: f64,
    /// Integrity check after the attack
    pub chain_valid_after: bool,
}

/// Stateless wrapper timing an attack and re-validating afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecoveryMonitor;

impl RecoveryMonitor {
    /// Run `kind` and measure how long the ledger took to settle
    pub fn measure(
        kind: AttackKind,
        chain: &mut HashChain,
        registry: &mut NodeRegistry,
        issuer: &CertificateIssuer,
        simulator: &AttackSimulator,
        cancel: &CancelToken,
    ) -> Result<RecoveryReport> {
        let started = Instant::now();
        let attack_report = simulator.run(kind, chain, registry, issuer, cancel)?;
        let recovery_duration_seconds = started.elapsed().as_secs_f64();

        let chain_valid_after = chain.validate();
        if chain_valid_after {
            info!(
                attack = %kind,
                recovery_ms = (recovery_duration_seconds * 1e3) as u64,
                "[der-ledger] recovery measured"
            );
        } else {
            warn!(attack = %kind, "[der-ledger] chain invalid after attack");
        }

        Ok(RecoveryReport {
            attack_type: kind,
            attack_report,
            recovery_duration_seconds,
            chain_valid_after,
        })
    }
}
