//! Metrics collection for the ledger service

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the ledger service
#[derive(Debug, Default)]
pub struct LedgerMetrics {
    /// Certificates issued
    pub certificates_issued: AtomicU64,

    /// Issuance calls refused (unknown or blacklisted node)
    pub issuance_rejections: AtomicU64,

    /// Attack scenarios run to completion
    pub attacks_simulated: AtomicU64,

    /// Attack scenarios that failed (timeout, cancellation)
    pub attacks_failed: AtomicU64,

    /// Successful rollbacks
    pub rollbacks: AtomicU64,

    /// Blocks discarded by rollbacks
    pub blocks_rolled_back: AtomicU64,

    /// Validations that found the chain broken
    pub integrity_failures: AtomicU64,
}

/// Point-in-time copy of [`LedgerMetrics`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Certificates issued
    pub certificates_issued: u64,
    /// Issuance calls refused
    pub issuance_rejections: u64,
    /// Attack scenarios run to completion
    pub attacks_simulated: u64,
    /// Attack scenarios that failed
    pub attacks_failed: u64,
    /// Successful rollbacks
    pub rollbacks: u64,
    /// Blocks discarded by rollbacks
    pub blocks_rolled_back: u64,
    /// Validations that found the chain broken
    pub integrity_failures: u64,
}

impl LedgerMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issued certificate
    pub fn record_issued(&self) {
        self.certificates_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a refused issuance
    pub fn record_rejection(&self) {
        self.issuance_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an attack outcome
    pub fn record_attack(&self, succeeded: bool) {
        if succeeded {
            self.attacks_simulated.fetch_add(1, Ordering::Relaxed);
        } else {
            self.attacks_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a rollback that dropped `dropped` blocks
    pub fn record_rollback(&self, dropped: u64) {
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
        self.blocks_rolled_back
            .fetch_add(dropped, Ordering::Relaxed);
    }

    /// Record a failed validation
    pub fn record_integrity_failure(&self) {
        self.integrity_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy current values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            certificates_issued: self.certificates_issued.load(Ordering::Relaxed),
            issuance_rejections: self.issuance_rejections.load(Ordering::Relaxed),
            attacks_simulated: self.attacks_simulated.load(Ordering::Relaxed),
            attacks_failed: self.attacks_failed.load(Ordering::Relaxed),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
            blocks_rolled_back: self.blocks_rolled_back.load(Ordering::Relaxed),
            integrity_failures: self.integrity_failures.load(Ordering::Relaxed),
        }
    }
}
