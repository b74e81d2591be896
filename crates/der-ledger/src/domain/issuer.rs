//! Certificate issuance

use super::block::Block;
use super::chain::HashChain;
use super::noise::{rng_from_seed, LaplaceNoise};
use super::registry::NodeRegistry;
use crate::config::NoiseConfig;
use crate::error::{LedgerError, Result};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Separator between certificate data and the noise sample
pub const NOISE_MARKER: &str = "_noise_";

/// A successfully issued certificate
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IssueOutcome {
    /// Block holding the noised certificate
    pub block: Block,
    /// Seconds between noise draw and history update
    pub duration_seconds: f64,
    /// UTF-8 byte length of the noised payload
    pub payload_bytes: usize,
    /// Laplace sample appended to the payload
    pub noise: f64,
}

/// Builds noised certificate blocks for registered nodes.
#[derive(Debug)]
pub struct CertificateIssuer {
    noise: LaplaceNoise,
    rng: Mutex<StdRng>,
}

impl CertificateIssuer {
    /// Issuer drawing noise per `config`
    pub fn new(config: &NoiseConfig) -> Self {
        Self {
            noise: LaplaceNoise::new(config.scale),
            rng: Mutex::new(rng_from_seed(config.seed)),
        }
    }

    /// Issue a certificate to `node_id`.
    ///
    /// Registration and blacklist checks run before the timer starts and
    /// before anything is appended; a rejected call leaves the chain and
    /// registry untouched.
    pub fn issue(
        &self,
        chain: &mut HashChain,
        registry: &mut NodeRegistry,
        node_id: &str,
        cert_data: &str,
    ) -> Result<IssueOutcome> {
        if !registry.contains(node_id) {
            warn!(node_id, "[der-ledger] issuance rejected: unknown node");
            return Err(LedgerError::NodeNotFound {
                node_id: node_id.to_string(),
            });
        }
        if registry.is_blacklisted(node_id) {
            warn!(node_id, "[der-ledger] issuance rejected: node blacklisted");
            return Err(LedgerError::NodeBlacklisted {
                node_id: node_id.to_string(),
            });
        }

        let started = Instant::now();

        let noise = self.noise.sample(&mut *self.rng.lock());
        let noisy_payload = format!("{}{}{}", cert_data, NOISE_MARKER, noise);
        let payload_bytes = noisy_payload.len();

        let block = chain.append(noisy_payload);
        registry.record_certificate(node_id, block.clone())?;

        let duration_seconds = started.elapsed().as_secs_f64();

        info!(
            node_id,
            index = block.index,
            payload_bytes,
            duration_us = (duration_seconds * 1e6) as u64,
            "[der-ledger] certificate issued"
        );

        Ok(IssueOutcome {
            block,
            duration_seconds,
            payload_bytes,
            noise,
        })
    }

    /// Laplace scale in use
    pub fn noise_scale(&self) -> f64 {
        self.noise.scale()
    }
}
