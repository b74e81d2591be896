//! DER node identities, roles, blacklist and certificate history

use super::block::Block;
use crate::config::{BlacklistPolicy, SeedNode};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info};

/// Role a node plays in the DER network
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Generates energy
    Producer,
    /// Draws energy
    Consumer,
    /// Vouches for other nodes
    CertificateAuthority,
    /// Adversarial identity
    Malicious,
}

impl NodeRole {
    /// Snake-case name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Producer => "producer",
            Self::Consumer => "consumer",
            Self::CertificateAuthority => "certificate_authority",
            Self::Malicious => "malicious",
        }
    }

    /// Every role except `Malicious`
    pub fn is_legitimate(&self) -> bool {
        !matches!(self, Self::Malicious)
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "producer" => Ok(Self::Producer),
            "consumer" => Ok(Self::Consumer),
            "certificate_authority" | "ca" => Ok(Self::CertificateAuthority),
            "malicious" => Ok(Self::Malicious),
            other => Err(format!("unknown node role: {}", other)),
        }
    }
}

/// A registered DER node
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Unique id
    pub id: String,
    /// Current role
    pub role: NodeRole,
    /// Certificates issued to this node, oldest first
    pub certificates: Vec<Block>,
}

/// Share of legitimate vs. malicious nodes
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActivitySummary {
    /// Registered nodes
    pub total: u64,
    /// Nodes with a non-malicious role
    pub legitimate_count: u64,
    /// Nodes with the malicious role
    pub malicious_count: u64,
    /// `legitimate_count / total * 100`, 0 when empty
    pub legitimate_percentage: f64,
    /// `malicious_count / total * 100`, 0 when empty
    pub malicious_percentage: f64,
}

/// Node directory keyed by id.
#[derive(Debug)]
pub struct NodeRegistry {
    nodes: HashMap<String, Node>,
    blacklist: HashMap<String, Instant>,
    policy: BlacklistPolicy,
}

impl NodeRegistry {
    /// Empty registry with the given blacklist policy
    pub fn new(policy: BlacklistPolicy) -> Self {
        Self {
            nodes: HashMap::new(),
            blacklist: HashMap::new(),
            policy,
        }
    }

    /// Registry pre-populated with seed nodes
    pub fn with_default_nodes(policy: BlacklistPolicy, seeds: &[SeedNode]) -> Self {
        let mut registry = Self::new(policy);
        for seed in seeds {
            registry.insert(seed.id.clone(), seed.role);
        }
        registry
    }

    /// Register a node with an empty certificate history.
    ///
    /// An existing id is replaced (and its history dropped) only when
    /// `overwrite` is set; otherwise the call fails and nothing changes.
    pub fn register(&mut self, id: impl Into<String>, role: NodeRole, overwrite: bool) -> Result<()> {
        let id = id.into();
        if let Some(existing) = self.nodes.get(&id) {
            if !overwrite {
                return Err(LedgerError::NodeAlreadyRegistered { node_id: id });
            }
            info!(
                node_id = %id,
                dropped_certificates = existing.certificates.len(),
                "[der-ledger] re-registering node, history reset"
            );
        }
        self.insert(id, role);
        Ok(())
    }

    fn insert(&mut self, id: String, role: NodeRole) {
        self.nodes.insert(
            id.clone(),
            Node {
                id,
                role,
                certificates: Vec::new(),
            },
        );
    }

    /// Node by id
    pub fn lookup(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Id is currently barred from issuance
    pub fn is_blacklisted(&self, id: &str) -> bool {
        match (self.blacklist.get(id), self.policy.ttl()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(since), Some(ttl)) => since.elapsed() < ttl,
        }
    }

    /// Bar an id from issuance. Registered or not, history is kept.
    ///
    /// Lapsed entries are dropped on every insert.
    pub fn blacklist(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.prune_expired();
        info!(node_id = %id, "[der-ledger] node blacklisted");
        self.blacklist.insert(id, Instant::now());
    }

    fn prune_expired(&mut self) {
        if let Some(ttl) = self.policy.ttl() {
            let before = self.blacklist.len();
            self.blacklist.retain(|_, since| since.elapsed() < ttl);
            let pruned = before - self.blacklist.len();
            if pruned > 0 {
                debug!(pruned, "[der-ledger] expired blacklist entries dropped");
            }
        }
    }

    /// Entries held, lapsed ones included until the next insert
    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }

    /// Lift a blacklist entry if the policy allows it.
    ///
    /// Returns whether an entry was removed.
    pub fn unblacklist(&mut self, id: &str) -> Result<bool> {
        if !self.policy.reversible {
            return Err(LedgerError::BlacklistIrreversible {
                node_id: id.to_string(),
            });
        }
        Ok(self.blacklist.remove(id).is_some())
    }

    /// Append a certificate block to a node's history
    pub fn record_certificate(&mut self, id: &str, block: Block) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| LedgerError::NodeNotFound {
                node_id: id.to_string(),
            })?;
        node.certificates.push(block);
        Ok(())
    }

    /// Legitimate vs. malicious breakdown over current roles
    pub fn activity_summary(&self) -> ActivitySummary {
        let total = self.nodes.len() as u64;
        let malicious_count = self
            .nodes
            .values()
            .filter(|n| !n.role.is_legitimate())
            .count() as u64;
        let legitimate_count = total - malicious_count;

        let percentage = |count: u64| {
            if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            }
        };

        ActivitySummary {
            total,
            legitimate_count,
            malicious_count,
            legitimate_percentage: percentage(legitimate_count),
            malicious_percentage: percentage(malicious_count),
        }
    }

    /// All nodes, in no particular order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// No nodes registered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
