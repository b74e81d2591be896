//! Block entity and link hashing

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Nanoseconds since the Unix epoch
pub type Timestamp = u64;

/// Payload of the fixed first block
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

/// Link value stored as the genesis block's `prev_hash`
pub const GENESIS_PREV_HASH: &str = "0";

/// An immutable ledger record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// 1-indexed sequential position (genesis is 1)
    pub index: u64,
    /// Creation time, nanoseconds since the Unix epoch
    pub timestamp: Timestamp,
    /// Opaque payload (certificate data, attack filler, ...)
    pub payload: String,
    /// Hash of the preceding block, `"0"` for genesis
    pub prev_hash: String,
    /// SHA-256 hex over payload, prev_hash and decimal timestamp
    pub hash: String,
}

impl Block {
    /// Build a block and compute its hash
    pub fn new(index: u64, timestamp: Timestamp, payload: String, prev_hash: String) -> Self {
        let hash = compute_block_hash(&payload, &prev_hash, timestamp);
        Self {
            index,
            timestamp,
            payload,
            prev_hash,
            hash,
        }
    }

    /// Build the genesis block
    pub fn genesis(timestamp: Timestamp) -> Self {
        Self::new(
            1,
            timestamp,
            GENESIS_PAYLOAD.to_string(),
            GENESIS_PREV_HASH.to_string(),
        )
    }

    /// Recompute the hash from the stored fields
    pub fn recompute_hash(&self) -> String {
        compute_block_hash(&self.payload, &self.prev_hash, self.timestamp)
    }

    /// Stored hash matches the stored content
    pub fn is_self_consistent(&self) -> bool {
        self.recompute_hash() == self.hash
    }
}

/// Hash `payload || prev_hash || decimal(timestamp)` and return lowercase hex.
pub fn compute_block_hash(payload: &str, prev_hash: &str, timestamp: Timestamp) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
