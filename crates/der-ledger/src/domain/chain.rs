//! Hash-linked block sequence
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Genesis first | `new()` seeds exactly one block with `prev_hash = "0"` |
//! | Link integrity | `append()` always links to the current tail |
//! | Immutability | no API hands out `&mut Block`; `truncate()` only drops the suffix |
//! | Genesis retained | `truncate()` refuses `keep_count == 0` |

use super::block::{Block, GENESIS_PREV_HASH};
use crate::error::{LedgerError, Result};
use crate::ports::TimeSource;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a full integrity walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChainInspection {
    /// Every block passed the recompute and link checks
    pub valid: bool,
    /// Number of blocks inspected
    pub length: u64,
    /// 1-based index of the first block that failed, if any
    pub first_invalid_index: Option<u64>,
}

/// Ordered, append-only sequence of blocks.
pub struct HashChain {
    blocks: Vec<Block>,
    clock: Arc<dyn TimeSource>,
}

impl HashChain {
    /// Create a chain holding only the genesis block
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        let genesis = Block::genesis(clock.now());
        Self {
            blocks: vec![genesis],
            clock,
        }
    }

    /// Rebuild a chain from a block dump without checking it.
    ///
    /// Returns `None` for an empty dump. Call [`HashChain::validate`] before
    /// trusting the result.
    pub fn from_blocks(blocks: Vec<Block>, clock: Arc<dyn TimeSource>) -> Option<Self> {
        if blocks.is_empty() {
            return None;
        }
        Some(Self { blocks, clock })
    }

    /// Append a payload linked to the current tail
    pub fn append(&mut self, payload: impl Into<String>) -> Block {
        let prev_hash = self.tail().hash.clone();
        let index = self.blocks.len() as u64 + 1;
        let block = Block::new(index, self.clock.now(), payload.into(), prev_hash);
        debug!(
            index = block.index,
            hash = %block.hash,
            "[der-ledger] appended block"
        );
        self.blocks.push(block.clone());
        block
    }

    /// Recompute-and-link integrity check, fail-fast
    pub fn validate(&self) -> bool {
        self.inspect().valid
    }

    /// Walk the chain and report the first broken block.
    ///
    /// For each adjacent pair the predecessor's hash is recomputed from its
    /// stored fields before the successor's link is compared, so a rewritten
    /// `hash` field is caught even when the next link was rewritten to match.
    pub fn inspect(&self) -> ChainInspection {
        let length = self.blocks.len() as u64;
        let first_invalid_index = self.find_first_invalid();

        if let Some(index) = first_invalid_index {
            warn!(index, length, "[der-ledger] chain integrity violation");
        }

        ChainInspection {
            valid: first_invalid_index.is_none(),
            length,
            first_invalid_index,
        }
    }

    fn find_first_invalid(&self) -> Option<u64> {
        let genesis = self.blocks.first()?;
        if genesis.prev_hash != GENESIS_PREV_HASH {
            return Some(genesis.index);
        }

        for pair in self.blocks.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            if !prev.is_self_consistent() {
                return Some(prev.index);
            }
            if cur.prev_hash != prev.hash {
                return Some(cur.index);
            }
        }

        let tail = self.tail();
        if !tail.is_self_consistent() {
            return Some(tail.index);
        }
        None
    }

    /// Keep the first `keep_count` blocks and drop the rest.
    ///
    /// Requires `1 <= keep_count < len`. Dropped blocks are gone for good.
    pub fn truncate(&mut self, keep_count: u64) -> Result<u64> {
        let length = self.len();
        if keep_count == 0 || keep_count >= length {
            return Err(LedgerError::InvalidIndex {
                requested: keep_count,
                length,
            });
        }
        self.blocks.truncate(keep_count as usize);
        Ok(self.len())
    }

    /// Last block
    pub fn tail(&self) -> &Block {
        // Non-empty: construction always seeds genesis and truncate keeps it
        &self.blocks[self.blocks.len() - 1]
    }

    /// Block at a 0-based position
    pub fn at(&self, position: u64) -> Result<&Block> {
        usize::try_from(position)
            .ok()
            .and_then(|p| self.blocks.get(p))
            .ok_or(LedgerError::IndexOutOfRange {
                index: position,
                length: self.len(),
            })
    }

    /// All blocks in order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> u64 {
        self.blocks.len() as u64
    }

    /// Always false: genesis cannot be removed
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl fmt::Debug for HashChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashChain")
            .field("len", &self.blocks.len())
            .field("tail", &self.tail().hash)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ManualTimeSource;
    use proptest::prelude::*;

    fn chain() -> HashChain {
        HashChain::new(Arc::new(ManualTimeSource::new(1_000, 1)))
    }

    fn tampered(chain: &HashChain, position: usize, edit: impl FnOnce(&mut Block)) -> HashChain {
        let mut blocks = chain.blocks().to_vec();
        edit(&mut blocks[position]);
        HashChain::from_blocks(blocks, Arc::new(ManualTimeSource::new(0, 1))).unwrap()
    }

    #[test]
    fn test_genesis_invariant() {
        let chain = chain();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.tail().prev_hash, "0");
        assert_eq!(chain.tail().index, 1);
        assert!(chain.validate());
    }

    #[test]
    fn test_append_links_to_tail() {
        let mut chain = chain();
        let genesis_hash = chain.tail().hash.clone();
        let block = chain.append("cert-A");
        assert_eq!(block.index, 2);
        assert_eq!(block.prev_hash, genesis_hash);
        assert_eq!(chain.tail(), &block);
        assert!(chain.validate());
    }

    #[test]
    fn test_empty_payload_accepted() {
        let mut chain = chain();
        let block = chain.append("");
        assert_eq!(block.payload, "");
        assert!(chain.validate());
    }

    #[test]
    fn test_tampered_payload_detected() {
        let mut chain = chain();
        chain.append("a");
        chain.append("b");
        chain.append("c");

        for position in 0..4 {
            let broken = tampered(&chain, position, |b| b.payload.push('!'));
            let report = broken.inspect();
            assert!(!report.valid, "payload edit at {} not caught", position);
            assert_eq!(report.first_invalid_index, Some(position as u64 + 1));
        }
    }

    #[test]
    fn test_tampered_hash_detected() {
        let mut chain = chain();
        chain.append("a");
        chain.append("b");

        for position in 0..3 {
            let broken = tampered(&chain, position, |b| b.hash = "f".repeat(64));
            assert!(!broken.validate(), "hash edit at {} not caught", position);
        }
    }

    #[test]
    fn test_rewritten_hash_and_link_still_detected() {
        let mut chain = chain();
        chain.append("a");
        chain.append("b");

        // Forge block 2's hash and patch block 3's link to match it.
        let mut blocks = chain.blocks().to_vec();
        blocks[1].hash = "e".repeat(64);
        blocks[2].prev_hash = blocks[1].hash.clone();
        let broken = HashChain::from_blocks(blocks, Arc::new(ManualTimeSource::new(0, 1))).unwrap();

        let report = broken.inspect();
        assert!(!report.valid);
        assert_eq!(report.first_invalid_index, Some(2));
    }

    #[test]
    fn test_truncate_bounds() {
        let mut chain = chain();
        chain.append("a");
        chain.append("b");

        assert_eq!(
            chain.truncate(3),
            Err(LedgerError::InvalidIndex {
                requested: 3,
                length: 3
            })
        );
        assert!(matches!(
            chain.truncate(0),
            Err(LedgerError::InvalidIndex { .. })
        ));
        assert_eq!(chain.truncate(1), Ok(1));
        assert_eq!(chain.len(), 1);
        assert!(chain.validate());
    }

    #[test]
    fn test_at_out_of_range() {
        let chain = chain();
        assert!(chain.at(0).is_ok());
        assert_eq!(
            chain.at(1),
            Err(LedgerError::IndexOutOfRange {
                index: 1,
                length: 1
            })
        );
        assert!(chain.at(u64::MAX).is_err());
    }

    #[test]
    fn test_from_blocks_rejects_empty() {
        assert!(HashChain::from_blocks(Vec::new(), Arc::new(ManualTimeSource::new(0, 1))).is_none());
    }

    proptest! {
        #[test]
        fn prop_append_monotonic(payloads in proptest::collection::vec(".*", 0..32)) {
            let mut chain = chain();
            for (n, payload) in payloads.iter().enumerate() {
                let before = chain.len();
                chain.append(payload.clone());
                prop_assert_eq!(chain.len(), before + 1);
                prop_assert_eq!(chain.len(), n as u64 + 2);
                for pair in chain.blocks().windows(2) {
                    prop_assert_eq!(&pair[1].prev_hash, &pair[0].hash);
                }
            }
            prop_assert!(chain.validate());
        }

        #[test]
        fn prop_rollback_keeps_prefix(
            payloads in proptest::collection::vec("[a-z]{0,8}", 1..24),
            keep_seed in any::<u64>(),
        ) {
            let mut chain = chain();
            for payload in &payloads {
                chain.append(payload.clone());
            }
            let original = chain.blocks().to_vec();
            let keep = 1 + keep_seed % (chain.len() - 1);

            prop_assert_eq!(chain.truncate(keep), Ok(keep));
            chain.append("after-rollback");

            prop_assert_eq!(chain.len(), keep + 1);
            prop_assert_eq!(&chain.blocks()[..keep as usize], &original[..keep as usize]);
            prop_assert!(chain.validate());
        }
    }
}
