use crate::{BlockHeader, BlockNumber, SealedHeader};
use alloy_primitives::{keccak256, Bytes, B256, U256};
use std::ops::Deref;

/// A block body: the transaction and ommer lists belonging to one header.
///
/// Transactions are kept as opaque encoded payloads; execution is out of scope
/// for this crate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockBody {
    /// Encoded transactions included in the block.
    pub transactions: Vec<Bytes>,
    /// Ommer headers included in the block.
    pub ommers: Vec<BlockHeader>,
}

impl BlockBody {
    /// Computes the commitment to the transaction list.
    pub fn calculate_transactions_root(&self) -> B256 {
        keccak256(alloy_rlp::encode(&self.transactions))
    }

    /// Computes the commitment to the ommers list.
    pub fn calculate_ommers_hash(&self) -> B256 {
        keccak256(alloy_rlp::encode(&self.ommers))
    }
}

/// A header assembled with a body, prior to sealing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// The block body.
    pub body: BlockBody,
}

impl Block {
    /// Assembles a block from a header and a body.
    pub const fn new(header: BlockHeader, body: BlockBody) -> Self {
        Self { header, body }
    }

    /// Seals the block.
    ///
    /// The body commitments in the header are recomputed from the actual body
    /// before hashing, so a body that does not belong to the header yields a
    /// seal hash different from the header's original hash.
    pub fn seal(mut self) -> SealedBlock {
        self.header.transactions_root = self.body.calculate_transactions_root();
        self.header.ommers_hash = self.body.calculate_ommers_hash();
        SealedBlock { header: self.header.seal(), body: self.body }
    }
}

/// A sealed block: header with memoized hash plus the matching body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedBlock {
    /// The sealed header.
    pub header: SealedHeader,
    /// The block body.
    pub body: BlockBody,
}

impl SealedBlock {
    /// Returns the block hash.
    pub const fn hash(&self) -> B256 {
        self.header.hash()
    }

    /// Returns the block number.
    pub fn number(&self) -> BlockNumber {
        self.header.number
    }

    /// Returns the block difficulty.
    pub fn difficulty(&self) -> U256 {
        self.header.difficulty
    }

    /// Returns whether `child` extends this block: its parent hash must seal
    /// to this block's hash and its number must follow directly.
    pub fn is_parent_of(&self, child: &SealedBlock) -> bool {
        child.header.parent_hash == self.hash() && child.number() == self.number() + 1
    }

    /// Splits the block into its header and body.
    pub fn split(self) -> (SealedHeader, BlockBody) {
        (self.header, self.body)
    }
}

impl Deref for SealedBlock {
    type Target = SealedHeader;

    fn deref(&self) -> &Self::Target {
        &self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> BlockBody {
        BlockBody { transactions: vec![Bytes::from_static(b"tx")], ommers: vec![] }
    }

    #[test]
    fn seal_commits_to_body() {
        let body = body();
        let header = BlockHeader {
            transactions_root: body.calculate_transactions_root(),
            ommers_hash: body.calculate_ommers_hash(),
            number: 1,
            ..Default::default()
        };
        let expected = header.hash_slow();

        let sealed = Block::new(header.clone(), body).seal();
        assert_eq!(sealed.hash(), expected);

        // substituting the body changes the seal hash
        let substituted = Block::new(header, BlockBody::default()).seal();
        assert_ne!(substituted.hash(), expected);
    }

    #[test]
    fn parent_linkage() {
        let parent = Block::new(BlockHeader { number: 9, ..Default::default() }, body()).seal();
        let child = Block::new(
            BlockHeader { number: 10, parent_hash: parent.hash(), ..Default::default() },
            body(),
        )
        .seal();

        assert!(parent.is_parent_of(&child));
        assert!(!child.is_parent_of(&parent));
    }
}
