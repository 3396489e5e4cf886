use crate::BlockNumber;
use alloy_primitives::{keccak256, Bytes, B256, U256};
use alloy_rlp::RlpEncodable;
use std::ops::Deref;

/// A block header.
///
/// The hash of a header is a pure function of its contents: the keccak of the
/// RLP encoding of all fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpEncodable)]
pub struct BlockHeader {
    /// Hash of the parent block's header.
    pub parent_hash: B256,
    /// Commitment to the ommer headers included in the block body.
    pub ommers_hash: B256,
    /// Commitment to the transactions included in the block body.
    pub transactions_root: B256,
    /// Height of the block. Equal to the parent number plus one once validated.
    pub number: BlockNumber,
    /// The difficulty target the block was mined against.
    pub difficulty: U256,
    /// Timestamp the block was mined at, in seconds.
    pub timestamp: u64,
    /// Arbitrary miner-supplied payload.
    pub extra_data: Bytes,
}

impl BlockHeader {
    /// Computes the hash of the header by encoding and hashing it.
    ///
    /// This is an allocating operation, prefer [`SealedHeader::hash`] for
    /// headers that have already been sealed.
    pub fn hash_slow(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }

    /// Seals the header, memoizing its hash.
    pub fn seal(self) -> SealedHeader {
        let hash = self.hash_slow();
        SealedHeader { header: self, hash }
    }
}

/// A header together with its memoized hash.
///
/// Sealing is the only way to construct this type, so the hash is always
/// consistent with the header contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedHeader {
    header: BlockHeader,
    hash: B256,
}

impl SealedHeader {
    /// Returns the memoized header hash.
    pub const fn hash(&self) -> B256 {
        self.hash
    }

    /// Returns the `(number, hash)` identifier of this header.
    pub const fn identifier(&self) -> BlockIdentifier {
        BlockIdentifier { number: self.header.number, hash: self.hash }
    }

    /// Consumes the seal, returning the raw header.
    pub fn unseal(self) -> BlockHeader {
        self.header
    }
}

impl Default for SealedHeader {
    fn default() -> Self {
        BlockHeader::default().seal()
    }
}

impl Deref for SealedHeader {
    type Target = BlockHeader;

    fn deref(&self) -> &Self::Target {
        &self.header
    }
}

impl AsRef<BlockHeader> for SealedHeader {
    fn as_ref(&self) -> &BlockHeader {
        &self.header
    }
}

/// A `(number, hash)` pair identifying one block, e.g. a skeleton checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockIdentifier {
    /// The block number.
    pub number: BlockNumber,
    /// The block hash.
    pub hash: B256,
}

impl BlockIdentifier {
    /// Creates a new block identifier.
    pub const fn new(number: BlockNumber, hash: B256) -> Self {
        Self { number, hash }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let header = BlockHeader { number: 7, timestamp: 1234, ..Default::default() };
        assert_eq!(header.hash_slow(), header.clone().seal().hash());
    }

    #[test]
    fn hash_covers_all_fields() {
        let base = BlockHeader::default();
        let mut tampered = base.clone();
        tampered.extra_data = Bytes::from_static(b"x");
        assert_ne!(base.hash_slow(), tampered.hash_slow());
    }

    #[test]
    fn sealed_default_is_consistent() {
        let sealed = SealedHeader::default();
        assert_eq!(sealed.hash(), BlockHeader::default().hash_slow());
    }
}
