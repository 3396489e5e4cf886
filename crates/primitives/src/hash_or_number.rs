use crate::BlockNumber;
use alloy_primitives::B256;
use std::fmt;

/// A block anchor: either a block hash or a block number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashOrNumber {
    /// The hash of a block.
    Hash(B256),
    /// The number of a block.
    Number(BlockNumber),
}

impl HashOrNumber {
    /// Returns the hash, if this anchor is a hash.
    pub const fn as_hash(&self) -> Option<B256> {
        match self {
            Self::Hash(hash) => Some(*hash),
            Self::Number(_) => None,
        }
    }

    /// Returns the block number, if this anchor is a number.
    pub const fn as_number(&self) -> Option<BlockNumber> {
        match self {
            Self::Hash(_) => None,
            Self::Number(number) => Some(*number),
        }
    }
}

impl From<B256> for HashOrNumber {
    fn from(hash: B256) -> Self {
        Self::Hash(hash)
    }
}

impl From<BlockNumber> for HashOrNumber {
    fn from(number: BlockNumber) -> Self {
        Self::Number(number)
    }
}

impl fmt::Display for HashOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash(hash) => write!(f, "{hash}"),
            Self::Number(number) => write!(f, "#{number}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        let hash = B256::repeat_byte(0xab);
        assert_eq!(HashOrNumber::from(hash).as_hash(), Some(hash));
        assert_eq!(HashOrNumber::from(42u64).as_number(), Some(42));
        assert_eq!(HashOrNumber::from(hash).as_number(), None);
    }

    #[test]
    fn display() {
        assert_eq!(HashOrNumber::from(42u64).to_string(), "#42");
    }
}
