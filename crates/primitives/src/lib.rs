#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Block primitives shared across the kestrel node.

mod block;
mod hash_or_number;
mod header;

pub use block::{Block, BlockBody, SealedBlock};
pub use hash_or_number::HashOrNumber;
pub use header::{BlockHeader, BlockIdentifier, SealedHeader};

pub use alloy_primitives::{Bytes, B256, B512, U256};

/// A block number.
pub type BlockNumber = u64;

/// The identity of a remote peer.
pub type PeerId = B512;

/// An identifier for an in-flight peer request.
pub type RequestId = u64;
