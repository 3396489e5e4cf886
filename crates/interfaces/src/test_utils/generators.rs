//! Generators for headers, blocks and chains used across the sync tests.

use kestrel_primitives::{
    Block, BlockBody, BlockHeader, BlockNumber, Bytes, SealedBlock, SealedHeader, U256,
};
use rand::{thread_rng, Rng};

/// Generates a child header of `parent` with a random difficulty.
pub fn child_header(parent: &SealedHeader) -> SealedHeader {
    let mut rng = thread_rng();
    BlockHeader {
        parent_hash: parent.hash(),
        number: parent.number + 1,
        difficulty: U256::from(rng.gen::<u32>().max(1)),
        timestamp: parent.timestamp + 10,
        ..Default::default()
    }
    .seal()
}

/// Generates `len` linked headers on top of `parent`, ascending by number.
pub fn header_chain(parent: &SealedHeader, len: usize) -> Vec<SealedHeader> {
    let mut headers = Vec::with_capacity(len);
    let mut parent = parent.clone();
    for _ in 0..len {
        let header = child_header(&parent);
        parent = header.clone();
        headers.push(header);
    }
    headers
}

/// Generates a child block of `parent` with a small random body.
pub fn child_block(parent: &SealedBlock) -> SealedBlock {
    let mut rng = thread_rng();
    let body = BlockBody {
        transactions: vec![Bytes::from(rng.gen::<[u8; 32]>().to_vec())],
        ommers: vec![],
    };
    let header = BlockHeader {
        parent_hash: parent.hash(),
        number: parent.number() + 1,
        difficulty: U256::from(rng.gen::<u32>().max(1)),
        timestamp: parent.header.timestamp + 10,
        ..Default::default()
    };
    Block::new(header, body).seal()
}

/// Generates `len` linked blocks with bodies, ascending, the first at
/// `first_number`.
pub fn block_chain(first_number: BlockNumber, len: usize) -> Vec<SealedBlock> {
    let base = Block::new(
        BlockHeader { number: first_number.saturating_sub(1), ..Default::default() },
        BlockBody::default(),
    )
    .seal();

    let mut blocks = Vec::with_capacity(len);
    let mut parent = base;
    for _ in 0..len {
        let block = child_block(&parent);
        parent = block.clone();
        blocks.push(block);
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_are_linked() {
        let genesis = SealedHeader::default();
        let headers = header_chain(&genesis, 5);
        for pair in headers.windows(2) {
            assert_eq!(pair[1].parent_hash, pair[0].hash());
            assert_eq!(pair[1].number, pair[0].number + 1);
        }

        let blocks = block_chain(10, 5);
        assert_eq!(blocks.first().map(|b| b.number()), Some(10));
        for pair in blocks.windows(2) {
            assert!(pair[0].is_parent_of(&pair[1]));
        }
    }
}
