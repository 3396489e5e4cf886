use kestrel_primitives::{BlockNumber, SealedBlock, B256, U256};

/// Read and append access to the canonical block store.
///
/// The header downloading states only read from the store; durable storage is
/// mutated exclusively by the body downloading states, append-then-flush.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait BlockStore: Send + Sync {
    /// Returns the lowest block number retained by the store.
    fn min_number(&self) -> BlockNumber;

    /// Returns the block at the given height on the canonical chain.
    fn chain_block_by_number(&self, number: BlockNumber) -> Option<SealedBlock>;

    /// Returns the cumulative total difficulty recorded for the given block.
    fn total_difficulty_by_hash(&self, hash: &B256) -> Option<U256>;

    /// Appends a block with its cumulative total difficulty, optionally
    /// marking it part of the best chain.
    fn save_block(&self, block: SealedBlock, total_difficulty: U256, best: bool);

    /// Flushes appended blocks to durable storage.
    fn flush(&self);
}
