use kestrel_interfaces::ChunkDescriptor;
use kestrel_primitives::{BlockIdentifier, BlockNumber, HashOrNumber};
use std::collections::VecDeque;
use tracing::trace;

/// Plans and tracks the chunk requests needed to fill in all headers between
/// skeleton checkpoints.
///
/// Given a skeleton (sparse, strictly increasing `(number, hash)` checkpoints
/// supplied by the peer) and a connection point (the last block both sides
/// agree on), the helper produces the ordered sequence of [`ChunkDescriptor`]s
/// covering every block above the connection point up to the last checkpoint.
/// Chunks are issued in ascending order; headers inside each response arrive
/// largest-number-first.
///
/// The helper also remembers the chunk most recently issued so the caller can
/// check that a response matches the outstanding request.
#[derive(Debug)]
pub struct ChunksDownloadHelper {
    skeleton: Vec<BlockIdentifier>,
    chunks: VecDeque<ChunkDescriptor>,
    current: Option<ChunkDescriptor>,
}

impl ChunksDownloadHelper {
    /// Plans the chunk sequence for the given skeleton and connection point.
    pub fn new(
        skeleton: Vec<BlockIdentifier>,
        connection_point: BlockNumber,
        chunk_size: u64,
    ) -> Self {
        let chunks = plan_chunks(&skeleton, connection_point, chunk_size);
        trace!(target: "sync::chunks", checkpoints = skeleton.len(), planned = chunks.len(), connection_point, "planned chunk download");
        Self { skeleton, chunks, current: None }
    }

    /// Returns whether unissued chunks remain.
    pub fn has_next_chunk(&self) -> bool {
        !self.chunks.is_empty()
    }

    /// Issues the next chunk, advancing the cursor.
    ///
    /// The returned descriptor is also recorded as the current chunk.
    pub fn next_chunk(&mut self) -> Option<ChunkDescriptor> {
        let chunk = self.chunks.pop_front()?;
        self.current = Some(chunk);
        Some(chunk)
    }

    /// Returns the descriptor most recently issued, if any.
    pub fn current_chunk(&self) -> Option<&ChunkDescriptor> {
        self.current.as_ref()
    }

    /// Returns the skeleton the plan was built from.
    pub fn skeleton(&self) -> &[BlockIdentifier] {
        &self.skeleton
    }
}

/// Splits every inter-checkpoint gap above the connection point into
/// `chunk_size`-bounded pieces.
///
/// A piece whose top lands on a checkpoint is anchored by the checkpoint hash;
/// intermediate pieces are anchored by the number of their highest block.
fn plan_chunks(
    skeleton: &[BlockIdentifier],
    connection_point: BlockNumber,
    chunk_size: u64,
) -> VecDeque<ChunkDescriptor> {
    let mut chunks = VecDeque::new();
    if chunk_size == 0 {
        return chunks
    }

    let mut lower = connection_point;
    for checkpoint in skeleton {
        if checkpoint.number <= lower {
            continue
        }
        loop {
            let remaining = checkpoint.number - lower;
            if remaining <= chunk_size {
                chunks.push_back(ChunkDescriptor::new(checkpoint.hash, remaining));
                lower = checkpoint.number;
                break
            }
            let top = lower + chunk_size;
            chunks.push_back(ChunkDescriptor::new(HashOrNumber::Number(top), chunk_size));
            lower = top;
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_primitives::B256;

    fn checkpoint(number: BlockNumber) -> BlockIdentifier {
        BlockIdentifier::new(number, B256::with_last_byte(number as u8))
    }

    #[test]
    fn splits_gap_into_bounded_chunks() {
        let genesis = checkpoint(0);
        let top = checkpoint(10);
        let mut helper = ChunksDownloadHelper::new(vec![genesis, top], 0, 5);

        assert!(helper.has_next_chunk());
        assert_eq!(helper.current_chunk(), None);

        // blocks 1-5, anchored by number since 5 is not a checkpoint
        let first = helper.next_chunk().unwrap();
        assert_eq!(first, ChunkDescriptor::new(HashOrNumber::Number(5), 5));
        assert_eq!(helper.current_chunk(), Some(&first));

        // blocks 6-10, anchored at the checkpoint hash
        let second = helper.next_chunk().unwrap();
        assert_eq!(second, ChunkDescriptor::new(top.hash, 5));

        assert!(!helper.has_next_chunk());
        assert_eq!(helper.next_chunk(), None);
        // the current chunk survives exhaustion for response matching
        assert_eq!(helper.current_chunk(), Some(&second));
    }

    #[test]
    fn aligned_checkpoints_map_one_to_one() {
        let skeleton = vec![checkpoint(0), checkpoint(5), checkpoint(10)];
        let mut helper = ChunksDownloadHelper::new(skeleton, 0, 5);

        assert_eq!(helper.next_chunk().unwrap(), ChunkDescriptor::new(checkpoint(5).hash, 5));
        assert_eq!(helper.next_chunk().unwrap(), ChunkDescriptor::new(checkpoint(10).hash, 5));
        assert!(!helper.has_next_chunk());
    }

    #[test]
    fn connection_point_skips_covered_checkpoints() {
        let skeleton = vec![checkpoint(0), checkpoint(5), checkpoint(10)];
        let mut helper = ChunksDownloadHelper::new(skeleton, 5, 5);

        assert_eq!(helper.next_chunk().unwrap(), ChunkDescriptor::new(checkpoint(10).hash, 5));
        assert!(!helper.has_next_chunk());
    }

    #[test]
    fn connection_point_inside_gap_shrinks_first_chunk() {
        let skeleton = vec![checkpoint(0), checkpoint(10)];
        let mut helper = ChunksDownloadHelper::new(skeleton, 7, 5);

        // only blocks 8-10 remain
        assert_eq!(helper.next_chunk().unwrap(), ChunkDescriptor::new(checkpoint(10).hash, 3));
        assert!(!helper.has_next_chunk());
    }

    #[test]
    fn exhausted_or_empty_skeleton_plans_nothing() {
        let mut helper = ChunksDownloadHelper::new(vec![], 0, 5);
        assert!(!helper.has_next_chunk());
        assert_eq!(helper.next_chunk(), None);

        let helper = ChunksDownloadHelper::new(vec![checkpoint(0), checkpoint(10)], 10, 5);
        assert!(!helper.has_next_chunk());
    }
}
