use crate::{SyncError, SyncIssue};
use kestrel_primitives::{BlockIdentifier, HashOrNumber, PeerId, RequestId, SealedHeader};
use std::{
    collections::{HashMap, VecDeque},
    fmt,
};

/// An immutable request unit: one bounded batch of headers to request from a
/// peer.
///
/// `start` anchors the chunk at its highest block — by hash when that block is
/// a known checkpoint (or, for backward requests, the local minimum block), by
/// number otherwise. Peers answer with headers in descending number order;
/// forward requests include the anchor block, backward requests start strictly
/// below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// The anchor of the chunk.
    pub start: HashOrNumber,
    /// The number of headers requested. Always non-zero and bounded by the
    /// configured chunk size.
    pub count: u64,
}

impl ChunkDescriptor {
    /// Creates a new chunk descriptor.
    pub fn new(start: impl Into<HashOrNumber>, count: u64) -> Self {
        Self { start: start.into(), count }
    }
}

impl fmt::Display for ChunkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} headers at {}", self.count, self.start)
    }
}

/// The dispatch boundary every sync state reports through.
///
/// Implementations wire the states to the transport layer, the peer scoring
/// collaborator and the state machine driver. All methods take `&self`: the
/// handler is shared and must synchronize internally.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait SyncEventsHandler: Send + Sync {
    /// Dispatches a header chunk request to the given peer.
    ///
    /// Returns whether the request was sent. `false` signals a transport-level
    /// failure and the calling state aborts.
    fn send_block_headers_request(&self, peer: PeerId, chunk: ChunkDescriptor) -> bool;

    /// Dispatches a single-block body request to the given peer.
    ///
    /// Returns the identifier of the in-flight request, or `None` on transport
    /// failure.
    fn send_body_request(&self, peer: PeerId, header: &SealedHeader) -> Option<RequestId>;

    /// Requests the transition into forward body downloading, handing over the
    /// validated header chain segments and the skeleton map.
    fn start_downloading_bodies(
        &self,
        chains: Vec<VecDeque<SealedHeader>>,
        skeletons: HashMap<PeerId, Vec<BlockIdentifier>>,
        peer: PeerId,
        forward: bool,
    );

    /// Requests the transition into backward body downloading for the given
    /// header batch.
    fn backward_download_bodies(&self, peer: PeerId, headers: Vec<SealedHeader>);

    /// Reports a peer-attributable protocol violation. The session is over;
    /// the driver is expected to penalize the peer and restart peer selection.
    fn on_error_syncing(&self, peer: PeerId, error: SyncError);

    /// Reports a failure that cannot be attributed to the peer, e.g. a local
    /// transport send failure.
    fn on_sync_issue(&self, issue: SyncIssue);

    /// Signals successful, complete termination of the sync session.
    fn stop_syncing(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_primitives::B256;

    #[test]
    fn descriptor_display() {
        let chunk = ChunkDescriptor::new(42u64, 5);
        assert_eq!(chunk.to_string(), "5 headers at #42");

        let chunk = ChunkDescriptor::new(B256::ZERO, 192);
        assert!(chunk.to_string().starts_with("192 headers at 0x"));
    }
}
