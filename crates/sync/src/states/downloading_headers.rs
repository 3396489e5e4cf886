use crate::{
    chunks::ChunksDownloadHelper,
    pending::PendingHeaders,
    states::{StateTimer, SyncState},
    SyncConfig,
};
use kestrel_interfaces::{
    ChunkDescriptor, DependentHeaderRule, HeaderValidationRule, SyncError, SyncEventsHandler,
    SyncIssue, SyncStateId,
};
use kestrel_primitives::{BlockIdentifier, BlockNumber, HashOrNumber, PeerId, SealedHeader};
use std::{
    collections::{HashMap, VecDeque},
    mem,
    sync::Arc,
    time::Duration,
};
use tracing::{debug, trace};

/// Forward header downloading against the selected peer.
///
/// Chunks planned from the peer's skeleton are requested one at a time. Each
/// response is matched against the outstanding request, validated
/// oldest-to-newest, published to the shared [`PendingHeaders`] view and
/// collected into an ordered chain segment. Once the last chunk is accepted
/// the segments are handed to body downloading and the state completes.
///
/// Any protocol violation or timeout abandons the whole session: the state
/// terminates, the pending view is cleared and the driver restarts peer
/// selection.
pub struct DownloadingHeaders {
    events: Arc<dyn SyncEventsHandler>,
    header_rule: Arc<dyn HeaderValidationRule>,
    parent_rule: Arc<dyn DependentHeaderRule>,
    pending_view: PendingHeaders,
    /// Validated chain segments, one per accepted chunk, ascending.
    chains: Vec<VecDeque<SealedHeader>>,
    /// Skeletons of all candidate peers, forwarded on hand-off.
    skeletons: HashMap<PeerId, Vec<BlockIdentifier>>,
    chunks: ChunksDownloadHelper,
    forward: bool,
    peer: PeerId,
    timer: StateTimer,
    terminated: bool,
}

impl DownloadingHeaders {
    /// Creates the state for a session bound to `peer`.
    ///
    /// The chunk plan is built from the selected peer's skeleton and the
    /// connection point agreed with it. Any headers left in the shared view by
    /// a previous session are dropped.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &SyncConfig,
        events: Arc<dyn SyncEventsHandler>,
        pending_view: PendingHeaders,
        header_rule: Arc<dyn HeaderValidationRule>,
        parent_rule: Arc<dyn DependentHeaderRule>,
        forward: bool,
        peer: PeerId,
        skeletons: HashMap<PeerId, Vec<BlockIdentifier>>,
        connection_point: BlockNumber,
    ) -> Self {
        let skeleton = skeletons.get(&peer).cloned().unwrap_or_default();
        let chunks = ChunksDownloadHelper::new(skeleton, connection_point, config.chunk_size);
        pending_view.clear();
        Self {
            events,
            header_rule,
            parent_rule,
            pending_view,
            chains: Vec::new(),
            skeletons,
            chunks,
            forward,
            peer,
            timer: StateTimer::new(config.timeout),
            terminated: false,
        }
    }

    /// Returns the skeleton the chunk plan was built from.
    pub fn skeleton(&self) -> &[BlockIdentifier] {
        self.chunks.skeleton()
    }

    fn abort(&mut self) {
        self.terminated = true;
        self.pending_view.clear();
    }

    fn try_send_next_request(&mut self) {
        let Some(chunk) = self.chunks.next_chunk() else { return };
        trace!(target: "sync::headers", peer = %self.peer, %chunk, "requesting header chunk");
        if !self.events.send_block_headers_request(self.peer, chunk) {
            self.events
                .on_sync_issue(SyncIssue::RequestSendFailed { state: self.id(), peer: self.peer });
            self.abort();
        }
    }

    /// Checks the response against its outstanding request: the expected
    /// number of headers, anchored by the expected block. Responses are
    /// ordered largest-number-first, so the anchor is the first header.
    fn chunk_matches(expected: &ChunkDescriptor, headers: &[SealedHeader]) -> bool {
        if headers.len() as u64 != expected.count {
            return false
        }
        let Some(first) = headers.first() else { return false };
        match expected.start {
            HashOrNumber::Hash(hash) => first.hash() == hash,
            HashOrNumber::Number(number) => first.number == number,
        }
    }

    fn is_valid_successor(&self, header: &SealedHeader, parent: Option<&SealedHeader>) -> bool {
        if let Err(error) = self.header_rule.validate(header) {
            trace!(target: "sync::headers", %error, number = header.number, "header rule rejected header");
            return false
        }
        let Some(parent) = parent else { return true };
        if header.parent_hash != parent.hash() || header.number != parent.number + 1 {
            trace!(target: "sync::headers", number = header.number, "broken parent linkage");
            return false
        }
        if let Err(error) = self.parent_rule.validate(header, parent) {
            trace!(target: "sync::headers", %error, number = header.number, "parent rule rejected header");
            return false
        }
        true
    }
}

impl SyncState for DownloadingHeaders {
    fn id(&self) -> SyncStateId {
        SyncStateId::DownloadingHeaders
    }

    fn on_enter(&mut self) {
        if !self.chunks.has_next_chunk() {
            // nothing above the connection point, the node is already caught up
            debug!(target: "sync::headers", peer = %self.peer, "no chunks to download");
            self.events.stop_syncing();
            self.terminated = true;
            return
        }
        self.try_send_next_request();
    }

    fn on_block_headers(&mut self, headers: Vec<SealedHeader>) {
        if self.terminated {
            return
        }
        let Some(expected) = self.chunks.current_chunk().copied() else {
            self.events.on_sync_issue(SyncIssue::MissingCurrentChunk { peer: self.peer });
            return
        };
        if !Self::chunk_matches(&expected, &headers) {
            self.events.on_error_syncing(
                self.peer,
                SyncError::InvalidChunk {
                    expected,
                    got_count: headers.len(),
                    got_first: headers.first().map(|header| header.hash()),
                },
            );
            self.abort();
            return
        }

        // validate oldest to newest, pairwise within the chunk
        let mut chain = VecDeque::with_capacity(headers.len());
        for header in headers.into_iter().rev() {
            if !self.is_valid_successor(&header, chain.back()) {
                self.events.on_error_syncing(
                    self.peer,
                    SyncError::InvalidHeader { number: header.number, hash: header.hash() },
                );
                self.abort();
                return
            }
            self.pending_view.insert(header.clone());
            chain.push_back(header);
        }
        self.chains.push(chain);

        if self.chunks.has_next_chunk() {
            self.timer.reset();
            self.try_send_next_request();
            return
        }

        let chains = mem::take(&mut self.chains);
        let skeletons = mem::take(&mut self.skeletons);
        debug!(
            target: "sync::headers",
            segments = chains.len(),
            peer = %self.peer,
            forward = self.forward,
            "handing validated headers over to body download"
        );
        self.events.start_downloading_bodies(chains, skeletons, self.peer, self.forward);
        self.pending_view.clear();
        self.terminated = true;
    }

    fn on_tick(&mut self, elapsed: Duration) {
        if self.terminated {
            return
        }
        if self.timer.advance(elapsed) {
            self.events.on_error_syncing(self.peer, SyncError::Timeout { state: self.id() });
            self.abort();
        }
    }

    fn is_terminated(&self) -> bool {
        self.terminated
    }
}
