use crate::{
    states::{StateTimer, SyncState},
    SyncConfig,
};
use kestrel_interfaces::{BlockStore, SyncError, SyncEventsHandler, SyncIssue, SyncStateId};
use kestrel_primitives::{Block, BlockBody, PeerId, SealedBlock, SealedHeader};
use std::{collections::VecDeque, sync::Arc, time::Duration};
use tracing::{debug, trace};

/// Backward body downloading below the minimum retained block.
///
/// Bodies are requested one at a time, newest to oldest, for the ancestor
/// headers produced by backward header downloading. Each assembled block must
/// hash to the requested header and be the parent of the lowest block already
/// connected (the `child` anchor, initially the minimum retained block); this
/// linkage is the only validation the unvalidated ancestor headers ever get.
/// Accepted blocks are persisted with a total difficulty derived by walking
/// downward from the child's, and the store is flushed once when the queue is
/// drained.
pub struct DownloadingBackwardsBodies {
    events: Arc<dyn SyncEventsHandler>,
    store: Arc<dyn BlockStore>,
    /// Headers awaiting a body request, descending by number.
    to_request: VecDeque<SealedHeader>,
    /// The header whose body is in flight.
    in_transit: Option<SealedHeader>,
    /// The lowest block connected so far. Every accepted block becomes the
    /// next anchor.
    child: Option<SealedBlock>,
    peer: PeerId,
    timer: StateTimer,
    terminated: bool,
}

impl DownloadingBackwardsBodies {
    /// Creates the state for a session bound to `peer`.
    ///
    /// `headers` are the ancestors to fill in, newest first, as delivered by
    /// backward header downloading.
    pub fn new(
        config: &SyncConfig,
        events: Arc<dyn SyncEventsHandler>,
        store: Arc<dyn BlockStore>,
        headers: Vec<SealedHeader>,
        peer: PeerId,
    ) -> Self {
        let child = store.chain_block_by_number(store.min_number());
        Self {
            events,
            store,
            to_request: headers.into(),
            in_transit: None,
            child,
            peer,
            timer: StateTimer::new(config.timeout),
            terminated: false,
        }
    }

    fn complete(&mut self) {
        debug!(target: "sync::backwards_bodies", peer = %self.peer, "ancestor bodies downloaded");
        self.store.flush();
        self.events.stop_syncing();
        self.terminated = true;
    }

    fn request_next_body(&mut self) {
        let Some(header) = self.to_request.pop_front() else { return };
        match self.events.send_body_request(self.peer, &header) {
            Some(request_id) => {
                trace!(target: "sync::backwards_bodies", peer = %self.peer, request_id, number = header.number, "requesting block body");
                self.in_transit = Some(header);
            }
            None => {
                self.events.on_sync_issue(SyncIssue::RequestSendFailed {
                    state: self.id(),
                    peer: self.peer,
                });
                self.terminated = true;
            }
        }
    }
}

impl SyncState for DownloadingBackwardsBodies {
    fn id(&self) -> SyncStateId {
        SyncStateId::DownloadingBackwardsBodies
    }

    fn on_enter(&mut self) {
        if self.child.is_none() {
            self.events
                .on_sync_issue(SyncIssue::MissingMinimumBlock { number: self.store.min_number() });
            self.terminated = true;
            return
        }
        if self.to_request.is_empty() {
            self.complete();
            return
        }
        self.request_next_body();
    }

    fn on_block_body(&mut self, peer: PeerId, body: BlockBody) {
        if self.terminated {
            return
        }
        let Some(header) = self.in_transit.take() else {
            self.events.on_sync_issue(SyncIssue::UnexpectedBody { peer });
            return
        };
        let Some(child) = self.child.take() else { return };

        // the sealed hash commits to the body, so a wrong body shows up as a
        // hash mismatch against the requested header
        let expected = header.hash();
        let block = Block::new(header.unseal(), body).seal();
        if block.hash() != expected || !block.is_parent_of(&child) {
            self.events.on_error_syncing(
                self.peer,
                SyncError::InvalidBlock { hash: expected, parent: child.hash() },
            );
            self.terminated = true;
            return
        }

        let Some(child_difficulty) = self.store.total_difficulty_by_hash(&child.hash()) else {
            self.events
                .on_sync_issue(SyncIssue::MissingTotalDifficulty { hash: child.hash() });
            self.terminated = true;
            return
        };

        // total difficulty decreases walking toward genesis
        let total_difficulty = child_difficulty.saturating_sub(block.difficulty());
        self.store.save_block(block.clone(), total_difficulty, true);
        self.child = Some(block);
        self.timer.reset();

        if self.to_request.is_empty() {
            self.complete();
        } else {
            self.request_next_body();
        }
    }

    fn on_tick(&mut self, elapsed: Duration) {
        if self.terminated {
            return
        }
        if self.timer.advance(elapsed) {
            self.events.on_error_syncing(self.peer, SyncError::Timeout { state: self.id() });
            self.terminated = true;
        }
    }

    fn is_terminated(&self) -> bool {
        self.terminated
    }
}
