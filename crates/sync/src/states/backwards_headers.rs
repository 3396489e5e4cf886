use crate::{
    states::{StateTimer, SyncState},
    SyncConfig,
};
use kestrel_interfaces::{
    BlockStore, ChunkDescriptor, SyncError, SyncEventsHandler, SyncIssue, SyncStateId,
};
use kestrel_primitives::{PeerId, SealedHeader};
use std::{sync::Arc, time::Duration};
use tracing::{debug, trace};

/// Backward header downloading below the minimum retained block.
///
/// A pruned node extends its history by requesting a single chunk of headers
/// anchored at the minimum block it holds; peers answer with the ancestors in
/// descending order, starting strictly below the anchor. The headers are not
/// validated here: each one is confirmed later when its body is downloaded and
/// the assembled block must hash-link to the block above it.
pub struct DownloadingBackwardsHeaders {
    events: Arc<dyn SyncEventsHandler>,
    store: Arc<dyn BlockStore>,
    chunk_size: u64,
    peer: PeerId,
    timer: StateTimer,
    terminated: bool,
}

impl DownloadingBackwardsHeaders {
    /// Creates the state for a session bound to `peer`.
    pub fn new(
        config: &SyncConfig,
        events: Arc<dyn SyncEventsHandler>,
        store: Arc<dyn BlockStore>,
        peer: PeerId,
    ) -> Self {
        Self {
            events,
            store,
            chunk_size: config.chunk_size,
            peer,
            timer: StateTimer::new(config.timeout),
            terminated: false,
        }
    }
}

impl SyncState for DownloadingBackwardsHeaders {
    fn id(&self) -> SyncStateId {
        SyncStateId::DownloadingBackwardsHeaders
    }

    fn on_enter(&mut self) {
        let min_number = self.store.min_number();
        let Some(anchor) = self.store.chain_block_by_number(min_number) else {
            self.events.on_sync_issue(SyncIssue::MissingMinimumBlock { number: min_number });
            self.terminated = true;
            return
        };

        let chunk = ChunkDescriptor::new(anchor.hash(), self.chunk_size);
        trace!(target: "sync::backwards_headers", peer = %self.peer, %chunk, number = min_number, "requesting ancestor headers");
        if !self.events.send_block_headers_request(self.peer, chunk) {
            self.events
                .on_sync_issue(SyncIssue::RequestSendFailed { state: self.id(), peer: self.peer });
            self.terminated = true;
        }
    }

    fn on_block_headers(&mut self, headers: Vec<SealedHeader>) {
        if self.terminated {
            return
        }
        debug!(target: "sync::backwards_headers", peer = %self.peer, count = headers.len(), "handing ancestor headers over to body download");
        self.events.backward_download_bodies(self.peer, headers);
        self.terminated = true;
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

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use kestrel_interfaces::test_utils::{block_chain, TestBlockStore, TestSyncEventsHandler};
    use kestrel_primitives::{B512, U256};

    fn setup() -> (Arc<TestSyncEventsHandler>, Arc<TestBlockStore>, PeerId) {
        (
            Arc::new(TestSyncEventsHandler::default()),
            Arc::new(TestBlockStore::default()),
            B512::with_last_byte(7),
        )
    }

    fn state(
        events: &Arc<TestSyncEventsHandler>,
        store: &Arc<TestBlockStore>,
        peer: PeerId,
    ) -> DownloadingBackwardsHeaders {
        let config = SyncConfig { chunk_size: 20, ..Default::default() };
        DownloadingBackwardsHeaders::new(&config, events.clone(), store.clone(), peer)
    }

    #[test]
    fn requests_one_chunk_anchored_at_the_minimum_block() {
        let (events, store, peer) = setup();
        let min = block_chain(100, 1).remove(0);
        store.insert(min.clone(), U256::from(1000));

        let mut state = state(&events, &store, peer);
        state.on_enter();
        assert!(!state.is_terminated());
        assert_eq!(events.header_requests(), vec![(peer, ChunkDescriptor::new(min.hash(), 20))]);
    }

    #[test]
    fn hands_headers_over_unvalidated() {
        let (events, store, peer) = setup();
        let min = block_chain(100, 1).remove(0);
        store.insert(min, U256::from(1000));

        let mut state = state(&events, &store, peer);
        state.on_enter();

        // any batch is forwarded as-is, body download confirms linkage
        let headers: Vec<_> =
            block_chain(80, 20).into_iter().rev().map(|block| block.split().0).collect();
        state.on_block_headers(headers.clone());
        assert!(state.is_terminated());
        assert_eq!(events.backward_handoffs(), vec![(peer, headers)]);
        assert!(events.errors().is_empty());
    }

    #[test]
    fn missing_minimum_block_is_an_issue() {
        let (events, store, peer) = setup();
        let mut state = state(&events, &store, peer);

        state.on_enter();
        assert!(state.is_terminated());
        assert_eq!(events.issues(), vec![SyncIssue::MissingMinimumBlock { number: 0 }]);
        assert!(events.header_requests().is_empty());
    }

    #[test]
    fn transport_failure_aborts() {
        let (events, store, peer) = setup();
        store.insert(block_chain(100, 1).remove(0), U256::from(1000));
        events.set_fail_header_requests(true);

        let mut state = state(&events, &store, peer);
        state.on_enter();
        assert!(state.is_terminated());
        assert_eq!(
            events.issues(),
            vec![SyncIssue::RequestSendFailed {
                state: SyncStateId::DownloadingBackwardsHeaders,
                peer
            }]
        );
    }

    #[test]
    fn timeout_fires_exactly_once() {
        let (events, store, peer) = setup();
        store.insert(block_chain(100, 1).remove(0), U256::from(1000));

        let mut state = state(&events, &store, peer);
        state.on_enter();
        state.on_tick(Duration::from_secs(31));
        state.on_tick(Duration::from_secs(31));
        assert!(state.is_terminated());
        assert_matches!(
            events.errors().as_slice(),
            [(_, SyncError::Timeout { state: SyncStateId::DownloadingBackwardsHeaders })]
        );

        // a late response after the timeout is dropped
        state.on_block_headers(vec![]);
        assert!(events.backward_handoffs().is_empty());
    }
}
