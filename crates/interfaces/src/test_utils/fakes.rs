//! Recording fakes for the collaborator interfaces.

use crate::{
    BlockStore, ChunkDescriptor, ConsensusError, DependentHeaderRule, HeaderValidationRule,
    SyncError, SyncEventsHandler, SyncIssue,
};
use kestrel_primitives::{
    BlockIdentifier, BlockNumber, PeerId, RequestId, SealedBlock, SealedHeader, B256, U256,
};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};

/// An events handler that records every call and lets tests toggle transport
/// failures.
#[derive(Debug, Default)]
pub struct TestSyncEventsHandler {
    recorded: Mutex<Recorded>,
    fail_header_requests: AtomicBool,
    fail_body_requests: AtomicBool,
    stopped: AtomicBool,
    next_request_id: AtomicU64,
}

#[derive(Debug, Default)]
struct Recorded {
    header_requests: Vec<(PeerId, ChunkDescriptor)>,
    body_requests: Vec<(PeerId, SealedHeader)>,
    errors: Vec<(PeerId, SyncError)>,
    issues: Vec<SyncIssue>,
    forward_handoffs: Vec<ForwardHandoff>,
    backward_handoffs: Vec<(PeerId, Vec<SealedHeader>)>,
}

/// Arguments of one recorded `start_downloading_bodies` call.
#[derive(Clone, Debug)]
pub struct ForwardHandoff {
    /// The validated header chain segments.
    pub chains: Vec<VecDeque<SealedHeader>>,
    /// The skeleton map that planned the download.
    pub skeletons: HashMap<PeerId, Vec<BlockIdentifier>>,
    /// The peer the session is bound to.
    pub peer: PeerId,
    /// Whether the session is catching up to the tip.
    pub forward: bool,
}

impl TestSyncEventsHandler {
    /// Makes subsequent header requests fail at the transport level.
    pub fn set_fail_header_requests(&self, fail: bool) {
        self.fail_header_requests.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent body requests fail at the transport level.
    pub fn set_fail_body_requests(&self, fail: bool) {
        self.fail_body_requests.store(fail, Ordering::SeqCst);
    }

    /// Returns the recorded header chunk requests.
    pub fn header_requests(&self) -> Vec<(PeerId, ChunkDescriptor)> {
        self.recorded.lock().header_requests.clone()
    }

    /// Returns the recorded body requests.
    pub fn body_requests(&self) -> Vec<(PeerId, SealedHeader)> {
        self.recorded.lock().body_requests.clone()
    }

    /// Returns the recorded peer-attributable errors.
    pub fn errors(&self) -> Vec<(PeerId, SyncError)> {
        self.recorded.lock().errors.clone()
    }

    /// Returns the recorded local issues.
    pub fn issues(&self) -> Vec<SyncIssue> {
        self.recorded.lock().issues.clone()
    }

    /// Returns the recorded forward body hand-offs.
    pub fn forward_handoffs(&self) -> Vec<ForwardHandoff> {
        self.recorded.lock().forward_handoffs.clone()
    }

    /// Returns the recorded backward body hand-offs.
    pub fn backward_handoffs(&self) -> Vec<(PeerId, Vec<SealedHeader>)> {
        self.recorded.lock().backward_handoffs.clone()
    }

    /// Whether `stop_syncing` has been invoked.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl SyncEventsHandler for TestSyncEventsHandler {
    fn send_block_headers_request(&self, peer: PeerId, chunk: ChunkDescriptor) -> bool {
        if self.fail_header_requests.load(Ordering::SeqCst) {
            return false
        }
        self.recorded.lock().header_requests.push((peer, chunk));
        true
    }

    fn send_body_request(&self, peer: PeerId, header: &SealedHeader) -> Option<RequestId> {
        if self.fail_body_requests.load(Ordering::SeqCst) {
            return None
        }
        self.recorded.lock().body_requests.push((peer, header.clone()));
        Some(self.next_request_id.fetch_add(1, Ordering::SeqCst))
    }

    fn start_downloading_bodies(
        &self,
        chains: Vec<VecDeque<SealedHeader>>,
        skeletons: HashMap<PeerId, Vec<BlockIdentifier>>,
        peer: PeerId,
        forward: bool,
    ) {
        self.recorded
            .lock()
            .forward_handoffs
            .push(ForwardHandoff { chains, skeletons, peer, forward });
    }

    fn backward_download_bodies(&self, peer: PeerId, headers: Vec<SealedHeader>) {
        self.recorded.lock().backward_handoffs.push((peer, headers));
    }

    fn on_error_syncing(&self, peer: PeerId, error: SyncError) {
        self.recorded.lock().errors.push((peer, error));
    }

    fn on_sync_issue(&self, issue: SyncIssue) {
        self.recorded.lock().issues.push(issue);
    }

    fn stop_syncing(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// An in-memory block store.
#[derive(Debug, Default)]
pub struct TestBlockStore {
    inner: RwLock<StoreInner>,
    flushes: AtomicUsize,
}

#[derive(Debug, Default)]
struct StoreInner {
    blocks: BTreeMap<BlockNumber, SealedBlock>,
    difficulties: HashMap<B256, U256>,
    best: HashSet<B256>,
}

impl TestBlockStore {
    /// Inserts a block with its total difficulty, for test setup.
    pub fn insert(&self, block: SealedBlock, total_difficulty: U256) {
        let mut inner = self.inner.write();
        inner.difficulties.insert(block.hash(), total_difficulty);
        inner.blocks.insert(block.number(), block);
    }

    /// Returns the number of blocks held.
    pub fn len(&self) -> usize {
        self.inner.read().blocks.len()
    }

    /// Whether the store holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.inner.read().blocks.is_empty()
    }

    /// Whether the given block was saved as part of the best chain.
    pub fn is_best(&self, hash: &B256) -> bool {
        self.inner.read().best.contains(hash)
    }

    /// Number of times `flush` has been called.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl BlockStore for TestBlockStore {
    fn min_number(&self) -> BlockNumber {
        self.inner.read().blocks.keys().next().copied().unwrap_or_default()
    }

    fn chain_block_by_number(&self, number: BlockNumber) -> Option<SealedBlock> {
        self.inner.read().blocks.get(&number).cloned()
    }

    fn total_difficulty_by_hash(&self, hash: &B256) -> Option<U256> {
        self.inner.read().difficulties.get(hash).copied()
    }

    fn save_block(&self, block: SealedBlock, total_difficulty: U256, best: bool) {
        let mut inner = self.inner.write();
        inner.difficulties.insert(block.hash(), total_difficulty);
        if best {
            inner.best.insert(block.hash());
        }
        inner.blocks.insert(block.number(), block);
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A stateless header rule with a switchable failure flag.
#[derive(Debug, Default)]
pub struct TestHeaderRule {
    fail_validation: AtomicBool,
}

impl TestHeaderRule {
    /// Makes subsequent validations fail.
    pub fn set_fail_validation(&self, fail: bool) {
        self.fail_validation.store(fail, Ordering::SeqCst);
    }
}

impl HeaderValidationRule for TestHeaderRule {
    fn validate(&self, _header: &SealedHeader) -> Result<(), ConsensusError> {
        if self.fail_validation.load(Ordering::SeqCst) {
            Err(ConsensusError::InvalidPow)
        } else {
            Ok(())
        }
    }
}

/// A parent-dependent header rule with a switchable failure flag.
#[derive(Debug, Default)]
pub struct TestParentRule {
    fail_validation: AtomicBool,
}

impl TestParentRule {
    /// Makes subsequent validations fail.
    pub fn set_fail_validation(&self, fail: bool) {
        self.fail_validation.store(fail, Ordering::SeqCst);
    }
}

impl DependentHeaderRule for TestParentRule {
    fn validate(
        &self,
        header: &SealedHeader,
        parent: &SealedHeader,
    ) -> Result<(), ConsensusError> {
        if self.fail_validation.load(Ordering::SeqCst) {
            Err(ConsensusError::DifficultyMismatch {
                got: header.difficulty,
                expected: parent.difficulty,
            })
        } else {
            Ok(())
        }
    }
}
