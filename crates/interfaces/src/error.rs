use crate::ChunkDescriptor;
use kestrel_primitives::{BlockNumber, PeerId, B256, U256};
use std::fmt;
use thiserror::Error;

/// Identifies a sync state, used to tag error reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStateId {
    /// Forward header downloading.
    DownloadingHeaders,
    /// Backward header downloading.
    DownloadingBackwardsHeaders,
    /// Backward body downloading.
    DownloadingBackwardsBodies,
}

impl fmt::Display for SyncStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DownloadingHeaders => "DownloadingHeaders",
            Self::DownloadingBackwardsHeaders => "DownloadingBackwardsHeaders",
            Self::DownloadingBackwardsBodies => "DownloadingBackwardsBodies",
        };
        f.write_str(name)
    }
}

/// The reputation impact of a protocol violation, consumed by the peer
/// scoring collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReputationChangeKind {
    /// The peer answered with a message that does not match the request.
    BadMessage,
    /// The peer sent an invalid block header.
    BadHeader,
    /// The peer sent a body inconsistent with the requested header.
    BadBlock,
    /// The peer failed to answer within the configured window.
    Timeout,
}

/// A peer-attributable protocol violation.
///
/// These are reported through [`SyncEventsHandler::on_error_syncing`], never
/// returned across the state boundary.
///
/// [`SyncEventsHandler::on_error_syncing`]: crate::SyncEventsHandler::on_error_syncing
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The header chunk does not match the outstanding request.
    #[error("chunk mismatch: got {got_count} headers first {got_first:?}, expected {expected}")]
    InvalidChunk {
        /// The request that was outstanding.
        expected: ChunkDescriptor,
        /// Number of headers actually received.
        got_count: usize,
        /// Hash of the first received header, if any.
        got_first: Option<B256>,
    },
    /// A header failed parent linkage or a consensus header rule.
    #[error("invalid header {hash} at block {number}")]
    InvalidHeader {
        /// Number of the failing header.
        number: BlockNumber,
        /// Hash of the failing header.
        hash: B256,
    },
    /// A body response produced a block inconsistent with the requested
    /// header or its parent.
    #[error("body does not connect header {hash} to parent {parent}")]
    InvalidBlock {
        /// Hash of the header the body was requested for.
        hash: B256,
        /// Hash of the block the assembled block had to connect to.
        parent: B256,
    },
    /// No response arrived within the configured window.
    #[error("timed out waiting for a response in {state}")]
    Timeout {
        /// The state that was waiting.
        state: SyncStateId,
    },
}

impl SyncError {
    /// Returns the reputation impact of this violation.
    pub const fn reputation_change(&self) -> ReputationChangeKind {
        match self {
            Self::InvalidChunk { .. } => ReputationChangeKind::BadMessage,
            Self::InvalidHeader { .. } => ReputationChangeKind::BadHeader,
            Self::InvalidBlock { .. } => ReputationChangeKind::BadBlock,
            Self::Timeout { .. } => ReputationChangeKind::Timeout,
        }
    }
}

/// A failure that cannot be attributed to the selected peer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyncIssue {
    /// A headers response arrived while no chunk was in flight.
    #[error("no chunk in flight for headers response from peer {peer}")]
    MissingCurrentChunk {
        /// The peer the response came from.
        peer: PeerId,
    },
    /// The transport refused to dispatch a request.
    #[error("failed to dispatch request in {state} to peer {peer}")]
    RequestSendFailed {
        /// The state that attempted the send.
        state: SyncStateId,
        /// The peer the request was addressed to.
        peer: PeerId,
    },
    /// The minimum retained block is missing from the store.
    #[error("minimum retained block {number} missing from the store")]
    MissingMinimumBlock {
        /// The number the store reported as its minimum.
        number: BlockNumber,
    },
    /// A body response arrived while no body request was in flight.
    #[error("unexpected body response from peer {peer}")]
    UnexpectedBody {
        /// The peer the response came from.
        peer: PeerId,
    },
    /// The store has no total difficulty recorded for a block it holds.
    #[error("total difficulty missing for block {hash}")]
    MissingTotalDifficulty {
        /// The block hash the lookup failed for.
        hash: B256,
    },
}

/// A consensus-level header validation failure, produced by the pluggable
/// validation rules.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConsensusError {
    /// The header difficulty does not match the value derived from its parent.
    #[error("header difficulty {got} does not match the adjusted difficulty {expected}")]
    DifficultyMismatch {
        /// The difficulty the header declares.
        got: U256,
        /// The difficulty derived from the parent.
        expected: U256,
    },
    /// The header's proof of work does not meet its difficulty target.
    #[error("proof of work is invalid")]
    InvalidPow,
    /// The header timestamp does not advance past its parent.
    #[error("header timestamp {timestamp} is not after parent timestamp {parent}")]
    TimestampNotIncreasing {
        /// The header timestamp.
        timestamp: u64,
        /// The parent timestamp.
        parent: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reputation_mapping() {
        let err = SyncError::InvalidChunk {
            expected: ChunkDescriptor::new(10u64, 5),
            got_count: 3,
            got_first: None,
        };
        assert_eq!(err.reputation_change(), ReputationChangeKind::BadMessage);

        let err = SyncError::InvalidHeader { number: 1, hash: B256::ZERO };
        assert_eq!(err.reputation_change(), ReputationChangeKind::BadHeader);

        let err = SyncError::InvalidBlock { hash: B256::ZERO, parent: B256::ZERO };
        assert_eq!(err.reputation_change(), ReputationChangeKind::BadBlock);

        let err = SyncError::Timeout { state: SyncStateId::DownloadingHeaders };
        assert_eq!(err.reputation_change(), ReputationChangeKind::Timeout);
        assert_eq!(err.to_string(), "timed out waiting for a response in DownloadingHeaders");
    }
}
