#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Interfaces between the kestrel sync pipeline and its collaborators.
//!
//! The sync states are purely reactive: every side effect — sending requests,
//! reporting protocol violations, requesting transitions — goes through the
//! [`SyncEventsHandler`] boundary, and every service they consume — the block
//! store, the header validation rules — is a trait defined here. This keeps
//! the states deterministic and unit testable with the recording fakes in
//! [`test_utils`].

/// Error taxonomy surfaced through the events handler.
mod error;
pub use error::{ConsensusError, ReputationChangeKind, SyncError, SyncIssue, SyncStateId};

/// The dispatch boundary consumed by every sync state.
mod events;
pub use events::{ChunkDescriptor, SyncEventsHandler};

/// Block storage abstraction.
mod store;
pub use store::BlockStore;

/// Header validation rule traits.
mod validation;
pub use validation::{DependentHeaderRule, HeaderValidationRule};

#[cfg(any(test, feature = "test-utils"))]
/// Common test helpers for mocking out the events handler, block store and
/// validation rules.
pub mod test_utils;
