#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Chunked peer-to-peer block synchronization.
//!
//! The state machine in this crate drives a node from "behind the network" to
//! "caught up" against a single selected peer: it downloads headers in bounded
//! chunks planned from a skeleton of checkpoints, validates them into ordered
//! chain segments, and hands the segments off to body downloading. Two
//! backward states extend locally retained history below the pruned minimum
//! block by fetching one chunk of ancestor headers and persisting their bodies
//! one block at a time.
//!
//! States are purely reactive: an external driver constructs the initial
//! state, pumps peer responses and a periodic tick into it, and reacts to the
//! transitions the state requests through the
//! [`SyncEventsHandler`](kestrel_interfaces::SyncEventsHandler) boundary. A
//! session is abandoned wholesale on the first protocol violation or timeout;
//! retry happens at the session level by restarting with a different peer.

mod chunks;
mod completion;
mod config;
mod pending;
pub mod states;

pub use chunks::ChunksDownloadHelper;
pub use completion::{completion_pair, CompletionSignal, SyncComplete};
pub use config::SyncConfig;
pub use pending::PendingHeaders;
pub use states::{
    DownloadingBackwardsBodies, DownloadingBackwardsHeaders, DownloadingHeaders, SyncState,
};
