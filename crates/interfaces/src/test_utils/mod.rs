//! Testing support for the sync collaborator interfaces.

mod fakes;
mod generators;

pub use fakes::{
    ForwardHandoff, TestBlockStore, TestHeaderRule, TestParentRule, TestSyncEventsHandler,
};
pub use generators::{block_chain, child_block, child_header, header_chain};
