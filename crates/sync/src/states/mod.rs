//! The synchronization states.
//!
//! Each state is a reactive object: the driver constructs it, calls
//! [`SyncState::on_enter`], then feeds it peer responses and periodic ticks
//! until [`SyncState::is_terminated`] reports true. States never block and
//! never call back into the driver except through the events handler.

use kestrel_interfaces::SyncStateId;
use kestrel_primitives::{BlockBody, PeerId, SealedHeader};
use std::time::Duration;

mod backwards_bodies;
mod backwards_headers;
mod downloading_headers;

pub use backwards_bodies::DownloadingBackwardsBodies;
pub use backwards_headers::DownloadingBackwardsHeaders;
pub use downloading_headers::DownloadingHeaders;

/// A single state of the synchronization state machine.
///
/// Inputs a state does not handle are ignored, not errors: a body arriving
/// while headers are being downloaded is simply dropped by the default impl.
pub trait SyncState: Send {
    /// The identifier of this state, used in timeout and issue reports.
    fn id(&self) -> SyncStateId;

    /// Called once when the machine enters this state.
    fn on_enter(&mut self) {}

    /// Handles a headers response from the session peer.
    fn on_block_headers(&mut self, headers: Vec<SealedHeader>) {
        let _ = headers;
    }

    /// Handles a block body response.
    fn on_block_body(&mut self, peer: PeerId, body: BlockBody) {
        let _ = (peer, body);
    }

    /// Advances the state's timeout clock by `elapsed`.
    fn on_tick(&mut self, elapsed: Duration);

    /// Whether this state has finished, either by hand-off or by abort.
    fn is_terminated(&self) -> bool;
}

/// Tracks time waited for the current response.
///
/// The timer fires at most once: after crossing the limit it stays quiet until
/// [`StateTimer::reset`], so a stalled session produces a single timeout
/// report no matter how many ticks follow.
#[derive(Debug)]
pub(crate) struct StateTimer {
    elapsed: Duration,
    limit: Duration,
    fired: bool,
}

impl StateTimer {
    pub(crate) const fn new(limit: Duration) -> Self {
        Self { elapsed: Duration::ZERO, limit, fired: false }
    }

    /// Restarts the clock. Called only on confirmed progress.
    pub(crate) fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.fired = false;
    }

    /// Adds `elapsed` and returns true exactly once when the limit is crossed.
    pub(crate) fn advance(&mut self, elapsed: Duration) -> bool {
        self.elapsed += elapsed;
        if self.fired || self.elapsed < self.limit {
            return false
        }
        self.fired = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_exactly_once() {
        let mut timer = StateTimer::new(Duration::from_secs(10));
        assert!(!timer.advance(Duration::from_secs(4)));
        assert!(!timer.advance(Duration::from_secs(4)));
        assert!(timer.advance(Duration::from_secs(4)));
        assert!(!timer.advance(Duration::from_secs(100)));
    }

    #[test]
    fn reset_rearms_the_timer() {
        let mut timer = StateTimer::new(Duration::from_secs(1));
        assert!(timer.advance(Duration::from_secs(1)));
        timer.reset();
        assert!(!timer.advance(Duration::from_millis(999)));
        assert!(timer.advance(Duration::from_millis(1)));
    }
}
