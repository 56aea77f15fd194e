//! Startup cues
//!
//! A cue is a zero-payload signal named after its owning loop, fired once
//! per cycle. Dependent loops consume it exactly once: they block on their
//! first iteration until the owner has fired at least one cycle boundary,
//! then free-run at their own step rate. This one-shot rendezvous is a
//! different suspension discipline from the per-cycle blocking receive of
//! the controller loops - the two are deliberately kept as separate
//! primitives.

use tokio::sync::watch;
use tracing::debug;

/// Owning side of a cue. Held by the pulse loop, fired at every cycle
/// boundary.
pub struct Cue {
    name: &'static str,
    tx: watch::Sender<u64>,
}

impl Cue {
    pub fn new(name: &'static str) -> Self {
        let (tx, _) = watch::channel(0u64);
        Self { name, tx }
    }

    /// Subscribe a dependent loop. Handles can be created at any time
    /// before or after the first firing.
    pub fn listen(&self) -> CueHandle {
        CueHandle {
            name: self.name,
            rx: self.tx.subscribe(),
        }
    }

    /// Broadcast one cycle boundary to every dependent.
    pub fn fire(&self) {
        self.tx.send_modify(|cycles| *cycles += 1);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Dependent side of a cue.
pub struct CueHandle {
    name: &'static str,
    rx: watch::Receiver<u64>,
}

impl CueHandle {
    /// Suspend until the cue owner has fired at least once. Returns
    /// immediately if a cycle boundary already passed, so a dependent that
    /// starts late does not wait a whole extra cycle.
    pub async fn wait_first(&mut self) {
        if *self.rx.borrow_and_update() > 0 {
            return;
        }
        // The owner lives for the whole process; a closed channel only
        // happens during shutdown, where unblocking is the right move.
        let _ = self.rx.wait_for(|cycles| *cycles > 0).await;
        debug!(cue = self.name, "cue received, loop free-running");
    }
}
