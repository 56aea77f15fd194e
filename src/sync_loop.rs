//! Synced loops
//!
//! The general shape of every task in the engine: a perpetually repeating
//! loop that optionally blocks once at startup until a named cue fires,
//! then runs fixed-duration cycles forever. Playback loops and controller
//! loops are both built on this; there is no stop operation - termination
//! is process-wide shutdown only.

use crate::cue::{Cue, CueHandle};
use tracing::debug;

/// Loop lifecycle. A loop with no sync dependency starts directly in
/// `Running`; a dependent loop parks in `WaitingForCue` until its source
/// emits the first cycle boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    WaitingForCue,
    Running,
}

/// Per-loop sync state: the startup rendezvous plus an optional cue this
/// loop itself owns and fires at every cycle boundary.
pub struct SyncedLoop {
    name: &'static str,
    state: LoopState,
    sync: Option<CueHandle>,
    cue: Option<Cue>,
}

impl SyncedLoop {
    /// A loop with no sync dependency.
    pub fn free_running(name: &'static str) -> Self {
        Self {
            name,
            state: LoopState::Running,
            sync: None,
            cue: None,
        }
    }

    /// A loop that aligns its start to the first cycle boundary of another
    /// loop's cue.
    pub fn synced(name: &'static str, source: CueHandle) -> Self {
        Self {
            name,
            state: LoopState::WaitingForCue,
            sync: Some(source),
            cue: None,
        }
    }

    /// Make this loop a cue owner. The pulse loop uses this to fan its
    /// cycle boundary out to every dependent.
    pub fn with_cue(mut self, cue: Cue) -> Self {
        self.cue = Some(cue);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Open one cycle: on the very first call of a dependent loop this
    /// suspends until the sync source fires, transitioning
    /// `WaitingForCue -> Running`; on every call a cue owner broadcasts
    /// its own boundary. All later cycles of a dependent start without
    /// waiting - phase lock is a startup-only rendezvous.
    pub async fn begin_cycle(&mut self) {
        if self.state == LoopState::WaitingForCue {
            if let Some(source) = self.sync.as_mut() {
                source.wait_first().await;
            }
            self.state = LoopState::Running;
            debug!(name = self.name, "loop running");
        }
        if let Some(cue) = &self.cue {
            cue.fire();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn dependent_first_cycle_waits_for_source_boundary() {
        let cue = Cue::new("pulse");
        let handle = cue.listen();

        let dependent = tokio::spawn(async move {
            let mut lp = SyncedLoop::synced("hihat", handle);
            lp.begin_cycle().await;
            Instant::now()
        });

        // Hold the pulse back for a while before its first boundary.
        let fired_at = Instant::now() + Duration::from_millis(300);
        tokio::time::sleep_until(fired_at).await;
        cue.fire();

        let first_step = dependent.await.unwrap();
        assert!(first_step >= fired_at);
    }

    #[tokio::test]
    async fn free_running_loop_starts_immediately() {
        let mut lp = SyncedLoop::free_running("controller");
        assert_eq!(lp.state(), LoopState::Running);
        lp.begin_cycle().await;
        assert_eq!(lp.state(), LoopState::Running);
    }

    #[tokio::test]
    async fn second_cycle_does_not_resynchronize() {
        let cue = Cue::new("pulse");
        let mut lp = SyncedLoop::synced("synth", cue.listen());
        cue.fire();
        lp.begin_cycle().await;
        assert_eq!(lp.state(), LoopState::Running);
        // No further firing: the second cycle must not block.
        tokio::time::timeout(Duration::from_secs(1), lp.begin_cycle())
            .await
            .expect("free-run after the startup rendezvous");
    }

    #[tokio::test(start_paused = true)]
    async fn cue_owner_broadcasts_every_cycle() {
        let cue = Cue::new("pulse");
        let mut late = cue.listen();
        let mut lp = SyncedLoop::free_running("kick").with_cue(cue);
        lp.begin_cycle().await;
        // A dependent subscribing after the first boundary sees it at once.
        tokio::time::timeout(Duration::from_secs(1), late.wait_first())
            .await
            .expect("boundary already passed");
    }
}
