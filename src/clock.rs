//! Beat-time clock
//!
//! Converts musical beats into wall durations at the configured tempo and
//! provides the per-step sleep primitive. Each loop carries its own copy
//! and advances its own virtual clock; the shared pulse only fixes the
//! phase origin of dependent loops, never their period.

use std::time::Duration;

/// Tempo in beats per minute. Copied freely into every loop task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f32,
}

impl Tempo {
    pub fn new(bpm: f32) -> Self {
        assert!(bpm > 0.0, "tempo must be positive");
        Self { bpm }
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Wall duration of the given number of beats.
    pub fn beats(&self, beats: f32) -> Duration {
        Duration::from_secs_f32(beats * 60.0 / self.bpm)
    }

    /// Suspend the calling task for the given number of beats. This is the
    /// only way a playback loop gives up the scheduler mid-cycle.
    pub async fn rest(&self, beats: f32) {
        tokio::time::sleep(self.beats(beats)).await;
    }
}
