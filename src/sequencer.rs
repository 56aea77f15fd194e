//! Step rings
//!
//! A `StepRing` is a cyclic cursor over a fixed step sequence: drum loops
//! ring over amplitude weights (0.0 = muted step), the synth loop rings
//! over note-slot indices. Rings are owned exclusively by the loop that
//! steps them; cross-loop pattern changes go through the parameter store
//! and are applied by the owner via [`StepRing::replace`].

/// Cyclic index generator over a fixed-length step sequence.
#[derive(Debug, Clone)]
pub struct StepRing<T> {
    steps: Vec<T>,
    cursor: usize,
}

impl<T: Copy> StepRing<T> {
    /// Build a ring from a non-empty step sequence.
    pub fn new(steps: Vec<T>) -> Self {
        assert!(!steps.is_empty(), "a step ring needs at least one step");
        Self { steps, cursor: 0 }
    }

    /// Consume-then-advance: return the step at the cursor, then move the
    /// cursor forward one position, wrapping at the end.
    pub fn tick(&mut self) -> T {
        let step = self.steps[self.cursor];
        self.cursor = (self.cursor + 1) % self.steps.len();
        step
    }

    /// Read the step at the cursor without advancing.
    pub fn look(&self) -> T {
        self.steps[self.cursor]
    }

    /// Hot-swap the step sequence.
    ///
    /// The cursor is preserved modulo the new length, so a pattern change
    /// arriving mid-cycle stays phase-aligned with the shared pulse
    /// instead of snapping back to step zero.
    pub fn replace(&mut self, steps: Vec<T>) {
        assert!(!steps.is_empty(), "a step ring needs at least one step");
        self.cursor %= steps.len();
        self.steps = steps;
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
