//! Drum pattern presets
//!
//! Four preset pairs for the kick and hi-hat rings, selected live by the
//! `/pattern` topic. Several hi-hat steps take a freshly randomized ghost
//! weight whenever the selection changes and the ring is rebuilt.

use crate::random::RandomSource;

/// Steps per drum cycle.
pub const STEPS: usize = 16;

/// Number of selectable preset pairs.
pub const PRESETS: u8 = 4;

/// Startup kick pattern: four to the floor.
pub fn default_kick() -> Vec<f32> {
    let mut steps = vec![0.0; STEPS];
    for beat in steps.iter_mut().step_by(4) {
        *beat = 1.0;
    }
    steps
}

/// Startup hi-hat pattern: straight sixteenths.
pub fn default_hihat() -> Vec<f32> {
    vec![1.0; STEPS]
}

/// Kick weights for a preset. Callers guarantee `preset < PRESETS`;
/// anything else falls back to the startup pattern.
pub fn kick_preset(preset: u8) -> Vec<f32> {
    match preset {
        0 => default_kick(),
        1 => vec![
            1.0, 0.0, 0.0, 0.3, 0.0, 0.75, 0.0, 0.0, 1.0, 0.0, 0.0, 0.2, 1.0, 0.0, 0.0, 0.0,
        ],
        2 => vec![
            1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ],
        3 => vec![
            1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.25,
        ],
        _ => default_kick(),
    }
}

/// Hi-hat weights for a preset, ghost notes randomized at swap time.
pub fn hihat_preset(preset: u8, rng: &mut impl RandomSource) -> Vec<f32> {
    match preset {
        0 => vec![
            rng.range(0.6, 0.9),
            1.0,
            0.8,
            1.0,
            1.0,
            1.0,
            rng.range(0.6, 0.9),
            1.0,
            1.0,
            rng.range(0.6, 0.9),
            1.0,
            rng.range(0.6, 0.9),
            1.0,
            1.0,
            1.0,
            1.0,
        ],
        1 => vec![
            0.25,
            0.5,
            1.0,
            0.5,
            0.25,
            0.5,
            1.0,
            0.5,
            0.25,
            0.5,
            1.0,
            0.5,
            0.5,
            0.25,
            1.0,
            rng.range(0.6, 1.0),
        ],
        2 => vec![
            0.5,
            0.5,
            1.0,
            0.45,
            0.25,
            0.5,
            rng.range(0.7, 1.0),
            0.5,
            0.25,
            0.6,
            1.0,
            0.35,
            0.25,
            1.0,
            0.5,
            0.75,
        ],
        3 => vec![
            0.0,
            rng.range(0.5, 0.8),
            1.0,
            0.0,
            0.6,
            1.0,
            0.0,
            rng.range(0.5, 0.7),
            rng.range(0.8, 1.0),
            0.0,
            0.6,
            1.0,
            0.0,
            0.6,
            1.0,
            1.2,
        ],
        _ => default_hihat(),
    }
}
