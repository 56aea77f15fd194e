//! # Motorik - a phase-locked techno performance machine
//!
//! A fixed set of perpetually repeating loops - kick, break, hi-hat,
//! percussion, lead synth - each producing timed trigger events for an
//! external renderer, all phase-locked to the kick's pulse and live-tunable
//! over OSC while the music keeps playing.
//!
//! The crate is the synchronization and parameter-propagation core only:
//! it decides *when* to trigger *what* with *which* parameters. Sound
//! rendering happens on the other side of the [`render::Renderer`] seam.
//!
//! ## Architecture
//!
//! - [`channel`] - latest-wins single-slot inbox per control topic
//! - [`params`] - single-writer/multi-reader performance state
//! - [`sequencer`] - cyclic step rings with phase-aligned hot-swap
//! - [`cue`] / [`sync_loop`] - the startup rendezvous that phase-locks
//!   dependent loops to the pulse
//! - [`controllers`] - control-plane loops mapping `(selector, value)`
//!   messages into the store
//! - [`playback`] - the five music-making loops
//! - [`server`] - OSC transport feeding the control channels
//! - [`engine`] - wiring for the whole fixed loop set
//!
//! ## Data flow
//!
//! ```text
//! OSC -> ControlChannel -> controller loop -> ParameterStore
//!     -> (read at step time by) playback loops -> TriggerEvent -> renderer
//! ```

pub mod channel;
pub mod clock;
pub mod controllers;
pub mod cue;
pub mod engine;
pub mod params;
pub mod patterns;
pub mod playback;
pub mod random;
pub mod render;
pub mod sequencer;
pub mod server;
pub mod sync_loop;
