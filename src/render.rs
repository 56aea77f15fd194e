//! Renderer seam
//!
//! The core never synthesizes audio. Playback loops emit trigger events
//! and controller loops emit effect-control events through this trait;
//! both are fire-and-forget - the core does not retry or observe the
//! renderer's outcome.

use rosc::{OscMessage, OscPacket, OscType};
use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use tracing::{debug, warn};

/// An instruction to the external renderer to play one sound.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent {
    /// Sample or synth voice identifier, e.g. `bd_haus` or `tb303`.
    pub sound: &'static str,
    /// Computed amplitude: pattern weight x volume parameter.
    pub amp: f32,
    /// Playback rate / pitch multiplier.
    pub rate: f32,
    /// Stereo position, -1.0 (left) to 1.0 (right).
    pub pan: f32,
    /// Per-event extras: note, envelope times, filter settings.
    pub extra: HashMap<&'static str, f32>,
}

/// Effect node addressed by an effect-control event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTarget {
    /// Global high-pass that kills the low end when engaged.
    LowKill,
    /// Shared reverb over the drum voices.
    DrumReverb,
    /// Low-pass in front of the break loop.
    BreakFilter,
}

impl EffectTarget {
    pub fn id(self) -> &'static str {
        match self {
            Self::LowKill => "lowkill",
            Self::DrumReverb => "drum_reverb",
            Self::BreakFilter => "break_filter",
        }
    }
}

/// A parameter set on a renderer-side effect node. The core sets values;
/// any smoothing/ramping is the renderer's business.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlEvent {
    pub target: EffectTarget,
    pub param: &'static str,
    pub value: f32,
}

/// External rendering engine as seen by the core.
pub trait Renderer: Send + Sync {
    fn trigger(&self, event: TriggerEvent);
    fn control(&self, event: ControlEvent);
}

/// Renderer that only logs. Useful when running the core without a sound
/// engine attached.
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn trigger(&self, event: TriggerEvent) {
        debug!(
            sound = event.sound,
            amp = event.amp,
            rate = event.rate,
            pan = event.pan,
            "trigger"
        );
    }

    fn control(&self, event: ControlEvent) {
        debug!(
            target = event.target.id(),
            param = event.param,
            value = event.value,
            "control"
        );
    }
}

/// Renderer that forwards events as OSC messages to an external sound
/// engine: `/trigger [sound amp rate pan (key value)...]` and
/// `/control [target param value]`.
pub struct OscRenderer {
    socket: UdpSocket,
    target: SocketAddr,
}

impl OscRenderer {
    pub fn new(target: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let target = target.parse()?;
        Ok(Self { socket, target })
    }

    fn send(&self, addr: &str, args: Vec<OscType>) {
        let packet = OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        });
        // Fire and forget: a dropped event must never stall a loop.
        match rosc::encoder::encode(&packet) {
            Ok(buf) => {
                if let Err(e) = self.socket.send_to(&buf, self.target) {
                    warn!("failed to send {addr} to renderer: {e}");
                }
            }
            Err(e) => warn!("failed to encode {addr}: {e}"),
        }
    }
}

impl Renderer for OscRenderer {
    fn trigger(&self, event: TriggerEvent) {
        let mut args = vec![
            OscType::String(event.sound.to_string()),
            OscType::Float(event.amp),
            OscType::Float(event.rate),
            OscType::Float(event.pan),
        ];
        for (key, value) in &event.extra {
            args.push(OscType::String(key.to_string()));
            args.push(OscType::Float(*value));
        }
        self.send("/trigger", args);
    }

    fn control(&self, event: ControlEvent) {
        self.send(
            "/control",
            vec![
                OscType::String(event.target.id().to_string()),
                OscType::String(event.param.to_string()),
                OscType::Float(event.value),
            ],
        );
    }
}
