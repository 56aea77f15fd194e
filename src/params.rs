//! Shared performance state
//!
//! Every live-tunable value lives here in an atomic cell (lock-free for
//! the scalar fields; `AtomicCell` falls back to a seqlock for note slots,
//! which still gives untorn per-slot reads). The contract is
//! single-writer/multi-reader: exactly one controller loop writes a given
//! field, while any number of playback loops read it at step time. There
//! are no cross-field transactions - each external message stream controls
//! an independent slice of the store, so a reader may legitimately see
//! field A fresh and field B stale within one step.

use crossbeam::atomic::AtomicCell;

/// A pitch slot in the shared note sequence. `None` is a rest.
pub type Note = Option<u8>;

/// Number of slots in the shared note sequence.
pub const NOTE_SLOTS: usize = 8;

/// Waveform choices for the lead oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Osc1Waveform {
    Tb303,
    Saw,
    Pulse,
    ModSaw,
}

impl Osc1Waveform {
    pub fn from_index(ix: i32) -> Option<Self> {
        match ix {
            0 => Some(Self::Tb303),
            1 => Some(Self::Saw),
            2 => Some(Self::Pulse),
            3 => Some(Self::ModSaw),
            _ => None,
        }
    }

    /// Voice identifier handed to the external renderer.
    pub fn sound_id(self) -> &'static str {
        match self {
            Self::Tb303 => "tb303",
            Self::Saw => "saw",
            Self::Pulse => "pulse",
            Self::ModSaw => "mod_saw",
        }
    }
}

/// Waveform choices for the second oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Osc2Waveform {
    Saw,
    Pluck,
    PrettyBell,
}

impl Osc2Waveform {
    pub fn from_index(ix: i32) -> Option<Self> {
        match ix {
            0 => Some(Self::Saw),
            1 => Some(Self::Pluck),
            2 => Some(Self::PrettyBell),
            _ => None,
        }
    }

    pub fn sound_id(self) -> &'static str {
        match self {
            Self::Saw => "saw",
            Self::Pluck => "pluck",
            Self::PrettyBell => "pretty_bell",
        }
    }
}

/// Drum kit selection: one message swaps the kick, hi-hat and break
/// samples together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumKit {
    Classic,
    Tabla,
    Safari,
    Breakbeat,
}

impl DrumKit {
    pub fn from_index(ix: i32) -> Option<Self> {
        match ix {
            0 => Some(Self::Classic),
            1 => Some(Self::Tabla),
            2 => Some(Self::Safari),
            3 => Some(Self::Breakbeat),
            _ => None,
        }
    }

    pub fn kick_sample(self) -> &'static str {
        match self {
            Self::Classic => "bd_haus",
            Self::Tabla => "bd_sone",
            Self::Safari => "bd_fat",
            Self::Breakbeat => "bd_tek",
        }
    }

    pub fn hihat_sample(self) -> &'static str {
        match self {
            Self::Classic => "drum_cymbal_closed",
            Self::Tabla => "drum_cymbal_pedal",
            Self::Safari => "elec_tick",
            Self::Breakbeat => "elec_ping",
        }
    }

    pub fn break_sample(self) -> &'static str {
        match self {
            Self::Classic => "loop_amen",
            Self::Tabla => "loop_tabla",
            Self::Safari => "loop_safari",
            Self::Breakbeat => "loop_breakbeat",
        }
    }
}

/// Per-drum-voice parameters (kick and hi-hat use all four fields; the
/// percussion voice ignores `rate`).
pub struct DrumParams {
    pub toggle: AtomicCell<bool>,
    pub volume: AtomicCell<f32>,
    pub decay: AtomicCell<f32>,
    pub rate: AtomicCell<f32>,
}

impl DrumParams {
    fn new(volume: f32, decay: f32, rate: f32) -> Self {
        Self {
            toggle: AtomicCell::new(false),
            volume: AtomicCell::new(volume),
            decay: AtomicCell::new(decay),
            rate: AtomicCell::new(rate),
        }
    }
}

/// Break loop parameters: filter cutoff plus volume.
pub struct BreakParams {
    pub cutoff: AtomicCell<f32>,
    pub volume: AtomicCell<f32>,
}

/// Lead/second oscillator parameters.
pub struct SynthParams {
    pub cutoff: AtomicCell<f32>,
    pub resonance: AtomicCell<f32>,
    pub attack: AtomicCell<f32>,
    pub release: AtomicCell<f32>,
    pub reverb: AtomicCell<f32>,
    pub distortion: AtomicCell<f32>,
    pub osc2_volume: AtomicCell<f32>,
    pub osc2_transpose: AtomicCell<f32>,
}

/// The process-wide parameter store. One instance per engine, shared
/// behind an `Arc` by every loop task.
pub struct ParameterStore {
    pub kick: DrumParams,
    pub hihat: DrumParams,
    pub perc: DrumParams,
    pub brk: BreakParams,
    pub synth: SynthParams,
    pub osc1_waveform: AtomicCell<Osc1Waveform>,
    pub osc2_waveform: AtomicCell<Osc2Waveform>,
    pub kit: AtomicCell<DrumKit>,
    /// Selected pattern preset pair, `None` until the first `/pattern`
    /// message arrives. Drum loops hot-swap their rings when this changes.
    pub pattern_preset: AtomicCell<Option<u8>>,
    pub drum_reverb: AtomicCell<f32>,
    pub low_kill: AtomicCell<bool>,
    notes: [AtomicCell<Note>; NOTE_SLOTS],
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            kick: DrumParams::new(1.0, 1.0, 1.0),
            hihat: DrumParams::new(1.0, 0.0, 1.0),
            perc: DrumParams::new(1.0, 0.0, 1.0),
            brk: BreakParams {
                cutoff: AtomicCell::new(0.0),
                volume: AtomicCell::new(1.0),
            },
            synth: SynthParams {
                cutoff: AtomicCell::new(30.0),
                resonance: AtomicCell::new(0.5),
                attack: AtomicCell::new(0.0),
                release: AtomicCell::new(0.25),
                reverb: AtomicCell::new(0.5),
                distortion: AtomicCell::new(0.2),
                osc2_volume: AtomicCell::new(0.0),
                osc2_transpose: AtomicCell::new(0.0),
            },
            osc1_waveform: AtomicCell::new(Osc1Waveform::Tb303),
            osc2_waveform: AtomicCell::new(Osc2Waveform::Saw),
            kit: AtomicCell::new(DrumKit::Classic),
            pattern_preset: AtomicCell::new(None),
            drum_reverb: AtomicCell::new(0.0),
            low_kill: AtomicCell::new(false),
            notes: Default::default(),
        }
    }

    /// Read one note slot. Each slot is independently atomic; there is no
    /// snapshot across the whole sequence, and none is needed - the synth
    /// loop tolerates the sequence changing between reads.
    pub fn note(&self, slot: usize) -> Note {
        self.notes[slot].load()
    }

    /// Overwrite one note slot. A value of `None` mutes the slot.
    pub fn set_note(&self, slot: usize, note: Note) {
        self.notes[slot].store(note);
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
