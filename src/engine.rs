//! Engine wiring
//!
//! Builds the fixed loop set and plumbs it together: one parameter store,
//! one pulse cue, one latest-wins channel per control topic, a controller
//! loop behind each channel and five playback loops in front of the
//! renderer. The set is fixed at startup - no loop is ever created or
//! destroyed afterwards, and the only termination is process shutdown.

use crate::channel::{control_channel, Consumer, ControlMessage, Publisher};
use crate::clock::Tempo;
use crate::controllers;
use crate::cue::Cue;
use crate::params::ParameterStore;
use crate::playback;
use crate::random::SmallRngSource;
use crate::render::Renderer;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// The note-slot topics, one per slot of the shared sequence.
pub const NOTE_TOPICS: [&str; 8] = [
    "note1", "note2", "note3", "note4", "note5", "note6", "note7", "note8",
];

/// Every declared control topic.
pub const TOPICS: [&str; 18] = [
    "drum1", "drum2", "drum3", "synth", "waveform1", "waveform2", "pattern", "lowkill", "break",
    "drumreverb", "note1", "note2", "note3", "note4", "note5", "note6", "note7", "note8",
];

/// A running engine. Holds the store and the publisher side of every
/// topic so transports (and tests) can inject control messages.
pub struct Engine {
    store: Arc<ParameterStore>,
    tempo: Tempo,
    publishers: HashMap<&'static str, Publisher>,
}

impl Engine {
    /// Build and start the whole loop set.
    pub fn start(tempo: Tempo, renderer: Arc<dyn Renderer>) -> Self {
        let store = Arc::new(ParameterStore::new());
        let mut publishers = HashMap::new();
        let mut tasks = Vec::new();

        let mut topic = |name: &'static str| -> Consumer {
            let (tx, rx) = control_channel(name);
            publishers.insert(name, tx);
            rx
        };

        // Controller loops: one per topic, pure control plane.
        {
            let inbox = topic("drum1");
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(controllers::run_controller(
                "drum1",
                inbox,
                move |msg| controllers::apply_kick(&store, msg),
            )));
        }
        {
            let inbox = topic("drum2");
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(controllers::run_controller(
                "drum2",
                inbox,
                move |msg| controllers::apply_hihat(&store, msg),
            )));
        }
        {
            let inbox = topic("drum3");
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(controllers::run_controller(
                "drum3",
                inbox,
                move |msg| controllers::apply_perc(&store, msg),
            )));
        }
        {
            let inbox = topic("synth");
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(controllers::run_controller(
                "synth",
                inbox,
                move |msg| controllers::apply_synth(&store, msg),
            )));
        }
        {
            let inbox = topic("waveform1");
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(controllers::run_controller(
                "waveform1",
                inbox,
                move |msg| controllers::apply_waveform1(&store, msg),
            )));
        }
        {
            let inbox = topic("waveform2");
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(controllers::run_controller(
                "waveform2",
                inbox,
                move |msg| controllers::apply_waveform2(&store, msg),
            )));
        }
        {
            let inbox = topic("pattern");
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(controllers::run_controller(
                "pattern",
                inbox,
                move |msg| controllers::apply_pattern(&store, msg),
            )));
        }
        {
            let inbox = topic("lowkill");
            let store = Arc::clone(&store);
            let renderer = Arc::clone(&renderer);
            tasks.push(tokio::spawn(controllers::run_controller(
                "lowkill",
                inbox,
                move |msg| controllers::apply_lowkill(&store, &renderer, msg),
            )));
        }
        {
            let inbox = topic("break");
            let store = Arc::clone(&store);
            let renderer = Arc::clone(&renderer);
            tasks.push(tokio::spawn(controllers::run_controller(
                "break",
                inbox,
                move |msg| controllers::apply_break(&store, &renderer, msg),
            )));
        }
        {
            let inbox = topic("drumreverb");
            let store = Arc::clone(&store);
            let renderer = Arc::clone(&renderer);
            tasks.push(tokio::spawn(controllers::run_controller(
                "drumreverb",
                inbox,
                move |msg| controllers::apply_drum_reverb(&store, &renderer, msg),
            )));
        }
        for (slot, name) in NOTE_TOPICS.into_iter().enumerate() {
            let inbox = topic(name);
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(controllers::run_controller(
                name,
                inbox,
                move |msg| controllers::apply_note(&store, slot, msg),
            )));
        }

        // Playback loops: the kick is the pulse, everything else syncs to
        // its first cycle boundary and then free-runs.
        let pulse = Cue::new("kick");
        let break_sync = pulse.listen();
        let hihat_sync = pulse.listen();
        let perc_sync = pulse.listen();
        let synth_sync = pulse.listen();

        tasks.push(tokio::spawn(playback::kick_loop(
            Arc::clone(&store),
            tempo,
            pulse,
            Arc::clone(&renderer),
        )));
        tasks.push(tokio::spawn(playback::break_loop(
            Arc::clone(&store),
            tempo,
            break_sync,
            Arc::clone(&renderer),
            SmallRngSource::from_entropy(),
        )));
        tasks.push(tokio::spawn(playback::hihat_loop(
            Arc::clone(&store),
            tempo,
            hihat_sync,
            Arc::clone(&renderer),
            SmallRngSource::from_entropy(),
        )));
        tasks.push(tokio::spawn(playback::perc_loop(
            Arc::clone(&store),
            tempo,
            perc_sync,
            Arc::clone(&renderer),
            SmallRngSource::from_entropy(),
        )));
        tasks.push(tokio::spawn(playback::synth_loop(
            Arc::clone(&store),
            tempo,
            synth_sync,
            Arc::clone(&renderer),
            SmallRngSource::from_entropy(),
        )));

        debug_assert_eq!(publishers.len(), TOPICS.len());
        debug_assert!(TOPICS.iter().all(|t| publishers.contains_key(t)));

        info!(
            bpm = tempo.bpm(),
            loops = tasks.len(),
            "engine running"
        );

        Self {
            store,
            tempo,
            publishers,
        }
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// All topic publishers, keyed by topic name - the OSC listener's
    /// routing table.
    pub fn topic_publishers(&self) -> HashMap<&'static str, Publisher> {
        self.publishers.clone()
    }

    /// Publish directly, bypassing the transport. Used by tests and local
    /// tooling.
    pub fn publish(&self, topic: &str, msg: ControlMessage) -> bool {
        match self.publishers.get(topic) {
            Some(tx) => {
                tx.publish(msg);
                true
            }
            None => false,
        }
    }
}
