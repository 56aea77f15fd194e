//! Controller loops
//!
//! One loop per control topic. Each cycle is a blocking receive on the
//! topic's channel followed by one write into the parameter store through
//! a fixed selector dispatch table. Unknown selectors are ignored, never
//! errors: a misbehaving control surface degrades to "last good value
//! held", it cannot crash playback.
//!
//! The effect-parameter topics (low-kill, drum reverb, break filter) also
//! forward a fire-and-forget control event to the renderer, since those
//! values live on renderer-side effect nodes rather than in a voice.

use crate::channel::{Consumer, ControlMessage};
use crate::params::{DrumKit, Osc1Waveform, Osc2Waveform, ParameterStore};
use crate::render::{ControlEvent, EffectTarget, Renderer};
use crate::sync_loop::SyncedLoop;
use std::sync::Arc;
use tracing::{debug, warn};

/// Drive one controller loop forever: await a message, apply it, repeat.
/// This is the per-cycle blocking receive discipline - unlike a playback
/// loop, a controller suspends every cycle until its topic speaks.
pub async fn run_controller<F>(name: &'static str, mut inbox: Consumer, mut apply: F)
where
    F: FnMut(ControlMessage) + Send,
{
    let mut lp = SyncedLoop::free_running(name);
    loop {
        lp.begin_cycle().await;
        let msg = inbox.recv().await;
        debug!(topic = name, selector = msg.selector, value = msg.value, "control");
        apply(msg);
    }
}

/// drum1: kick toggle / volume / decay / rate, plus kit selection.
pub fn apply_kick(store: &ParameterStore, msg: ControlMessage) {
    match msg.selector {
        0 => store.kick.toggle.store(msg.value != 0.0),
        1 => store.kick.volume.store(msg.value),
        2 => store.kick.decay.store(msg.value),
        3 => store.kick.rate.store(msg.value),
        // The kit change rides on the kick topic and swaps every drum
        // sample at once.
        4 => match DrumKit::from_index(msg.value as i32) {
            Some(kit) => store.kit.store(kit),
            None => warn!(kit = msg.value, "unknown drum kit ignored"),
        },
        other => warn!(selector = other, "unknown drum1 selector ignored"),
    }
}

/// drum2: hi-hat toggle / volume / decay / rate.
pub fn apply_hihat(store: &ParameterStore, msg: ControlMessage) {
    match msg.selector {
        0 => store.hihat.toggle.store(msg.value != 0.0),
        1 => store.hihat.volume.store(msg.value),
        2 => store.hihat.decay.store(msg.value),
        3 => store.hihat.rate.store(msg.value),
        other => warn!(selector = other, "unknown drum2 selector ignored"),
    }
}

/// drum3: percussion toggle / volume / decay.
pub fn apply_perc(store: &ParameterStore, msg: ControlMessage) {
    match msg.selector {
        0 => store.perc.toggle.store(msg.value != 0.0),
        1 => store.perc.volume.store(msg.value),
        2 => store.perc.decay.store(msg.value),
        other => warn!(selector = other, "unknown drum3 selector ignored"),
    }
}

/// synth: eight tunable voice parameters.
pub fn apply_synth(store: &ParameterStore, msg: ControlMessage) {
    match msg.selector {
        0 => store.synth.cutoff.store(msg.value),
        1 => store.synth.resonance.store(msg.value),
        2 => store.synth.attack.store(msg.value),
        3 => store.synth.release.store(msg.value),
        4 => store.synth.reverb.store(msg.value),
        5 => store.synth.distortion.store(msg.value),
        6 => store.synth.osc2_volume.store(msg.value),
        7 => store.synth.osc2_transpose.store(msg.value),
        other => warn!(selector = other, "unknown synth selector ignored"),
    }
}

/// waveform1: lead oscillator choice.
pub fn apply_waveform1(store: &ParameterStore, msg: ControlMessage) {
    match Osc1Waveform::from_index(msg.selector) {
        Some(waveform) => store.osc1_waveform.store(waveform),
        None => warn!(selector = msg.selector, "unknown waveform1 ignored"),
    }
}

/// waveform2: second oscillator choice.
pub fn apply_waveform2(store: &ParameterStore, msg: ControlMessage) {
    match Osc2Waveform::from_index(msg.selector) {
        Some(waveform) => store.osc2_waveform.store(waveform),
        None => warn!(selector = msg.selector, "unknown waveform2 ignored"),
    }
}

/// pattern: select one of the preset kick+hihat pattern pairs. The drum
/// loops pick the change up at their next cycle boundary and hot-swap
/// their rings phase-aligned.
pub fn apply_pattern(store: &ParameterStore, msg: ControlMessage) {
    match msg.selector {
        p @ 0..=3 => store.pattern_preset.store(Some(p as u8)),
        other => warn!(selector = other, "unknown pattern preset ignored"),
    }
}

/// note1..note8: overwrite one slot of the shared note sequence. A value
/// of zero mutes the slot.
pub fn apply_note(store: &ParameterStore, slot: usize, msg: ControlMessage) {
    let note = match msg.value as i32 {
        0 => None,
        pitch @ 1..=127 => Some(pitch as u8),
        other => {
            warn!(slot, pitch = other, "note out of range ignored");
            return;
        }
    };
    store.set_note(slot, note);
}

/// lowkill: global low-end kill switch. Engaged, the renderer-side
/// high-pass opens to 60; released, it drops back to 0.
pub fn apply_lowkill(store: &ParameterStore, renderer: &Arc<dyn Renderer>, msg: ControlMessage) {
    let cutoff = match msg.selector {
        0 => 0.0,
        1 => 60.0,
        other => {
            warn!(selector = other, "unknown lowkill selector ignored");
            return;
        }
    };
    store.low_kill.store(msg.selector == 1);
    renderer.control(ControlEvent {
        target: EffectTarget::LowKill,
        param: "cutoff",
        value: cutoff,
    });
}

/// drumreverb: shared drum reverb amount; mix follows room at half depth.
pub fn apply_drum_reverb(
    store: &ParameterStore,
    renderer: &Arc<dyn Renderer>,
    msg: ControlMessage,
) {
    let amount = msg.value;
    store.drum_reverb.store(amount);
    renderer.control(ControlEvent {
        target: EffectTarget::DrumReverb,
        param: "room",
        value: amount,
    });
    renderer.control(ControlEvent {
        target: EffectTarget::DrumReverb,
        param: "mix",
        value: amount / 2.0,
    });
}

/// break: filter open/closed plus loop volume.
pub fn apply_break(store: &ParameterStore, renderer: &Arc<dyn Renderer>, msg: ControlMessage) {
    match msg.selector {
        0 => {
            let cutoff = if msg.value != 0.0 { 127.0 } else { 0.0 };
            store.brk.cutoff.store(cutoff);
            renderer.control(ControlEvent {
                target: EffectTarget::BreakFilter,
                param: "cutoff",
                value: cutoff,
            });
        }
        1 => store.brk.volume.store(msg.value),
        other => warn!(selector = other, "unknown break selector ignored"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TriggerEvent;
    use std::sync::Mutex;

    struct CollectRenderer {
        controls: Mutex<Vec<ControlEvent>>,
    }

    impl CollectRenderer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                controls: Mutex::new(Vec::new()),
            })
        }
    }

    impl Renderer for CollectRenderer {
        fn trigger(&self, _event: TriggerEvent) {}
        fn control(&self, event: ControlEvent) {
            self.controls.lock().unwrap().push(event);
        }
    }

    #[test]
    fn kick_dispatch_covers_all_selectors() {
        let store = ParameterStore::new();
        apply_kick(&store, ControlMessage::new(0, 1.0));
        apply_kick(&store, ControlMessage::new(1, 0.7));
        apply_kick(&store, ControlMessage::new(2, 0.4));
        apply_kick(&store, ControlMessage::new(3, 2.0));
        apply_kick(&store, ControlMessage::new(4, 3.0));
        assert!(store.kick.toggle.load());
        assert_eq!(store.kick.volume.load(), 0.7);
        assert_eq!(store.kick.decay.load(), 0.4);
        assert_eq!(store.kick.rate.load(), 2.0);
        assert_eq!(store.kit.load(), DrumKit::Breakbeat);
    }

    #[test]
    fn unknown_selector_is_ignored_not_fatal() {
        let store = ParameterStore::new();
        let volume_before = store.kick.volume.load();
        apply_kick(&store, ControlMessage::new(9, 0.1));
        assert_eq!(store.kick.volume.load(), volume_before);
    }

    #[test]
    fn toggle_uses_zero_one_convention() {
        let store = ParameterStore::new();
        apply_hihat(&store, ControlMessage::new(0, 1.0));
        assert!(store.hihat.toggle.load());
        apply_hihat(&store, ControlMessage::new(0, 0.0));
        assert!(!store.hihat.toggle.load());
    }

    #[test]
    fn synth_dispatch_writes_each_field() {
        let store = ParameterStore::new();
        for (selector, value) in [(0, 90.0), (1, 0.8), (2, 0.1), (3, 0.5), (4, 0.3), (5, 0.6)] {
            apply_synth(&store, ControlMessage::new(selector, value));
        }
        apply_synth(&store, ControlMessage::new(6, 0.4));
        apply_synth(&store, ControlMessage::new(7, 12.0));
        assert_eq!(store.synth.cutoff.load(), 90.0);
        assert_eq!(store.synth.resonance.load(), 0.8);
        assert_eq!(store.synth.osc2_volume.load(), 0.4);
        assert_eq!(store.synth.osc2_transpose.load(), 12.0);
    }

    #[test]
    fn waveform_selection_by_selector() {
        let store = ParameterStore::new();
        apply_waveform1(&store, ControlMessage::new(3, 0.0));
        assert_eq!(store.osc1_waveform.load(), Osc1Waveform::ModSaw);
        apply_waveform2(&store, ControlMessage::new(2, 0.0));
        assert_eq!(store.osc2_waveform.load(), Osc2Waveform::PrettyBell);
        // Out of range leaves the previous choice standing.
        apply_waveform1(&store, ControlMessage::new(7, 0.0));
        assert_eq!(store.osc1_waveform.load(), Osc1Waveform::ModSaw);
    }

    #[test]
    fn note_zero_rests_the_slot() {
        let store = ParameterStore::new();
        apply_note(&store, 2, ControlMessage::new(52, 52.0));
        assert_eq!(store.note(2), Some(52));
        apply_note(&store, 2, ControlMessage::new(0, 0.0));
        assert_eq!(store.note(2), None);
    }

    #[test]
    fn lowkill_forwards_effect_control() {
        let store = ParameterStore::new();
        let renderer = CollectRenderer::new();
        let as_dyn: Arc<dyn Renderer> = renderer.clone();
        apply_lowkill(&store, &as_dyn, ControlMessage::new(1, 0.0));
        assert!(store.low_kill.load());
        let controls = renderer.controls.lock().unwrap();
        assert_eq!(
            controls[0],
            ControlEvent {
                target: EffectTarget::LowKill,
                param: "cutoff",
                value: 60.0,
            }
        );
    }

    #[test]
    fn drum_reverb_sets_room_and_half_mix() {
        let store = ParameterStore::new();
        let renderer = CollectRenderer::new();
        let as_dyn: Arc<dyn Renderer> = renderer.clone();
        apply_drum_reverb(&store, &as_dyn, ControlMessage::new(0, 0.8));
        assert_eq!(store.drum_reverb.load(), 0.8);
        let controls = renderer.controls.lock().unwrap();
        assert_eq!(controls.len(), 2);
        assert_eq!(controls[0].param, "room");
        assert_eq!(controls[0].value, 0.8);
        assert_eq!(controls[1].param, "mix");
        assert_eq!(controls[1].value, 0.4);
    }

    #[tokio::test]
    async fn controller_loop_applies_consumed_messages() {
        let (tx, rx) = crate::channel::control_channel("drum1");
        let store = Arc::new(ParameterStore::new());
        let loop_store = Arc::clone(&store);
        tokio::spawn(run_controller("drum1", rx, move |msg| {
            apply_kick(&loop_store, msg)
        }));

        tx.publish(ControlMessage::new(0, 1.0));
        // Let the controller task consume and apply.
        for _ in 0..10 {
            tokio::task::yield_now().await;
            if store.kick.toggle.load() {
                break;
            }
        }
        assert!(store.kick.toggle.load());
    }
}
