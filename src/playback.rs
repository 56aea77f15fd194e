//! Playback loops
//!
//! The five music-making tasks. The kick loop is the master pulse: it owns
//! the cue every other playback loop aligns its start to. After that
//! one-shot rendezvous each loop free-runs on its own step duration,
//! reading the parameter store at step time and emitting trigger events to
//! the renderer. A playback loop never blocks mid-cycle: a muted step
//! skips its trigger but still sleeps its step, so pattern position stays
//! locked to the grid while a voice is silent.

use crate::clock::Tempo;
use crate::cue::{Cue, CueHandle};
use crate::params::{Osc1Waveform, ParameterStore, NOTE_SLOTS};
use crate::patterns;
use crate::random::RandomSource;
use crate::render::{Renderer, TriggerEvent};
use crate::sequencer::StepRing;
use crate::sync_loop::SyncedLoop;
use std::collections::HashMap;
use std::sync::Arc;

/// Steps per drum cycle, quarter beats each.
const DRUM_STEPS: usize = patterns::STEPS;

/// Fixed pan positions the break loop bounces between.
const BREAK_PANS: [f32; 5] = [-0.55, -0.35, 0.0, 0.35, 0.55];

/// Sleep choices for the percussion loop, in beats.
const PERC_RESTS: [f32; 3] = [0.25, 0.75, 1.25];

/// Pick up a pattern preset change before the next step, hot-swapping the
/// ring in place. The cursor survives the swap, so a change landing
/// mid-cycle keeps the pattern position phase-aligned with the pulse.
/// Returns the preset now in effect.
fn refresh_ring(
    ring: &mut StepRing<f32>,
    seen: Option<u8>,
    selected: Option<u8>,
    build: impl FnOnce(u8) -> Vec<f32>,
) -> Option<u8> {
    if selected != seen {
        if let Some(preset) = selected {
            ring.replace(build(preset));
        }
    }
    selected
}

/// Master pulse: 16 quarter-beat steps over the kick pattern ring. Fires
/// the shared cue at every cycle boundary.
pub async fn kick_loop(
    store: Arc<ParameterStore>,
    tempo: Tempo,
    cue: Cue,
    renderer: Arc<dyn Renderer>,
) {
    let mut lp = SyncedLoop::free_running("kick").with_cue(cue);
    let mut ring = StepRing::new(patterns::default_kick());
    let mut preset = None;
    loop {
        lp.begin_cycle().await;
        for _ in 0..DRUM_STEPS {
            preset = refresh_ring(
                &mut ring,
                preset,
                store.pattern_preset.load(),
                patterns::kick_preset,
            );
            let weight = ring.tick();
            if store.kick.toggle.load() && weight > 0.0 {
                let kit = store.kit.load();
                renderer.trigger(TriggerEvent {
                    sound: kit.kick_sample(),
                    amp: weight * store.kick.volume.load() * 1.5,
                    rate: store.kick.rate.load(),
                    pan: 0.0,
                    extra: HashMap::from([
                        ("finish", store.kick.decay.load()),
                        ("cutoff", 110.0),
                    ]),
                });
            }
            tempo.rest(0.25).await;
        }
    }
}

/// Sliced breakbeat: one quarter-beat step per cycle, random slice and a
/// pan bouncing over five fixed positions.
pub async fn break_loop(
    store: Arc<ParameterStore>,
    tempo: Tempo,
    sync: CueHandle,
    renderer: Arc<dyn Renderer>,
    mut rng: impl RandomSource,
) {
    let mut lp = SyncedLoop::synced("break", sync);
    loop {
        lp.begin_cycle().await;
        let kit = store.kit.load();
        renderer.trigger(TriggerEvent {
            sound: kit.break_sample(),
            amp: store.brk.volume.load(),
            rate: 1.0,
            pan: *rng.choose(&BREAK_PANS),
            extra: HashMap::from([
                ("slice", rng.pick_index(16) as f32),
                ("beat_stretch", 2.0),
                ("hpf", 60.0),
            ]),
        });
        tempo.rest(0.25).await;
    }
}

/// Hi-hat: 16 quarter-beat steps over the hi-hat ring, small random decay
/// spread and pan jitter per hit.
pub async fn hihat_loop(
    store: Arc<ParameterStore>,
    tempo: Tempo,
    sync: CueHandle,
    renderer: Arc<dyn Renderer>,
    mut rng: impl RandomSource,
) {
    let mut lp = SyncedLoop::synced("hihat", sync);
    let mut ring = StepRing::new(patterns::default_hihat());
    let mut preset = None;
    loop {
        lp.begin_cycle().await;
        for _ in 0..DRUM_STEPS {
            preset = refresh_ring(&mut ring, preset, store.pattern_preset.load(), |p| {
                patterns::hihat_preset(p, &mut rng)
            });
            let weight = ring.tick();
            if store.hihat.toggle.load() && weight > 0.0 {
                let kit = store.kit.load();
                renderer.trigger(TriggerEvent {
                    sound: kit.hihat_sample(),
                    amp: weight * store.hihat.volume.load(),
                    rate: store.hihat.rate.load(),
                    pan: rng.range(-0.5, 0.5),
                    extra: HashMap::from([
                        ("finish", store.hihat.decay.load() + rng.range(0.0, 0.09)),
                        ("cutoff", 120.0),
                    ]),
                });
            }
            tempo.rest(0.25).await;
        }
    }
}

/// Percussion: one randomly chosen note from the shared sequence per
/// cycle, on an FM voice, with a randomly chosen rest length.
pub async fn perc_loop(
    store: Arc<ParameterStore>,
    tempo: Tempo,
    sync: CueHandle,
    renderer: Arc<dyn Renderer>,
    mut rng: impl RandomSource,
) {
    let mut lp = SyncedLoop::synced("perc", sync);
    loop {
        lp.begin_cycle().await;
        let volume = store.perc.volume.load();
        if store.perc.toggle.load() && volume >= 1.0 {
            // A rest slot plays nothing; the step still takes its time.
            if let Some(note) = store.note(rng.pick_index(NOTE_SLOTS)) {
                renderer.trigger(TriggerEvent {
                    sound: "fm",
                    amp: volume,
                    rate: 1.0,
                    pan: rng.range(-0.8, 0.8),
                    extra: HashMap::from([
                        ("note", note as f32),
                        ("attack", 0.03),
                        ("divisor", rng.range(0.1, 2.4)),
                        ("depth", rng.range(1.0, 5.0)),
                        ("release", store.perc.decay.load() + rng.range(0.0, 0.1)),
                    ]),
                });
            }
        }
        let rest = *rng.choose(&PERC_RESTS);
        tempo.rest(rest).await;
    }
}

/// Lead synth: four quarter-beat steps per cycle over the 8-slot note
/// ring. The first step of each cycle is played softer. When the second
/// oscillator is mixed in, it doubles the same slot with its transpose
/// plus occasional random octave jumps.
pub async fn synth_loop(
    store: Arc<ParameterStore>,
    tempo: Tempo,
    sync: CueHandle,
    renderer: Arc<dyn Renderer>,
    mut rng: impl RandomSource,
) {
    let mut lp = SyncedLoop::synced("synth", sync);
    let mut ring = StepRing::new((0..NOTE_SLOTS).collect());
    loop {
        lp.begin_cycle().await;
        for step in 0..4 {
            let level = if step == 0 { 0.5 } else { 1.0 };
            let slot = ring.tick();
            if let Some(note) = store.note(slot) {
                let waveform = store.osc1_waveform.load();
                let transpose = store.synth.osc2_transpose.load();
                let mut extra = HashMap::from([
                    ("note", note as f32),
                    ("attack", store.synth.attack.load()),
                    ("release", store.synth.release.load()),
                    ("cutoff", store.synth.cutoff.load()),
                    ("res", store.synth.resonance.load()),
                    ("reverb", store.synth.reverb.load()),
                    ("distortion", store.synth.distortion.load()),
                ]);
                // A transposed second oscillator also modulates a mod_saw
                // lead, sweeping it over the same interval.
                if waveform == Osc1Waveform::ModSaw && transpose != 0.0 {
                    extra.insert("mod_range", transpose);
                    extra.insert("mod_wave", 1.0);
                }
                renderer.trigger(TriggerEvent {
                    sound: waveform.sound_id(),
                    amp: level,
                    rate: 1.0,
                    pan: 0.0,
                    extra,
                });

                let osc2_volume = store.synth.osc2_volume.load();
                if osc2_volume != 0.0 {
                    // Two independent draws; the rarer jump wins outright.
                    let mut jump = 0.0;
                    if rng.one_in(6) {
                        jump = 12.0;
                    }
                    if rng.one_in(12) {
                        jump = 24.0;
                    }
                    renderer.trigger(TriggerEvent {
                        sound: store.osc2_waveform.load().sound_id(),
                        amp: osc2_volume * level,
                        rate: 1.0,
                        pan: rng.range(-1.0, 1.0),
                        extra: HashMap::from([
                            ("note", note as f32 + transpose + jump),
                            ("attack", store.synth.attack.load()),
                            ("release", store.synth.release.load()),
                            ("cutoff", 40.0 + store.synth.cutoff.load() / 1.5),
                            ("res", store.synth.resonance.load()),
                        ]),
                    });
                }
            }
            tempo.rest(0.25).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SmallRngSource;
    use crate::render::ControlEvent;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    struct CollectRenderer {
        events: Mutex<Vec<(TriggerEvent, Instant)>>,
    }

    impl CollectRenderer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }

        fn events(&self) -> Vec<(TriggerEvent, Instant)> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Renderer for CollectRenderer {
        fn trigger(&self, event: TriggerEvent) {
            self.events.lock().unwrap().push((event, Instant::now()));
        }
        fn control(&self, _event: ControlEvent) {}
    }

    fn tempo() -> Tempo {
        Tempo::new(100.0)
    }

    /// Map an event timestamp to its drum step index. The timer rounds
    /// every sleep deadline up to the next millisecond, so timestamps
    /// drift about 1ms per step; rounding absorbs that.
    fn step_of(start: Instant, at: Instant) -> usize {
        let step = tempo().beats(0.25).as_secs_f32();
        ((at - start).as_secs_f32() / step).round() as usize
    }

    #[tokio::test(start_paused = true)]
    async fn muted_kick_consumes_time_but_emits_nothing() {
        let store = Arc::new(ParameterStore::new());
        let renderer = CollectRenderer::new();
        let cue = Cue::new("kick");
        tokio::spawn(kick_loop(
            Arc::clone(&store),
            tempo(),
            cue,
            renderer.clone(),
        ));

        tokio::time::sleep(tempo().beats(8.0)).await;
        assert!(renderer.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn enabled_kick_plays_four_to_the_floor() {
        let store = Arc::new(ParameterStore::new());
        store.kick.toggle.store(true);
        let renderer = CollectRenderer::new();
        let cue = Cue::new("kick");
        let start = Instant::now();
        tokio::spawn(kick_loop(
            Arc::clone(&store),
            tempo(),
            cue,
            renderer.clone(),
        ));

        // One full cycle: 16 steps, hits on 0, 4, 8, 12. Stop short of the
        // next cycle boundary so its downbeat is not counted.
        tokio::time::sleep(tempo().beats(3.9)).await;
        let events = renderer.events();
        assert_eq!(events.len(), 4);
        for (event, _) in &events {
            assert_eq!(event.sound, "bd_haus");
            assert_eq!(event.amp, 1.5);
        }
        let steps: Vec<usize> = events.iter().map(|(_, at)| step_of(start, *at)).collect();
        assert_eq!(steps, vec![0, 4, 8, 12]);
    }

    #[tokio::test(start_paused = true)]
    async fn synced_loop_first_trigger_not_before_pulse_boundary() {
        let store = Arc::new(ParameterStore::new());
        store.hihat.toggle.store(true);
        let renderer = CollectRenderer::new();
        let cue = Cue::new("kick");
        let handle = cue.listen();

        tokio::spawn(hihat_loop(
            Arc::clone(&store),
            tempo(),
            handle,
            renderer.clone(),
            SmallRngSource::seeded(1),
        ));

        // No pulse boundary yet: the hi-hat must stay parked.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(renderer.events().is_empty());

        let boundary = Instant::now();
        cue.fire();
        tokio::time::sleep(tempo().beats(1.0)).await;
        let events = renderer.events();
        assert!(!events.is_empty());
        assert!(events[0].1 >= boundary);
    }

    #[tokio::test(start_paused = true)]
    async fn pattern_swap_lands_mid_cycle_with_position_preserved() {
        let store = Arc::new(ParameterStore::new());
        store.kick.toggle.store(true);
        let renderer = CollectRenderer::new();
        let start = Instant::now();
        tokio::spawn(kick_loop(
            Arc::clone(&store),
            tempo(),
            Cue::new("kick"),
            renderer.clone(),
        ));

        // Preset 2 sounds on steps 0, 6 and 10. Selecting it between steps
        // 4 and 5 must swap the ring in place: the cycle already played
        // default hits on 0 and 4, and continues with 6 and 10 - not with
        // the stale 8 and 12, and not restarting from step 0.
        tokio::time::sleep(tempo().beats(1.1)).await;
        store.pattern_preset.store(Some(2));
        tokio::time::sleep(tempo().beats(2.8)).await;

        let steps: Vec<usize> = renderer
            .events()
            .iter()
            .map(|(_, at)| step_of(start, *at))
            .collect();
        assert_eq!(steps, vec![0, 4, 6, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn transposed_mod_saw_lead_carries_mod_defaults() {
        let store = Arc::new(ParameterStore::new());
        store.set_note(0, Some(52));
        store.osc1_waveform.store(Osc1Waveform::ModSaw);
        store.synth.osc2_transpose.store(7.0);
        let renderer = CollectRenderer::new();
        let cue = Cue::new("kick");
        let handle = cue.listen();
        cue.fire();
        tokio::spawn(synth_loop(
            Arc::clone(&store),
            tempo(),
            handle,
            renderer.clone(),
            SmallRngSource::seeded(6),
        ));

        tokio::time::sleep(tempo().beats(0.9)).await;
        let events = renderer.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0.sound, "mod_saw");
        assert_eq!(events[0].0.extra["mod_range"], 7.0);
        assert_eq!(events[0].0.extra["mod_wave"], 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn synth_plays_notes_and_rests_silently() {
        let store = Arc::new(ParameterStore::new());
        store.set_note(0, Some(52));
        // Slots 1..7 stay rests.
        let renderer = CollectRenderer::new();
        let cue = Cue::new("kick");
        let handle = cue.listen();
        cue.fire();
        tokio::spawn(synth_loop(
            Arc::clone(&store),
            tempo(),
            handle,
            renderer.clone(),
            SmallRngSource::seeded(2),
        ));

        // Two cycles cover the whole 8-slot ring once; stop short of the
        // third cycle, which would revisit slot 0.
        tokio::time::sleep(tempo().beats(1.9)).await;
        let events = renderer.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0.sound, "tb303");
        assert_eq!(events[0].0.extra["note"], 52.0);
        // First step of a cycle is the soft one.
        assert_eq!(events[0].0.amp, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn osc2_doubles_the_same_slot_when_mixed_in() {
        let store = Arc::new(ParameterStore::new());
        for slot in 0..NOTE_SLOTS {
            store.set_note(slot, Some(40));
        }
        store.synth.osc2_volume.store(0.6);
        store.synth.osc2_transpose.store(0.0);
        let renderer = CollectRenderer::new();
        let cue = Cue::new("kick");
        let handle = cue.listen();
        cue.fire();
        tokio::spawn(synth_loop(
            Arc::clone(&store),
            tempo(),
            handle,
            renderer.clone(),
            SmallRngSource::seeded(3),
        ));

        tokio::time::sleep(tempo().beats(0.9)).await;
        let events = renderer.events();
        // Each sounding step emits an osc1 and an osc2 trigger.
        assert_eq!(events.len(), 8);
        for pair in events.chunks(2) {
            assert_eq!(pair[0].0.sound, "tb303");
            assert_eq!(pair[1].0.sound, "saw");
            // Transpose may add an octave jump, never change the slot.
            let base = pair[0].0.extra["note"];
            let doubled = pair[1].0.extra["note"];
            assert!([0.0, 12.0, 24.0].contains(&(doubled - base)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn perc_respects_toggle_and_full_volume_gate() {
        let store = Arc::new(ParameterStore::new());
        for slot in 0..NOTE_SLOTS {
            store.set_note(slot, Some(45));
        }
        store.perc.toggle.store(true);
        store.perc.volume.store(0.5);
        let renderer = CollectRenderer::new();
        let cue = Cue::new("kick");
        let handle = cue.listen();
        cue.fire();
        tokio::spawn(perc_loop(
            Arc::clone(&store),
            tempo(),
            handle,
            renderer.clone(),
            SmallRngSource::seeded(4),
        ));

        // Below full volume the gate stays closed.
        tokio::time::sleep(tempo().beats(8.0)).await;
        assert!(renderer.events().is_empty());

        store.perc.volume.store(1.0);
        tokio::time::sleep(tempo().beats(8.0)).await;
        assert!(!renderer.events().is_empty());
    }
}
