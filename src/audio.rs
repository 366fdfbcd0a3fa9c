//! Sound direction
//!
//! Playback is an external collaborator behind [`AudioEngine`]. This module
//! decides what plays when:
//! - Ambient loops that follow the page cycle
//! - Threat samples scheduled at random gaps with a slow volume ramp
//! - Exclusive rattle/strike sample sets checked out per bite and returned
//!   to their pools once playback has ended (polled every tick)

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use rand_pcg::Pcg32;

use crate::settings::AudioSettings;

/// Handle to a sample loaded by an [`AudioEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleId(pub u32);

/// Sample playback collaborator
pub trait AudioEngine {
    /// Load a sample by name; `None` if the engine cannot provide it
    fn load(&mut self, name: &str) -> Option<SampleId>;
    /// Play once from the start
    fn play(&mut self, id: SampleId);
    /// Loop until stopped
    fn repeat(&mut self, id: SampleId);
    fn stop(&mut self, id: SampleId);
    fn set_volume(&mut self, id: SampleId, volume: f32);
    /// Ramp the volume after `delay_ms`, optionally stopping at the end
    fn fade_to(
        &mut self,
        id: SampleId,
        volume: f32,
        duration_ms: u32,
        delay_ms: u32,
        stop_when_done: bool,
    );
    fn is_playing(&self, id: SampleId) -> bool;
}

/// Samples that can be checked out exclusively
#[derive(Debug, Clone, Default)]
struct SamplePool {
    free: Vec<SampleId>,
    releasing: Vec<SampleId>,
}

impl SamplePool {
    /// Take up to `n` random free samples
    fn checkout(&mut self, n: usize, rng: &mut Pcg32) -> Vec<SampleId> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n && !self.free.is_empty() {
            let i = rng.random_range(0..self.free.len());
            out.push(self.free.remove(i));
        }
        out
    }

    fn checkout_specific(&mut self, id: SampleId) -> bool {
        match self.free.iter().position(|&s| s == id) {
            Some(i) => {
                self.free.remove(i);
                true
            }
            None => false,
        }
    }

    fn queue_release(&mut self, ids: &[SampleId]) {
        self.releasing.extend_from_slice(ids);
    }

    /// Return samples that stopped playing to the free list
    fn poll(&mut self, engine: &dyn AudioEngine) {
        let mut i = 0;
        while i < self.releasing.len() {
            if engine.is_playing(self.releasing[i]) {
                i += 1;
            } else {
                let id = self.releasing.remove(i);
                self.free.push(id);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ThreatScheduler {
    active: bool,
    current: Option<SampleId>,
    ramp_start_ms: Option<u64>,
    next_ms: u64,
}

/// Samples held by one snake's current bite
#[derive(Debug, Clone, Default)]
struct SnakeSounds {
    rattles: Vec<SampleId>,
    strikes: Vec<SampleId>,
}

/// Number of rattle/strike samples per bite on a page
pub fn sounds_per_bite(page: usize, biting: usize) -> usize {
    match page {
        0..=4 => 1,
        5 if biting < 2 => 1,
        _ => 2,
    }
}

/// Owns the sample pools and drives an [`AudioEngine`]
pub struct SoundDirector {
    engine: Box<dyn AudioEngine>,
    settings: AudioSettings,
    ambient: Vec<SampleId>,
    threats: Vec<SampleId>,
    rattles: SamplePool,
    strikes: SamplePool,
    first_strike: Option<SampleId>,
    threat: ThreatScheduler,
    snakes: Vec<SnakeSounds>,
}

impl SoundDirector {
    pub fn new(mut engine: Box<dyn AudioEngine>, settings: &AudioSettings, snake_count: usize) -> Self {
        let mut load_all = |names: &[String], volume: f32| -> Vec<SampleId> {
            names
                .iter()
                .filter_map(|name| {
                    let id = engine.load(name);
                    match id {
                        Some(id) => engine.set_volume(id, volume),
                        None => log::warn!("Missing sample {name}"),
                    }
                    id
                })
                .collect()
        };
        let ambient = load_all(&settings.ambient, 0.0);
        let threats = load_all(&settings.threat, settings.threat_volume);
        let rattles = load_all(&settings.rattle, settings.rattle_volume);
        let mut strikes = load_all(&settings.strike, settings.strike_volume);

        let first_strike = if settings.first_strike.is_empty() {
            None
        } else {
            match engine.load(&settings.first_strike) {
                Some(id) => {
                    if !strikes.contains(&id) {
                        strikes.push(id);
                    }
                    Some(id)
                }
                None => {
                    log::warn!("Missing first strike sample {}", settings.first_strike);
                    None
                }
            }
        };

        log::info!(
            "Loaded {} ambient, {} threat, {} rattle, {} strike samples",
            ambient.len(),
            threats.len(),
            rattles.len(),
            strikes.len()
        );

        Self {
            engine,
            settings: settings.clone(),
            ambient,
            threats,
            rattles: SamplePool {
                free: rattles,
                releasing: Vec::new(),
            },
            strikes: SamplePool {
                free: strikes,
                releasing: Vec::new(),
            },
            first_strike,
            threat: ThreatScheduler::default(),
            snakes: vec![SnakeSounds::default(); snake_count],
        }
    }

    /// Fade in the first ambient loop
    pub fn start(&mut self) {
        let (volume, fade) = (self.settings.ambient_volume_start, self.settings.startup_fade_ms);
        self.fade_in_ambient(0, volume, fade);
    }

    fn fade_in_ambient(&mut self, index: usize, volume: f32, duration_ms: u32) {
        let Some(&id) = self.ambient.get(index) else {
            return;
        };
        self.engine.set_volume(id, 0.0);
        self.engine.repeat(id);
        self.engine.fade_to(id, volume, duration_ms, 0, false);
    }

    fn fade_ambient(&mut self, index: usize, volume: f32, duration_ms: u32, stop_when_done: bool) {
        if let Some(&id) = self.ambient.get(index) {
            self.engine.fade_to(id, volume, duration_ms, 0, stop_when_done);
        }
    }

    /// Per-tick bookkeeping: release queues and the threat schedule
    pub fn update(&mut self, now_ms: u64, rng: &mut Pcg32) {
        self.rattles.poll(self.engine.as_ref());
        self.strikes.poll(self.engine.as_ref());

        if !self.threat.active {
            return;
        }
        match self.threat.current {
            None if now_ms > self.threat.next_ms && !self.threats.is_empty() => {
                let start = *self.threat.ramp_start_ms.get_or_insert(now_ms);
                let ramp = if self.settings.threat_ramp_ms == 0 {
                    1.0
                } else {
                    (now_ms.saturating_sub(start) as f32 / self.settings.threat_ramp_ms as f32)
                        .min(1.0)
                };
                let id = self.threats[rng.random_range(0..self.threats.len())];
                self.engine.set_volume(id, ramp * self.settings.threat_volume);
                self.engine.play(id);
                self.threat.current = Some(id);
            }
            Some(id) if !self.engine.is_playing(id) => {
                self.threat.current = None;
                let jitter = if self.settings.threat_gap_jitter_ms > 0 {
                    rng.random_range(0..self.settings.threat_gap_jitter_ms)
                } else {
                    0
                };
                self.threat.next_ms = now_ms + self.settings.threat_gap_ms + jitter;
            }
            _ => {}
        }
    }

    pub fn play_threats(&mut self) {
        self.threat.active = true;
    }

    pub fn stop_threats(&mut self) {
        if let Some(id) = self.threat.current.take() {
            if self.engine.is_playing(id) {
                self.engine.stop(id);
            }
        }
        self.threat = ThreatScheduler::default();
    }

    pub fn threats_active(&self) -> bool {
        self.threat.active
    }

    /// The very first bite of a cycle silences the threats and uses the
    /// dedicated first strike sample
    pub fn arm_first_bite(&mut self, snake: usize, rng: &mut Pcg32) {
        self.stop_threats();
        let rattles = self.rattles.checkout(1, rng);
        let strikes = match self.first_strike {
            Some(id) if self.strikes.checkout_specific(id) => vec![id],
            _ => Vec::new(),
        };
        self.assign(snake, rattles, strikes);
    }

    pub fn arm_bite(&mut self, snake: usize, count: usize, rng: &mut Pcg32) {
        let rattles = self.rattles.checkout(count, rng);
        let strikes = self.strikes.checkout(count, rng);
        self.assign(snake, rattles, strikes);
    }

    fn assign(&mut self, snake: usize, rattles: Vec<SampleId>, strikes: Vec<SampleId>) {
        if rattles.is_empty() && strikes.is_empty() {
            log::debug!("No free bite samples for snake {snake}");
        }
        if let Some(sounds) = self.snakes.get_mut(snake) {
            // Anything still held goes back through the release queue
            self.rattles.queue_release(&sounds.rattles);
            self.strikes.queue_release(&sounds.strikes);
            *sounds = SnakeSounds { rattles, strikes };
        } else {
            self.rattles.free.extend(rattles);
            self.strikes.free.extend(strikes);
        }
    }

    /// Head reached strike distance: one-shot strikes, looping rattles
    pub fn strike(&mut self, snake: usize) {
        let Some(sounds) = self.snakes.get(snake) else {
            return;
        };
        for &id in &sounds.strikes {
            self.engine.set_volume(id, self.settings.strike_volume);
            self.engine.play(id);
        }
        for &id in &sounds.rattles {
            self.engine.set_volume(id, self.settings.rattle_volume);
            self.engine.repeat(id);
        }
    }

    /// Fade out and release a retracting snake's samples
    pub fn release_snake(&mut self, snake: usize, fade_delay_ms: u32) {
        let Some(sounds) = self.snakes.get_mut(snake) else {
            return;
        };
        let sounds = std::mem::take(sounds);
        let fade = self.settings.release_fade_ms;
        for &id in &sounds.rattles {
            self.engine.fade_to(id, 0.0, fade, fade_delay_ms, true);
        }
        for &id in &sounds.strikes {
            self.engine.fade_to(id, 0.0, fade, 0, true);
        }
        self.rattles.queue_release(&sounds.rattles);
        self.strikes.queue_release(&sounds.strikes);
    }

    /// Re-route ambient and threat loops when the page `outgoing` starts
    /// changing
    pub fn change_page_audio(&mut self, outgoing: usize, page_count: usize, interval_ms: u64) {
        let s = &self.settings;
        let (start, end, page_fade) = (s.ambient_volume_start, s.ambient_volume_end, s.page_fade_ms);
        if outgoing == 0 {
            self.fade_ambient(0, 0.0, page_fade, true);
            self.fade_in_ambient(1, start, page_fade);
            self.play_threats();
        } else if outgoing == 2 {
            let interval = u32::try_from(interval_ms).unwrap_or(u32::MAX);
            self.fade_ambient(1, end, interval, false);
        } else if outgoing + 1 == page_count {
            self.fade_in_ambient(0, start, page_fade);
            self.fade_ambient(1, 0.0, page_fade, true);
            self.stop_threats();
        }
    }

    /// Free samples left in the rattle and strike pools
    pub fn free_samples(&self) -> (usize, usize) {
        (self.rattles.free.len(), self.strikes.free.len())
    }
}

/// One call made on a [`RecordingAudio`] engine
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Load(String),
    Play(String),
    Repeat(String),
    Stop(String),
    SetVolume(String, f32),
    FadeTo {
        name: String,
        volume: f32,
        duration_ms: u32,
        delay_ms: u32,
        stop_when_done: bool,
    },
}

#[derive(Debug, Default)]
struct Recording {
    names: Vec<String>,
    missing: BTreeSet<String>,
    looping: BTreeSet<SampleId>,
    calls: Vec<AudioCall>,
}

/// Headless engine that records every call.
///
/// Clones share the same log, so a test can keep one handle and give the
/// other to the installation. One-shot samples finish instantly; loops play
/// until stopped.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the named samples do not exist
    pub fn with_missing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let audio = Self::new();
        audio.lock().missing = names.into_iter().map(Into::into).collect();
        audio
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.lock().calls.clone()
    }

    pub fn clear(&self) {
        self.lock().calls.clear();
    }

    /// Names of samples currently looping
    pub fn looping(&self) -> Vec<String> {
        let rec = self.lock();
        rec.looping
            .iter()
            .filter_map(|id| rec.names.get(id.0 as usize).cloned())
            .collect()
    }
}

impl Recording {
    fn name(&self, id: SampleId) -> String {
        self.names.get(id.0 as usize).cloned().unwrap_or_default()
    }
}

impl AudioEngine for RecordingAudio {
    fn load(&mut self, name: &str) -> Option<SampleId> {
        let mut rec = self.lock();
        rec.calls.push(AudioCall::Load(name.to_string()));
        if rec.missing.contains(name) {
            return None;
        }
        if let Some(i) = rec.names.iter().position(|n| n == name) {
            return Some(SampleId(i as u32));
        }
        rec.names.push(name.to_string());
        Some(SampleId(rec.names.len() as u32 - 1))
    }

    fn play(&mut self, id: SampleId) {
        let mut rec = self.lock();
        let name = rec.name(id);
        rec.calls.push(AudioCall::Play(name));
    }

    fn repeat(&mut self, id: SampleId) {
        let mut rec = self.lock();
        let name = rec.name(id);
        rec.looping.insert(id);
        rec.calls.push(AudioCall::Repeat(name));
    }

    fn stop(&mut self, id: SampleId) {
        let mut rec = self.lock();
        let name = rec.name(id);
        rec.looping.remove(&id);
        rec.calls.push(AudioCall::Stop(name));
    }

    fn set_volume(&mut self, id: SampleId, volume: f32) {
        let mut rec = self.lock();
        let name = rec.name(id);
        rec.calls.push(AudioCall::SetVolume(name, volume));
    }

    fn fade_to(
        &mut self,
        id: SampleId,
        volume: f32,
        duration_ms: u32,
        delay_ms: u32,
        stop_when_done: bool,
    ) {
        let mut rec = self.lock();
        let name = rec.name(id);
        if stop_when_done {
            rec.looping.remove(&id);
        }
        rec.calls.push(AudioCall::FadeTo {
            name,
            volume,
            duration_ms,
            delay_ms,
            stop_when_done,
        });
    }

    fn is_playing(&self, id: SampleId) -> bool {
        self.lock().looping.contains(&id)
    }
}
