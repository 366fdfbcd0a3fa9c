//! Background text words and their presentation state
//!
//! Each word carries:
//! - A fade state machine driving its opacity
//! - A contraction that squeezes its glyphs toward a point when bitten
//! - Seen/biteable bookkeeping used by the orchestrator
//!
//! Layout (text, bounds, baseline anchor) is fixed once the page is built.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::ripple::RippleField;
use crate::Rect;
use crate::renderer::GlyphVertex;
use crate::settings::{ContractSettings, FadePreset};

/// Which way a word's opacity is moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FadeState {
    #[default]
    Stable,
    FadingIn,
    FadingOut,
}

/// Opacity with a target and per-tick speeds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fade {
    pub opacity: f32,
    pub target: f32,
    pub speed_in: f32,
    pub speed_out: f32,
    pub state: FadeState,
}

impl Default for Fade {
    fn default() -> Self {
        Self {
            opacity: 0.0,
            target: 1.0,
            speed_in: 0.05,
            speed_out: 0.01,
            state: FadeState::Stable,
        }
    }
}

impl Fade {
    /// Start (or retarget) a fade toward `target`. Never resets progress;
    /// a word above the target drops to it on the next update.
    pub fn fade_in(&mut self, target: f32, speed_in: f32, speed_out: Option<f32>) {
        self.target = target.clamp(0.0, 1.0);
        self.speed_in = speed_in;
        if let Some(out) = speed_out {
            self.speed_out = out;
        }
        self.state = if self.opacity == self.target {
            FadeState::Stable
        } else {
            FadeState::FadingIn
        };
    }

    pub fn fade_in_preset(&mut self, preset: FadePreset) {
        self.fade_in(preset.target, preset.fade_in, Some(preset.fade_out));
    }

    /// Start fading toward 0, optionally with a new speed
    pub fn fade_out(&mut self, speed: Option<f32>) {
        if let Some(speed) = speed {
            self.speed_out = speed;
        }
        self.state = if self.opacity > 0.0 {
            FadeState::FadingOut
        } else {
            FadeState::Stable
        };
    }

    pub fn update(&mut self) {
        match self.state {
            FadeState::Stable => {}
            FadeState::FadingIn => {
                self.opacity += self.speed_in;
                if self.opacity >= self.target {
                    self.opacity = self.target;
                    self.state = FadeState::Stable;
                }
            }
            FadeState::FadingOut => {
                self.opacity -= self.speed_out;
                if self.opacity <= 0.0 {
                    self.opacity = 0.0;
                    self.state = FadeState::Stable;
                }
            }
        }
        self.opacity = self.opacity.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn is_fading(&self) -> bool {
        self.state != FadeState::Stable
    }

    #[inline]
    pub fn is_fading_in(&self) -> bool {
        self.state == FadeState::FadingIn
    }

    #[inline]
    pub fn is_fading_out(&self) -> bool {
        self.state == FadeState::FadingOut
    }
}

/// Whether a word is being squeezed
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ContractPhase {
    #[default]
    Relaxed,
    /// Held by a snake since `start_ms`
    Contracting { start_ms: u64 },
    /// Let go, amount decaying toward zero
    Releasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Contraction {
    pub phase: ContractPhase,
    pub origin: Vec2,
    /// Contraction strength, nominally in [0, 1]
    pub amount: f32,
    pub velocity: f32,
    pub acceleration: f32,
    /// Width of the half-cosine falloff around the origin
    pub period: f32,
}

impl Contraction {
    pub fn contract(&mut self, at: Vec2, now_ms: u64, settings: &ContractSettings) {
        match self.phase {
            ContractPhase::Contracting { start_ms } => {
                let elapsed = now_ms.saturating_sub(start_ms) as f32;
                self.period = settings.period
                    + (elapsed / settings.jitter_period_ms).sin() * settings.period_jitter;
            }
            ContractPhase::Relaxed | ContractPhase::Releasing => {
                self.period = settings.period;
                self.phase = ContractPhase::Contracting { start_ms: now_ms };
            }
        }
        self.origin = at;
        if self.amount < 1.0 && settings.acceleration_divisor > 0.0 {
            self.acceleration += (1.0 - self.amount) / settings.acceleration_divisor;
        }
    }

    pub fn release(&mut self) {
        if matches!(self.phase, ContractPhase::Contracting { .. }) {
            self.phase = ContractPhase::Releasing;
        }
    }

    pub fn update(&mut self, settings: &ContractSettings) {
        self.velocity += self.acceleration;
        self.acceleration = 0.0;
        self.amount += self.velocity;
        self.velocity *= settings.damping;

        if self.velocity < settings.release_velocity {
            self.amount *= settings.release;
            if !self.is_contracting() {
                self.velocity = 0.0;
                if self.amount < settings.epsilon {
                    self.amount = 0.0;
                    self.phase = ContractPhase::Relaxed;
                }
            }
        }
    }

    #[inline]
    pub fn is_contracting(&self) -> bool {
        matches!(self.phase, ContractPhase::Contracting { .. })
    }

    /// Scale factor for a vertex's height at absolute x
    pub fn height_scale(&self, x: f32) -> f32 {
        if self.amount == 0.0 || self.period <= 0.0 {
            return 1.0;
        }
        let dx = (x - self.origin.x).abs();
        let falloff = if dx > self.period {
            0.0
        } else {
            ((dx / self.period * std::f32::consts::PI).cos() + 1.0) / 2.0
        };
        1.0 - falloff * self.amount.min(1.0)
    }
}

/// Location of a word in the page store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WordRef {
    pub page: usize,
    pub line: usize,
    pub word: usize,
}

/// One word of background text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    /// Hit box, extended over half the surrounding gaps
    pub bounds: Rect,
    /// Left end of the baseline; glyph vertices are relative to this
    pub anchor: Vec2,
    pub font_size: f32,
    pub fade: Fade,
    pub contraction: Contraction,
    /// Faded away without being held by a touch
    pub seen: bool,
    /// Currently under a touch that may trigger a bite
    pub biteable: bool,
}

impl Word {
    pub fn new(text: impl Into<String>, bounds: Rect, anchor: Vec2, font_size: f32) -> Self {
        Self {
            text: text.into(),
            bounds,
            anchor,
            font_size,
            fade: Fade::default(),
            contraction: Contraction::default(),
            seen: false,
            biteable: false,
        }
    }

    #[inline]
    pub fn opacity(&self) -> f32 {
        self.fade.opacity
    }

    pub fn update(&mut self, settings: &ContractSettings) {
        self.fade.update();
        self.contraction.update(settings);
    }

    pub fn contract(&mut self, at: Vec2, now_ms: u64, settings: &ContractSettings) {
        self.contraction.contract(at, now_ms, settings);
    }

    pub fn decontract(&mut self) {
        self.contraction.release();
    }

    /// Apply contraction and ripple displacement to a baseline-relative vertex
    pub fn deform_vertex(&self, v: Vec3, ripples: &RippleField) -> Vec3 {
        let absolute = self.anchor + v.truncate();
        let y = v.y * self.contraction.height_scale(absolute.x);
        let z = v.z + ripples.depth_at(Vec2::new(absolute.x, self.anchor.y + y));
        Vec3::new(v.x, y, z)
    }

    /// Deform renderer-owned rest vertices into `out`
    pub fn deform_vertices(
        &self,
        rest: &[GlyphVertex],
        out: &mut Vec<GlyphVertex>,
        ripples: &RippleField,
    ) {
        out.clear();
        out.extend(rest.iter().map(|v| {
            let p = self.deform_vertex(Vec3::from(v.position), ripples);
            GlyphVertex {
                position: p.to_array(),
            }
        }));
    }
}

/// One line of a page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Line {
    pub words: Vec<Word>,
}

impl Line {
    /// Top edge of the line, from its first word
    pub fn top(&self) -> Option<f32> {
        self.words.first().map(|w| w.bounds.y)
    }
}

/// One body of background text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub lines: Vec<Line>,
    /// Words marked seen since the page was last shown
    pub seen_count: usize,
}

impl Page {
    pub fn word_count(&self) -> usize {
        self.lines.iter().map(|l| l.words.len()).sum()
    }

    /// Fraction of the page seen (0 for an empty page)
    pub fn seen_ratio(&self) -> f32 {
        match self.word_count() {
            0 => 0.0,
            total => self.seen_count as f32 / total as f32,
        }
    }

    /// Index of the line a point at height `y` falls on: the last line
    /// whose top edge is above it
    pub fn line_at(&self, y: f32) -> Option<usize> {
        let mut found = None;
        for (i, line) in self.lines.iter().enumerate() {
            match line.top() {
                Some(top) if top <= y => found = Some(i),
                Some(_) => break,
                None => {}
            }
        }
        found
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.lines.iter().flat_map(|l| l.words.iter())
    }

    pub fn words_mut(&mut self) -> impl Iterator<Item = &mut Word> {
        self.lines.iter_mut().flat_map(|l| l.words.iter_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn word() -> Word {
        Word::new("rattle", Rect::new(0.0, 0.0, 100.0, 40.0), Vec2::new(0.0, 32.0), 40.0)
    }

    #[test]
    fn test_fade_in_clamps_at_target() {
        let mut fade = Fade::default();
        fade.fade_in(0.1, 0.03, Some(0.01));
        for _ in 0..10 {
            fade.update();
        }
        assert_eq!(fade.opacity, 0.1);
        assert_eq!(fade.state, FadeState::Stable);
    }

    #[test]
    fn test_fade_out_clamps_at_zero() {
        let mut fade = Fade::default();
        fade.fade_in(1.0, 1.0, None);
        fade.update();
        fade.fade_out(Some(0.3));
        for _ in 0..10 {
            fade.update();
            assert!(fade.opacity >= 0.0);
        }
        assert_eq!(fade.opacity, 0.0);
        assert!(!fade.is_fading());
    }

    #[test]
    fn test_fade_in_twice_does_not_restart() {
        let mut fade = Fade::default();
        fade.fade_in(1.0, 0.05, None);
        for _ in 0..5 {
            fade.update();
        }
        let before = fade.opacity;
        fade.fade_in(1.0, 0.05, None);
        assert_eq!(fade.opacity, before);
        fade.update();
        assert!(fade.opacity > before);
    }

    #[test]
    fn test_fade_in_below_current_drops_to_target() {
        let mut fade = Fade::default();
        fade.fade_in(1.0, 1.0, None);
        fade.update();
        fade.fade_in(0.1, 0.02, None);
        assert!(fade.is_fading_in());
        fade.update();
        assert_eq!(fade.opacity, 0.1);
        assert_eq!(fade.state, FadeState::Stable);
    }

    #[test]
    fn test_lower_fade_in_replaces_fade_out() {
        let mut fade = Fade {
            opacity: 0.6,
            ..Default::default()
        };
        fade.fade_out(None);
        fade.fade_in(0.1, 0.02, Some(0.01));
        for _ in 0..3 {
            fade.update();
        }
        assert_eq!(fade.opacity, 0.1);
        assert_eq!(fade.state, FadeState::Stable);
    }

    #[test]
    fn test_fade_in_at_target_is_stable() {
        let mut fade = Fade {
            opacity: 0.8,
            ..Default::default()
        };
        fade.fade_in(0.8, 0.03, None);
        assert_eq!(fade.state, FadeState::Stable);
    }

    #[test]
    fn test_contraction_rises_and_releases() {
        let settings = ContractSettings::default();
        let mut w = word();
        for t in 0..60 {
            w.contract(Vec2::new(50.0, 20.0), t * 16, &settings);
            w.update(&settings);
        }
        assert!(w.contraction.is_contracting());
        assert!(w.contraction.amount > 0.5);

        w.decontract();
        for _ in 0..2000 {
            w.update(&settings);
        }
        assert_eq!(w.contraction.amount, 0.0);
        assert_eq!(w.contraction.phase, ContractPhase::Relaxed);
    }

    #[test]
    fn test_contract_deformation_falloff() {
        let mut c = Contraction {
            amount: 2.0,
            period: 100.0,
            origin: Vec2::new(50.0, 0.0),
            ..Default::default()
        };
        // Amount is capped at 1, full squeeze at the origin
        assert!(c.height_scale(50.0).abs() < 1e-6);
        assert_eq!(c.height_scale(200.0), 1.0);
        c.amount = 0.5;
        let mid = c.height_scale(100.0);
        assert!((mid - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_relaxed_word_is_not_deformed() {
        let w = word();
        let ripples = RippleField::new(&Default::default(), Vec2::new(1280.0, 720.0));
        let v = Vec3::new(10.0, -20.0, 0.0);
        assert_eq!(w.deform_vertex(v, &ripples), v);
    }

    #[test]
    fn test_page_line_lookup() {
        let mut page = Page::default();
        for top in [20.0, 80.0, 140.0] {
            page.lines.push(Line {
                words: vec![Word::new(
                    "w",
                    Rect::new(0.0, top, 50.0, 60.0),
                    Vec2::new(0.0, top + 40.0),
                    40.0,
                )],
            });
        }
        assert_eq!(page.line_at(10.0), None);
        assert_eq!(page.line_at(20.0), Some(0));
        assert_eq!(page.line_at(100.0), Some(1));
        assert_eq!(page.line_at(700.0), Some(2));
    }

    #[test]
    fn test_seen_ratio_empty_page() {
        assert_eq!(Page::default().seen_ratio(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_opacity_stays_in_unit_range(
            ops in proptest::collection::vec((0u8..3, 0.0f32..1.5, 0.001f32..0.5), 1..60),
        ) {
            let mut fade = Fade::default();
            for (op, target, speed) in ops {
                match op {
                    0 => fade.fade_in(target, speed, Some(speed)),
                    1 => fade.fade_out(Some(speed)),
                    _ => {}
                }
                fade.update();
                prop_assert!((0.0..=1.0).contains(&fade.opacity));
            }
        }

        #[test]
        fn prop_fade_out_is_monotone(speed_in in 0.01f32..0.2, speed_out in 0.001f32..0.2, ticks in 1usize..10) {
            let mut fade = Fade::default();
            fade.fade_in(1.0, speed_in, Some(speed_out));
            for _ in 0..ticks {
                fade.update();
            }
            fade.fade_out(None);
            let mut prev = fade.opacity;
            for _ in 0..1200 {
                fade.update();
                prop_assert!(fade.opacity <= prev);
                prop_assert!(fade.opacity >= 0.0);
                prev = fade.opacity;
            }
            prop_assert_eq!(fade.opacity, 0.0);
        }
    }
}
