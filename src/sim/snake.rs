//! Snake skeleton
//!
//! A snake is a chain of sections simulated in the shared particle system:
//! - Consecutive sections are joined by damped springs
//! - Every section has a fixed anchor (its rest pose) and a weak spring to it,
//!   enabled only while biting
//! - The tail end is pinned; the opposite end is the head
//! - While biting, the head is attracted to a fixed "prey" particle that
//!   follows the biting touch
//!
//! Letters are drawn at a weighted blend of section positions, so the text
//! bends with the chain.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::{AttractionId, ParticleId, ParticleSystem, SpringId};
use super::touch::{Touch, TouchId};
use super::word::WordRef;
use crate::consts::{GEOMETRY_EPSILON, RETRACT_EPSILON, RETRACT_TIME_SCALE_MS};
use crate::error::ConfigError;
use crate::layout::TextLayout;
use crate::settings::{RetractSettings, Side, SnakeSettings};
use crate::Rect;

/// Extra chain stiffness spread from the head to the tail
const CHAIN_STIFFNESS_RAMP: f32 = 0.96;

/// The bite a snake is currently performing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bite {
    pub word: WordRef,
    pub touch: TouchId,
    /// Strike sound fired for this bite
    pub strike_played: bool,
    /// Contract signal sent to the word
    pub word_contracted: bool,
    /// Ripple spawned where this bite landed
    pub rippled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SnakeState {
    #[default]
    Idle,
    Biting(Bite),
    Retracting,
}

/// Signals raised by [`Snake::update`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnakeEvent {
    /// Head came within strike distance of the prey
    Strike,
    /// Head entered the bitten word
    Contract { word: WordRef, at: Vec2 },
    /// Retraction finished and the body snapped to its rest pose
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
enum SectionRetract {
    #[default]
    Idle,
    Active {
        start_ms: u64,
    },
}

/// One vertebra
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub particle: ParticleId,
    /// Fixed particle at the rest position
    pub anchor: ParticleId,
    pub anchor_spring: SpringId,
    retract: SectionRetract,
}

impl Section {
    pub fn is_retracting(&self) -> bool {
        matches!(self.retract, SectionRetract::Active { .. })
    }
}

/// One letter of the snake's text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Letter {
    pub ch: char,
    /// Current center
    pub position: Vec2,
    /// Box around the center, relative to it
    pub bounds: Rect,
    pub scale: f32,
    /// Influence of each section, summing to 1
    weights: Vec<f32>,
}

impl Letter {
    /// Bounds in screen space
    pub fn screen_bounds(&self) -> Rect {
        self.bounds.translated(self.position)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snake {
    pub index: usize,
    pub head_side: Side,
    pub text: String,
    pub font_size: f32,
    letters: Vec<Letter>,
    sections: Vec<Section>,
    chain: Vec<SpringId>,
    prey: ParticleId,
    attraction: AttractionId,
    strength_multiplier: f32,
    retract: RetractSettings,
    state: SnakeState,
    /// Accumulated translation of the rest pose
    offset: Vec2,
    viewport: Rect,
}

impl Snake {
    /// Build a flat snake at the origin
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        text: &str,
        head_side: Side,
        settings: &SnakeSettings,
        retract: RetractSettings,
        layout: &dyn TextLayout,
        physics: &mut ParticleSystem,
        viewport: Vec2,
    ) -> Self {
        let font_size = settings.font_size;
        let letters = build_letters(text, font_size, layout);
        let width = letters
            .last()
            .zip(letters.first())
            .map(|(last, first)| {
                last.position.x + layout.advance(&last.ch.to_string(), font_size) - first.position.x
            })
            .unwrap_or(0.0);

        let count = settings.section_count.max(1) + 1;
        let spacing = width / (count - 1) as f32;
        let head = match head_side {
            Side::Right => count - 1,
            Side::Left => 0,
        };

        let mut particles = Vec::with_capacity(count);
        for i in 0..count {
            let mass = if i == head {
                settings.head_mass
            } else {
                settings.section_mass
            };
            particles.push(physics.make_particle(mass, Vec2::new(i as f32 * spacing, 0.0)));
        }

        let mut chain = Vec::with_capacity(count - 1);
        let step = CHAIN_STIFFNESS_RAMP / count as f32;
        for i in 1..count {
            let strength = match head_side {
                Side::Right => 1.0 + (count - i) as f32 * step,
                Side::Left => 1.0 + (i - 1) as f32 * step,
            };
            let rest = physics
                .particle(particles[i])
                .position
                .distance(physics.particle(particles[i - 1]).position);
            chain.push(physics.make_spring(
                particles[i - 1],
                particles[i],
                strength,
                settings.chain_damping,
                rest,
            ));
        }

        let tail = count - 1 - head;
        physics.particle_mut(particles[tail]).fixed = true;

        let anchor = settings.anchor_spring;
        let sections = particles
            .iter()
            .map(|&particle| {
                let p = physics.particle(particle);
                let (mass, position) = (p.mass, p.position);
                let anchor_particle = physics.make_particle(mass, position);
                physics.particle_mut(anchor_particle).fixed = true;
                let anchor_spring = physics.make_spring(
                    anchor_particle,
                    particle,
                    anchor.strength,
                    anchor.damping,
                    anchor.rest_length,
                );
                Section {
                    particle,
                    anchor: anchor_particle,
                    anchor_spring,
                    retract: SectionRetract::Idle,
                }
            })
            .collect::<Vec<_>>();

        let head_particle = sections[head].particle;
        let prey = physics.make_particle(100.0, Vec2::ZERO);
        physics.particle_mut(prey).fixed = true;
        let attraction = physics.make_attraction(head_particle, prey, 0.0, 50.0);
        physics.attraction_mut(attraction).on = false;

        let mut snake = Self {
            index,
            head_side,
            text: text.to_string(),
            font_size,
            letters,
            sections,
            chain,
            prey,
            attraction,
            strength_multiplier: 7.69,
            retract,
            state: SnakeState::Idle,
            offset: Vec2::ZERO,
            viewport: Rect::from_size(viewport),
        };
        snake.compute_weights(physics, spacing);
        snake
    }

    /// Section influence per letter in the flat pose
    fn compute_weights(&mut self, physics: &ParticleSystem, window: f32) {
        let positions: Vec<Vec2> = self
            .sections
            .iter()
            .map(|s| physics.particle(s.particle).position)
            .collect();
        for letter in &mut self.letters {
            let mut weights: Vec<f32> = if window > GEOMETRY_EPSILON {
                positions
                    .iter()
                    .map(|p| {
                        let d = p.distance(letter.position) - window;
                        if d > 0.0 { 0.0 } else { -d / window }
                    })
                    .collect()
            } else {
                vec![0.0; positions.len()]
            };
            let total: f32 = weights.iter().sum();
            if total > GEOMETRY_EPSILON {
                for w in &mut weights {
                    *w /= total;
                }
            } else if let Some(nearest) = nearest_index(&positions, letter.position) {
                weights[nearest] = 1.0;
            }
            letter.weights = weights;
        }
    }

    /// Set per-letter scale from a table of (position along body, scale).
    /// Positions run from tail (0) to head (1).
    pub fn set_scales(&mut self, positions: &[f32], scales: &[f32]) -> Result<(), ConfigError> {
        if positions.len() != scales.len() {
            log::warn!(
                "Snake {}: scale table ignored ({} positions, {} scales)",
                self.index,
                positions.len(),
                scales.len()
            );
            return Err(ConfigError::ShapeLengthMismatch {
                positions: positions.len(),
                scales: scales.len(),
            });
        }
        if positions.len() < 2 {
            log::warn!("Snake {}: scale table needs at least 2 points", self.index);
            return Err(ConfigError::ShapeTooShort(positions.len()));
        }

        let (positions, scales): (Vec<f32>, Vec<f32>) = match self.head_side {
            Side::Right => (positions.to_vec(), scales.to_vec()),
            Side::Left => (
                positions.iter().rev().map(|p| 1.0 - p).collect(),
                scales.iter().rev().copied().collect(),
            ),
        };

        let count = self.letters.len();
        let points: Vec<(f32, f32)> = positions
            .iter()
            .zip(&scales)
            .map(|(p, s)| ((p * count as f32).floor(), *s))
            .collect();
        for (i, letter) in self.letters.iter_mut().enumerate() {
            letter.scale = interpolate(&points, i as f32);
        }
        Ok(())
    }

    /// Bend the rest pose into a sine wave
    pub fn set_origin(
        &mut self,
        physics: &mut ParticleSystem,
        amplitude: f32,
        length: f32,
        cycles: f32,
    ) {
        let count = self.sections.len();
        let rads = cycles * std::f32::consts::TAU;
        for (i, section) in self.sections.iter().enumerate() {
            let xrad = if count > 1 {
                i as f32 * rads / (count - 1) as f32
            } else {
                0.0
            };
            let rest = self.offset + Vec2::new(xrad * length / count as f32, -amplitude * xrad.sin());
            physics.particle_mut(section.anchor).position = rest;
            let p = physics.particle_mut(section.particle);
            p.position = rest;
            p.velocity = Vec2::ZERO;
        }
        for (i, spring) in self.chain.iter().enumerate() {
            let a = physics.particle(self.sections[i].anchor).position;
            let b = physics.particle(self.sections[i + 1].anchor).position;
            physics.spring_mut(*spring).rest_length = a.distance(b);
        }
        self.update_letters(physics);
    }

    /// Move the body and its rest pose
    pub fn translate(&mut self, physics: &mut ParticleSystem, offset: Vec2) {
        self.offset += offset;
        for section in &self.sections {
            physics.particle_mut(section.particle).position += offset;
            physics.particle_mut(section.anchor).position += offset;
        }
        self.update_letters(physics);
    }

    pub fn set_bite(&mut self, physics: &mut ParticleSystem, mass: f32, strength: f32, min_distance: f32) {
        physics.particle_mut(self.prey).mass = mass;
        physics.attraction_mut(self.attraction).min_distance = min_distance;
        self.strength_multiplier = strength;
    }

    pub fn set_retract(&mut self, retract: RetractSettings) {
        self.retract = retract;
    }

    /// Start biting `word` held by `touch`
    pub fn bite(&mut self, physics: &mut ParticleSystem, word: WordRef, touch: &mut Touch) {
        touch.bites += 1;
        for section in &mut self.sections {
            section.retract = SectionRetract::Idle;
            physics.spring_mut(section.anchor_spring).on = true;
        }
        physics.particle_mut(self.prey).position = touch.position;
        let reach = self.original_head_position(physics).distance(touch.position);
        let attraction = physics.attraction_mut(self.attraction);
        attraction.strength = self.strength_multiplier * reach;
        attraction.on = true;

        self.state = SnakeState::Biting(Bite {
            word,
            touch: touch.id,
            strike_played: false,
            word_contracted: false,
            rippled: false,
        });
        log::debug!("Snake {} bites touch {} (reach {reach:.0})", self.index, touch.id);
    }

    /// Let go and slide back to the rest pose. Returns the word that was
    /// bitten so the caller can release its contraction.
    pub fn retract(&mut self, physics: &mut ParticleSystem, now_ms: u64) -> Option<WordRef> {
        let released = match self.state {
            SnakeState::Biting(bite) => Some(bite.word),
            SnakeState::Idle | SnakeState::Retracting => None,
        };
        physics.attraction_mut(self.attraction).on = false;
        for section in &mut self.sections {
            physics.spring_mut(section.anchor_spring).on = false;
            section.retract = SectionRetract::Active { start_ms: now_ms };
        }
        self.state = SnakeState::Retracting;
        released
    }

    /// Per-tick update, after the physics step.
    ///
    /// `touch` is the live position of the biting touch and `word_bounds`
    /// the bounds of the bitten word, when biting.
    pub fn update(
        &mut self,
        physics: &mut ParticleSystem,
        now_ms: u64,
        touch: Option<Vec2>,
        word_bounds: Option<Rect>,
        strike_distance: f32,
    ) -> Vec<SnakeEvent> {
        let mut events = Vec::new();
        match self.state {
            SnakeState::Retracting => {
                self.update_sections(physics, now_ms);
                self.update_letters(physics);
                let home = self.sections.iter().all(|s| !s.is_retracting());
                if home || self.is_outside() {
                    self.reset(physics);
                    self.state = SnakeState::Idle;
                    events.push(SnakeEvent::Settled);
                }
                return events;
            }
            SnakeState::Biting(mut bite) => {
                if let Some(position) = touch {
                    physics.particle_mut(self.prey).position = position;
                }
                if !bite.strike_played && self.distance_from_prey(physics) < strike_distance {
                    bite.strike_played = true;
                    events.push(SnakeEvent::Strike);
                }
                if !bite.word_contracted
                    && word_bounds.is_some_and(|b| b.contains(self.head_position(physics)))
                {
                    bite.word_contracted = true;
                    events.push(SnakeEvent::Contract {
                        word: bite.word,
                        at: physics.particle(self.prey).position,
                    });
                }
                self.state = SnakeState::Biting(bite);
            }
            SnakeState::Idle => {}
        }
        self.update_letters(physics);
        events
    }

    fn update_sections(&mut self, physics: &mut ParticleSystem, now_ms: u64) {
        let count = self.sections.len();
        let RetractSettings {
            direction,
            delay_ms,
            wave_ms,
            speed,
        } = self.retract;
        for (i, section) in self.sections.iter_mut().enumerate() {
            let SectionRetract::Active { start_ms } = section.retract else {
                continue;
            };
            let index = match direction {
                Side::Left => i,
                Side::Right => count - 1 - i,
            };
            let wait = delay_ms + index as u64 * wave_ms;
            let elapsed = now_ms.saturating_sub(start_ms);
            if elapsed < wait {
                continue;
            }

            let anchor = physics.particle(section.anchor).position;
            let p = physics.particle_mut(section.particle);
            let to_anchor = anchor - p.position;
            let distance = to_anchor.length();
            if distance < RETRACT_EPSILON {
                p.velocity = Vec2::ZERO;
                section.retract = SectionRetract::Idle;
                continue;
            }
            let ramp = (elapsed - wait) as f32 / RETRACT_TIME_SCALE_MS;
            p.velocity += to_anchor / distance * speed * ramp;
        }
    }

    /// Snap every section onto its anchor
    fn reset(&mut self, physics: &mut ParticleSystem) {
        for section in &mut self.sections {
            let anchor = physics.particle(section.anchor).position;
            let p = physics.particle_mut(section.particle);
            p.position = anchor;
            p.velocity = Vec2::ZERO;
            section.retract = SectionRetract::Idle;
        }
        self.update_letters(physics);
    }

    fn update_letters(&mut self, physics: &ParticleSystem) {
        let positions: Vec<Vec2> = self
            .sections
            .iter()
            .map(|s| physics.particle(s.particle).position)
            .collect();
        for letter in &mut self.letters {
            letter.position = letter
                .weights
                .iter()
                .zip(&positions)
                .map(|(w, p)| *p * *w)
                .sum();
        }
    }

    /// True when no letter overlaps the viewport
    pub fn is_outside(&self) -> bool {
        !self
            .letters
            .iter()
            .any(|l| self.viewport.intersects(&l.screen_bounds()))
    }

    fn head_index(&self) -> usize {
        match self.head_side {
            Side::Right => self.sections.len() - 1,
            Side::Left => 0,
        }
    }

    pub fn head_position(&self, physics: &ParticleSystem) -> Vec2 {
        physics.particle(self.sections[self.head_index()].particle).position
    }

    /// Rest position of the head
    pub fn original_head_position(&self, physics: &ParticleSystem) -> Vec2 {
        physics.particle(self.sections[self.head_index()].anchor).position
    }

    pub fn prey_position(&self, physics: &ParticleSystem) -> Vec2 {
        physics.particle(self.prey).position
    }

    pub fn distance_from_prey(&self, physics: &ParticleSystem) -> f32 {
        self.head_position(physics).distance(self.prey_position(physics))
    }

    pub fn section_positions(&self, physics: &ParticleSystem) -> Vec<Vec2> {
        self.sections
            .iter()
            .map(|s| physics.particle(s.particle).position)
            .collect()
    }

    pub fn anchor_positions(&self, physics: &ParticleSystem) -> Vec<Vec2> {
        self.sections
            .iter()
            .map(|s| physics.particle(s.anchor).position)
            .collect()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn letters(&self) -> &[Letter] {
        &self.letters
    }

    #[inline]
    pub fn state(&self) -> SnakeState {
        self.state
    }

    #[inline]
    pub fn is_biting(&self) -> bool {
        matches!(self.state, SnakeState::Biting(_))
    }

    #[inline]
    pub fn is_retracting(&self) -> bool {
        matches!(self.state, SnakeState::Retracting)
    }

    /// The current bite, if any
    pub fn bite_state(&self) -> Option<&Bite> {
        match &self.state {
            SnakeState::Biting(bite) => Some(bite),
            _ => None,
        }
    }

    pub fn bite_state_mut(&mut self) -> Option<&mut Bite> {
        match &mut self.state {
            SnakeState::Biting(bite) => Some(bite),
            _ => None,
        }
    }
}

fn build_letters(text: &str, font_size: f32, layout: &dyn TextLayout) -> Vec<Letter> {
    let height = layout.line_height(font_size);
    text.char_indices()
        .filter(|(_, ch)| *ch != ' ')
        .map(|(i, ch)| {
            let x = layout.advance(&text[..i], font_size);
            let width = layout.advance(&ch.to_string(), font_size);
            Letter {
                ch,
                position: Vec2::new(x, 0.0),
                bounds: Rect::new(-width / 2.0, -height / 2.0, width, height),
                scale: 1.0,
                weights: Vec::new(),
            }
        })
        .collect()
}

fn nearest_index(points: &[Vec2], target: Vec2) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.distance_squared(target)
                .partial_cmp(&b.distance_squared(target))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
}

/// Piecewise-linear lookup in (x, y) points sorted by x, clamped at both ends
fn interpolate(points: &[(f32, f32)], x: f32) -> f32 {
    let Some(&(first_x, first_y)) = points.first() else {
        return 1.0;
    };
    if x <= first_x {
        return first_y;
    }
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        if x <= x1 {
            if x1 - x0 <= GEOMETRY_EPSILON {
                return y1;
            }
            return y0 + (x - x0) / (x1 - x0) * (y1 - y0);
        }
    }
    points.last().map(|p| p.1).unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FixedAdvanceLayout;
    use crate::settings::Settings;

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    fn snake(head: Side, physics: &mut ParticleSystem) -> Snake {
        let settings = Settings::default();
        let def = &settings.snake.snakes[0];
        Snake::new(
            0,
            "slither along",
            head,
            &settings.snake,
            def.retract,
            &FixedAdvanceLayout::default(),
            physics,
            VIEWPORT,
        )
    }

    fn physics() -> ParticleSystem {
        ParticleSystem::from_settings(&Settings::default().physics)
    }

    #[test]
    fn test_construction_pins_tail() {
        let mut ps = physics();
        let s = snake(Side::Right, &mut ps);
        assert_eq!(s.sections().len(), 25);
        assert!(ps.particle(s.sections()[0].particle).fixed);
        assert!(!ps.particle(s.sections()[24].particle).fixed);
        assert_eq!(ps.particle(s.sections()[24].particle).mass, 10.0);
        assert_eq!(s.letters().len(), 12);

        let mut ps = physics();
        let s = snake(Side::Left, &mut ps);
        assert!(ps.particle(s.sections()[24].particle).fixed);
        assert_eq!(ps.particle(s.sections()[0].particle).mass, 10.0);
    }

    #[test]
    fn test_letter_weights_follow_sections() {
        let mut ps = physics();
        let s = snake(Side::Right, &mut ps);
        // Flat pose reproduces the letter offsets
        let layout = FixedAdvanceLayout::default();
        assert!(s.letters()[0].position.x.abs() < 1e-3);
        let expected = layout.advance("slither ", 40.0);
        assert!((s.letters()[7].position.x - expected).abs() < 1e-2);
        for letter in s.letters() {
            let total: f32 = letter.weights.iter().sum();
            assert!((total - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_set_scales_rejects_bad_tables() {
        let mut ps = physics();
        let mut s = snake(Side::Right, &mut ps);
        let before: Vec<f32> = s.letters().iter().map(|l| l.scale).collect();
        assert!(matches!(
            s.set_scales(&[0.0, 1.0], &[1.0]),
            Err(ConfigError::ShapeLengthMismatch { .. })
        ));
        assert!(matches!(s.set_scales(&[0.0], &[1.0]), Err(ConfigError::ShapeTooShort(1))));
        let after: Vec<f32> = s.letters().iter().map(|l| l.scale).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_set_scales_mirrors_for_left_head() {
        let mut ps = physics();
        let mut right = snake(Side::Right, &mut ps);
        let mut left = snake(Side::Left, &mut ps);
        right.set_scales(&[0.0, 1.0], &[0.5, 1.5]).unwrap();
        left.set_scales(&[0.0, 1.0], &[0.5, 1.5]).unwrap();
        let n = right.letters().len();
        assert_eq!(right.letters()[0].scale, 0.5);
        assert_eq!(left.letters()[0].scale, 1.5);
        assert!(right.letters()[n - 1].scale > right.letters()[0].scale);
        assert!(left.letters()[n - 1].scale < left.letters()[0].scale);
    }

    #[test]
    fn test_set_origin_bends_and_translate_moves() {
        let mut ps = physics();
        let mut s = snake(Side::Right, &mut ps);
        s.set_origin(&mut ps, 50.0, 400.0, 4.0);
        let anchors = s.anchor_positions(&ps);
        assert_eq!(anchors[0], Vec2::ZERO);
        assert!(anchors.iter().any(|a| a.y.abs() > 10.0));

        s.translate(&mut ps, Vec2::new(-100.0, -80.0));
        let moved = s.anchor_positions(&ps);
        assert_eq!(moved[0], Vec2::new(-100.0, -80.0));
        assert_eq!(s.section_positions(&ps), moved);
    }

    #[test]
    fn test_bite_then_retract_settles_on_anchors() {
        let mut ps = physics();
        let mut s = snake(Side::Right, &mut ps);
        s.set_origin(&mut ps, 50.0, 400.0, 4.0);
        s.translate(&mut ps, Vec2::new(-100.0, -300.0));
        let anchors = s.anchor_positions(&ps);

        let word = WordRef { page: 0, line: 0, word: 0 };
        let mut touch = Touch::new(1, Vec2::new(200.0, 150.0), 0, 0);
        s.bite(&mut ps, word, &mut touch);
        assert!(s.is_biting());
        assert_eq!(touch.bites, 1);

        let mut now = 0;
        for _ in 0..120 {
            ps.tick(1.0);
            s.update(&mut ps, now, Some(touch.position), None, 600.0);
            now += 16;
        }
        assert!(s.section_positions(&ps) != anchors);

        assert_eq!(s.retract(&mut ps, now), Some(word));
        assert!(s.is_retracting());
        assert!(!s.is_biting());
        for _ in 0..3000 {
            ps.tick(1.0);
            s.update(&mut ps, now, None, None, 600.0);
            now += 16;
            if !s.is_retracting() {
                break;
            }
        }
        assert!(!s.is_retracting());
        assert!(!s.is_biting());
        assert_eq!(s.section_positions(&ps), anchors);
    }

    #[test]
    fn test_strike_and_contract_fire_once() {
        let mut ps = physics();
        let mut s = snake(Side::Right, &mut ps);
        let word = WordRef { page: 4, line: 0, word: 0 };
        let mut touch = Touch::new(3, Vec2::new(300.0, 0.0), 0, 0);
        s.bite(&mut ps, word, &mut touch);
        let bounds = Rect::new(-1000.0, -1000.0, 4000.0, 4000.0);

        let first = s.update(&mut ps, 0, Some(touch.position), Some(bounds), 600.0);
        assert!(first.contains(&SnakeEvent::Strike));
        assert!(first
            .iter()
            .any(|e| matches!(e, SnakeEvent::Contract { word: w, .. } if *w == word)));
        let second = s.update(&mut ps, 16, Some(touch.position), Some(bounds), 600.0);
        assert!(second.is_empty());
    }

    #[test]
    fn test_interpolate_clamps() {
        let pts = [(2.0, 0.5), (6.0, 1.5)];
        assert_eq!(interpolate(&pts, 0.0), 0.5);
        assert_eq!(interpolate(&pts, 4.0), 1.0);
        assert_eq!(interpolate(&pts, 9.0), 1.5);
    }
}
