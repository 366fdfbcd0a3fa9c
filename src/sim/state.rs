//! Installation state
//!
//! Everything the per-tick rules read and write lives in [`Installation`]:
//! the physics context, the pages, the touch set, the four snakes, the
//! ripples, the page transition and the idle wander. Audio is driven
//! through the owned [`SoundDirector`].

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::path::IdleAnimator;
use super::physics::ParticleSystem;
use super::ripple::RippleField;
use super::snake::Snake;
use super::touch::{Touch, TouchEvent, TouchId, TouchSet};
use super::transition::PageTransition;
use super::word::{Page, Word, WordRef};
use crate::audio::{AudioEngine, SoundDirector};
use crate::consts::SNAKE_COUNT;
use crate::error::ConfigError;
use crate::layout::{TextLayout, layout_page};
use crate::settings::Settings;

/// Something that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    TouchAdded { touch: TouchId },
    TouchRemoved { touch: TouchId },
    Bite { snake: usize, touch: TouchId, word: WordRef },
    Strike { snake: usize },
    Contract { snake: usize, word: WordRef },
    Retract { snake: usize },
    Settled { snake: usize },
    Ripple { at: Vec2 },
    TransitionStarted { page: usize },
    PageChanged { from: usize, to: usize },
}

/// Complete engine state
pub struct Installation {
    pub settings: Settings,
    /// Seed the RNG was created from
    pub seed: u64,
    /// Simulation clock in milliseconds
    pub time_ms: f64,
    /// Ticks run so far
    pub time_ticks: u64,
    pub rng: Pcg32,
    pub physics: ParticleSystem,
    /// Built once at startup; word state persists across page cycles
    pub pages: Vec<Page>,
    /// Page currently shown
    pub page_index: usize,
    pub touches: TouchSet,
    /// One per screen quadrant: top-left, top-right, bottom-left, bottom-right
    pub snakes: Vec<Snake>,
    pub ripples: RippleField,
    pub transition: PageTransition,
    pub idle: IdleAnimator,
    /// Point the idle wander highlighted this tick
    pub idle_point: Option<Vec2>,
    pub audio: SoundDirector,
    /// Words under touches that may be bitten
    pub biteable: Vec<WordRef>,
    /// Words highlighted without being biteable
    pub visible: Vec<WordRef>,
    pub last_touch_ms: u64,
    /// Next bite is the first of the page cycle
    pub first_bite: bool,
    /// Events raised by the last tick
    pub events: Vec<SimEvent>,
}

impl Installation {
    /// Build the installation: lay out every page, place the snakes in
    /// their corners and start the ambient sound
    pub fn new(
        settings: Settings,
        layout: &dyn TextLayout,
        engine: Box<dyn AudioEngine>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let seed = settings.seed.unwrap_or_else(rand::random);
        let mut rng = Pcg32::seed_from_u64(seed);
        let viewport = settings.viewport_size();

        let pages: Vec<Page> = settings
            .text
            .pages
            .iter()
            .enumerate()
            .map(|(i, lines)| {
                let spacings = settings
                    .text
                    .line_spacings
                    .get(i)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                layout_page(layout, lines, spacings, viewport, &settings.text)
            })
            .collect();
        let page_index = settings.text.start_page.min(pages.len() - 1);

        let mut physics = ParticleSystem::from_settings(&settings.physics);
        let snake_settings = &settings.snake;
        let mut snakes = Vec::with_capacity(SNAKE_COUNT);
        for (i, def) in snake_settings.snakes.iter().take(SNAKE_COUNT).enumerate() {
            let mut snake = Snake::new(
                i,
                &def.text,
                def.head,
                snake_settings,
                def.retract,
                layout,
                &mut physics,
                viewport,
            );
            if let Err(err) =
                snake.set_scales(&snake_settings.shape_positions, &snake_settings.shape_scales)
            {
                log::warn!("Snake {i} keeps its default shape: {err}");
            }
            snake.set_bite(
                &mut physics,
                settings.bite.prey_mass,
                settings.bite.strength_multiplier,
                settings.bite.min_distance,
            );
            let body = snake_settings.body;
            snake.set_origin(&mut physics, body.amplitude, body.length, body.cycles);
            let offset = def.corner.origin(viewport) + Vec2::from(def.offset);
            snake.translate(&mut physics, offset);
            snake.retract(&mut physics, 0);
            snakes.push(snake);
        }

        let mut audio = SoundDirector::new(engine, &settings.audio, snakes.len());
        audio.start();

        let ripples = RippleField::new(&settings.ripple, viewport);
        let transition = PageTransition::new(&settings.transition, 0);
        let idle = IdleAnimator::new(&settings.idle, viewport, 0, &mut rng);

        log::info!(
            "Installation ready: {} pages, {} snakes, seed {seed}, starting on page {page_index}",
            pages.len(),
            snakes.len()
        );

        Ok(Self {
            settings,
            seed,
            time_ms: 0.0,
            time_ticks: 0,
            rng,
            physics,
            pages,
            page_index,
            touches: TouchSet::new(),
            snakes,
            ripples,
            transition,
            idle,
            idle_point: None,
            audio,
            biteable: Vec::new(),
            visible: Vec::new(),
            last_touch_ms: 0,
            first_bite: true,
            events: Vec::new(),
        })
    }

    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.time_ms as u64
    }

    pub fn page(&self) -> &Page {
        &self.pages[self.page_index]
    }

    pub fn word(&self, r: WordRef) -> Option<&Word> {
        self.pages.get(r.page)?.lines.get(r.line)?.words.get(r.word)
    }

    pub fn word_mut(&mut self, r: WordRef) -> Option<&mut Word> {
        self.pages
            .get_mut(r.page)?
            .lines
            .get_mut(r.line)?
            .words
            .get_mut(r.word)
    }

    /// Index of the snake owning the quadrant `point` falls in
    pub fn quadrant(&self, point: Vec2) -> usize {
        let half = self.settings.viewport_size() / 2.0;
        let mut index = 0;
        if point.x > half.x {
            index += 1;
        }
        if point.y > half.y {
            index += 2;
        }
        index
    }

    pub fn biting_count(&self) -> usize {
        self.snakes.iter().filter(|s| s.is_biting()).count()
    }

    /// Random extra wait added to a touch after each bite
    pub(crate) fn random_bite_delay(&mut self) -> u64 {
        let (min, max) = (self.settings.bite.next_delay_min_ms, self.settings.bite.next_delay_max_ms);
        if min < max {
            self.rng.random_range(min..max)
        } else {
            min
        }
    }

    /// Fade in the word under `point` on the current page. Biteable
    /// highlights use the text fade speeds, others the idle highlight speeds.
    pub fn highlight_word_at(&mut self, point: Vec2, opacity: f32, bite: bool) {
        let page = self.page_index;
        let Some(line) = self.pages[page].line_at(point.y) else {
            return;
        };

        let margin = self.settings.text.unbiteable_margin;
        let viewport = self.settings.viewport_size();
        let in_margin = point.x < margin
            || point.x > viewport.x - margin
            || point.y < margin
            || point.y > viewport.y - margin;
        let bite = bite && !in_margin;

        let text = &self.settings.text;
        let idle = &self.settings.idle.highlight;
        for (i, word) in self.pages[page].lines[line].words.iter_mut().enumerate() {
            if !word.bounds.contains(point) {
                continue;
            }
            let r = WordRef { page, line, word: i };
            if bite {
                if !self.biteable.contains(&r) {
                    self.biteable.push(r);
                    word.biteable = true;
                    word.fade
                        .fade_in(opacity, text.fade_in_speed, Some(text.fade_out_speed));
                }
            } else if !self.visible.contains(&r) {
                self.visible.push(r);
                word.fade.fade_in(opacity, idle.fade_in, Some(idle.fade_out));
            }
        }
    }

    /// Apply one event from the touch source
    pub fn apply_touch_event(&mut self, event: TouchEvent) {
        let now = self.now_ms();
        match event {
            TouchEvent::Add { id, x, y } => {
                self.idle.end();
                self.last_touch_ms = now;
                let delay = self.random_bite_delay();
                if self.touches.add(Touch::new(id, Vec2::new(x, y), now, delay)).is_some() {
                    log::debug!("Touch {id} re-added without a remove");
                }
                self.events.push(SimEvent::TouchAdded { touch: id });
            }
            TouchEvent::Update { id, x, y } => {
                if !self.touches.update(id, Vec2::new(x, y)) {
                    log::debug!("Update for unknown touch {id}");
                }
            }
            TouchEvent::Remove { id } => {
                self.transition.on_touch_released(now);
                if self.touches.remove(id).is_none() {
                    return;
                }
                self.events.push(SimEvent::TouchRemoved { touch: id });
                self.release_touch(id, now);
            }
        }
    }

    /// Retract every snake biting `touch`
    fn release_touch(&mut self, touch: TouchId, now: u64) {
        let fade = self.settings.audio.release_fade_ms;
        let mut fade_delay = 0;
        for i in 0..self.snakes.len() {
            if self.snakes[i].bite_state().is_none_or(|b| b.touch != touch) {
                continue;
            }
            if let Some(word) = self.snakes[i].retract(&mut self.physics, now) {
                if let Some(w) = self.word_mut(word) {
                    w.decontract();
                }
            }
            self.audio.release_snake(i, fade_delay);
            fade_delay += fade;
            self.events.push(SimEvent::Retract { snake: i });
            log::info!("Snake {i} retracts from touch {touch}");
        }
    }

    /// Debug control: change the page as soon as possible
    pub fn skip_page(&mut self) {
        let now = self.now_ms();
        self.transition.skip(now);
        log::debug!("Skipping page {}", self.page_index);
    }
}
