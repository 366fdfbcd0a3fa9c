//! Page transition state machine
//!
//! `Idle -> Changing -> Idle`, once per page. While changing, each line
//! runs a reveal wave after its own random stagger delay: the word under
//! the wave fades in, every other visible word fades out. Touches during a
//! change shrink the reveal time so the wave speeds up.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::word::Page;
use crate::settings::TransitionSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionPhase {
    #[default]
    Idle,
    /// Revealing `page` since `start_ms`
    Changing { page: usize, start_ms: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageTransition {
    pub phase: TransitionPhase,
    /// Earliest time the next change may start
    pub next_change_ms: u64,
    /// Changes wait for the first touch release after startup or a wrap
    pub locked: bool,
    /// Time for the wave to cross one line
    pub reveal_ms: f32,
    /// A touch sped up the current change
    pub accelerated: bool,
    /// Per-line start delay, minimum 0
    pub line_delays: Vec<u64>,
    settings: TransitionSettings,
}

impl PageTransition {
    pub fn new(settings: &TransitionSettings, now_ms: u64) -> Self {
        Self {
            phase: TransitionPhase::Idle,
            next_change_ms: now_ms + settings.interval_ms,
            locked: true,
            reveal_ms: settings.reveal_ms,
            accelerated: false,
            line_delays: Vec::new(),
            settings: settings.clone(),
        }
    }

    #[inline]
    pub fn is_changing(&self) -> bool {
        matches!(self.phase, TransitionPhase::Changing { .. })
    }

    /// Keep changing once started; otherwise start when the surface is free
    /// and the change time has passed
    pub fn is_due(&self, now_ms: u64, touched: bool) -> bool {
        self.is_changing() || (!self.locked && !touched && now_ms >= self.next_change_ms)
    }

    /// Enter the changing state for the page being revealed
    pub fn begin(&mut self, page: usize, line_count: usize, now_ms: u64, rng: &mut Pcg32) {
        let stagger = self.settings.line_stagger_ms.max(0);
        let raw: Vec<i64> = (0..line_count)
            .map(|_| rng.random_range(-stagger..=stagger))
            .collect();
        let min = raw.iter().copied().min().unwrap_or(0);
        self.line_delays = raw.into_iter().map(|d| (d - min) as u64).collect();
        self.reveal_ms = self.settings.reveal_ms;
        self.accelerated = false;
        self.phase = TransitionPhase::Changing { page, start_ms: now_ms };
        log::info!("Page transition to {page} started");
    }

    /// Advance the reveal on `page`. Returns true once no word is still
    /// changing.
    pub fn step(&mut self, page: &mut Page, now_ms: u64, touched: bool) -> bool {
        let TransitionPhase::Changing { start_ms, .. } = self.phase else {
            return true;
        };
        if touched || self.accelerated {
            self.accelerated = true;
            self.reveal_ms = (self.reveal_ms * self.settings.acceleration).max(1.0);
        }

        let elapsed = now_ms.saturating_sub(start_ms);
        let (preset, fade_out) = if self.accelerated {
            (self.settings.fast, Some(self.settings.fast_fade_out))
        } else {
            (self.settings.slow, None)
        };

        let mut done = true;
        for (i, line) in page.lines.iter_mut().enumerate() {
            let delay = self.line_delays.get(i).copied().unwrap_or(0);
            if elapsed <= delay {
                done = false;
                continue;
            }
            let count = line.words.len();
            let wave = ((elapsed - delay) as f32 / self.reveal_ms * count as f32) as usize;
            for (j, word) in line.words.iter_mut().enumerate() {
                if j == wave {
                    if !word.fade.is_fading_in() {
                        word.fade.fade_in_preset(preset);
                    }
                    done = false;
                } else if word.opacity() > 0.0 {
                    if !word.fade.is_fading() {
                        word.fade.fade_out(fade_out);
                    }
                    done = false;
                } else {
                    word.seen = false;
                }
            }
        }
        done
    }

    /// Back to idle, next change one interval from now
    pub fn finish(&mut self, now_ms: u64) {
        self.phase = TransitionPhase::Idle;
        self.next_change_ms = now_ms + self.settings.interval_ms;
        self.reveal_ms = self.settings.reveal_ms;
        self.accelerated = false;
    }

    /// A touch lifted: give the reader a moment before the page changes
    pub fn on_touch_released(&mut self, now_ms: u64) {
        let wait = if self.locked {
            self.settings.interval_ms
        } else {
            self.settings.release_holdoff_ms
        };
        self.next_change_ms = self.next_change_ms.max(now_ms + wait);
        self.locked = false;
    }

    /// Most of the page has been read: change soon
    pub fn pull_forward(&mut self, now_ms: u64) {
        self.next_change_ms = self.next_change_ms.min(now_ms + self.settings.early_change_ms);
    }

    /// Start a change on the next due check
    pub fn skip(&mut self, now_ms: u64) {
        self.locked = false;
        self.next_change_ms = now_ms;
    }
}
