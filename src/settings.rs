//! Installation settings
//!
//! Every runtime tunable lives here. Loaded from a JSON file; each section
//! falls back to its defaults so partial files are fine.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Horizontal side of a snake (where its head faces, or which way it retracts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Screen corner a snake's rest pose is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Screen position of this corner
    pub fn origin(&self, viewport: Vec2) -> Vec2 {
        match self {
            Corner::TopLeft => Vec2::ZERO,
            Corner::TopRight => Vec2::new(viewport.x, 0.0),
            Corner::BottomLeft => Vec2::new(0.0, viewport.y),
            Corner::BottomRight => viewport,
        }
    }
}

/// Target opacity and fade speeds used together when highlighting a word
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadePreset {
    pub target: f32,
    pub fade_in: f32,
    pub fade_out: f32,
}

impl FadePreset {
    pub const fn new(target: f32, fade_in: f32, fade_out: f32) -> Self {
        Self {
            target,
            fade_in,
            fade_out,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Background text pages and how touched words fade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSettings {
    /// Opacity gained per tick by a touched word
    pub fade_in_speed: f32,
    /// Opacity lost per tick by a released word
    pub fade_out_speed: f32,
    /// Border (px) where touches highlight but never make words biteable
    pub unbiteable_margin: f32,
    pub start_page: usize,
    pub horizontal_margin: f32,
    pub vertical_margin: f32,
    /// Smallest font size tried when fitting a line to the width
    pub min_font_size: f32,
    /// Extra spacing below each line, per page then per line
    pub line_spacings: Vec<Vec<f32>>,
    /// Page texts, each a list of lines
    pub pages: Vec<Vec<String>>,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            fade_in_speed: 0.05,
            fade_out_speed: 0.01,
            unbiteable_margin: 0.0,
            start_page: 0,
            horizontal_margin: 20.0,
            vertical_margin: 20.0,
            min_font_size: 25.0,
            line_spacings: Vec::new(),
            pages: default_pages(),
        }
    }
}

fn default_pages() -> Vec<Vec<String>> {
    let pages: [&[&str]; 7] = [
        &[
            "the rock holds the heat of the day",
            "long after the light has left the canyon",
            "and something under it is listening",
            "to the small weight of your hand",
        ],
        &[
            "every word you touch is a warm stone",
            "turned over in the dust",
            "you did not mean to wake anything",
            "you only wanted to read",
        ],
        &[
            "the dry grass speaks in one long syllable",
            "the wind answers it with another",
            "between them a tongue tastes the air",
            "and finds your name written there",
        ],
        &[
            "stay still and the text stays quiet",
            "press and it rises to meet you",
            "hold and you will hear the warning",
            "that was always in the margins",
        ],
        &[
            "it does not hate you",
            "it is only made of the same letters",
            "coiled and patient and hungry",
            "for the place where you are looking",
        ],
        &[
            "two of them now",
            "one from each dark corner",
            "the page was never empty",
            "it was waiting for you to lean in",
        ],
        &[
            "let go and they slide back into the edges",
            "the words forget your fingers",
            "the rock cools",
            "and the story starts again",
        ],
    ];
    pages
        .iter()
        .map(|lines| lines.iter().map(|l| l.to_string()).collect())
        .collect()
}

/// Page transition timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionSettings {
    /// Time between page changes
    pub interval_ms: u64,
    /// Time for the reveal wave to cross one line
    pub reveal_ms: f32,
    /// Per-tick multiplier applied to the reveal time while touched
    pub acceleration: f32,
    /// Seen/total ratio that pulls the next change forward
    pub seen_ratio: f32,
    /// How soon the change happens once the seen ratio is passed
    pub early_change_ms: u64,
    /// Hold-off after a touch is released
    pub release_holdoff_ms: u64,
    /// Line start delays are drawn from [-stagger, stagger] then shifted to start at 0
    pub line_stagger_ms: i64,
    pub slow: FadePreset,
    pub fast: FadePreset,
    /// Fade-out speed for non-wave words once the transition is accelerated
    pub fast_fade_out: f32,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            reveal_ms: 4_000.0,
            acceleration: 0.97,
            seen_ratio: 0.8,
            early_change_ms: 3_000,
            release_holdoff_ms: 2_000,
            line_stagger_ms: 999,
            slow: FadePreset::new(0.8, 0.03, 0.01),
            fast: FadePreset::new(0.8, 0.3, 0.1),
            fast_fade_out: 0.1,
        }
    }
}

/// Idle wander animation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleSettings {
    /// Time without touches before the wander may run
    pub idle_after_ms: u64,
    /// Minimum time between wander cycles
    pub interval_ms: u64,
    pub highlight: FadePreset,
    /// Progress gained per tick along the path
    pub path_speed: f32,
    /// Control points are offset from the midpoint by up to this many pixels
    pub control_jitter: f32,
}

impl Default for IdleSettings {
    fn default() -> Self {
        Self {
            idle_after_ms: 10_000,
            interval_ms: 5_000,
            highlight: FadePreset::new(0.1, 0.02, 0.01),
            path_speed: 0.004,
            control_jitter: 300.0,
        }
    }
}

/// When and how snakes bite
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiteSettings {
    pub first_delay_ms: u64,
    pub next_delay_min_ms: u64,
    pub next_delay_max_ms: u64,
    /// Minimum word opacity before it can be bitten
    pub opacity_trigger: f32,
    pub prey_mass: f32,
    pub strength_multiplier: f32,
    pub min_distance: f32,
    /// Head-to-prey distance that fires the strike sound
    pub strike_distance: f32,
    /// Head-to-prey distance that spawns a ripple
    pub ripple_distance: f32,
    /// First page index on which snakes bite
    pub first_page: usize,
}

impl Default for BiteSettings {
    fn default() -> Self {
        Self {
            first_delay_ms: 3_000,
            next_delay_min_ms: 5_000,
            next_delay_max_ms: 15_000,
            opacity_trigger: 1.0,
            prey_mass: 100.0,
            strength_multiplier: 7.69,
            min_distance: 50.0,
            strike_distance: 600.0,
            ripple_distance: 40.0,
            first_page: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpringSettings {
    pub strength: f32,
    pub damping: f32,
    pub rest_length: f32,
}

/// Sine wave bending the rest pose of a snake
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BodyWave {
    pub amplitude: f32,
    pub length: f32,
    pub cycles: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetractSettings {
    /// Side the retract wave starts from
    pub direction: Side,
    pub delay_ms: u64,
    /// Extra delay per section away from the wave's starting side
    pub wave_ms: u64,
    pub speed: f32,
}

/// One of the four snakes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnakeDefinition {
    pub text: String,
    pub head: Side,
    pub corner: Corner,
    /// Offset of the tail end from the corner
    pub offset: [f32; 2],
    pub retract: RetractSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeSettings {
    pub section_count: usize,
    pub font_size: f32,
    /// Positions along the body from 0 (tail) to 1 (head)
    pub shape_positions: Vec<f32>,
    /// Letter scale at each shape position
    pub shape_scales: Vec<f32>,
    pub body: BodyWave,
    pub head_mass: f32,
    pub section_mass: f32,
    pub anchor_spring: SpringSettings,
    pub chain_damping: f32,
    /// Ordered top-left, top-right, bottom-left, bottom-right
    pub snakes: Vec<SnakeDefinition>,
}

impl Default for SnakeSettings {
    fn default() -> Self {
        let snake = |text: &str, head, corner, offset, direction, delay_ms, wave_ms, speed| {
            SnakeDefinition {
                text: text.to_string(),
                head,
                corner,
                offset,
                retract: RetractSettings {
                    direction,
                    delay_ms,
                    wave_ms,
                    speed,
                },
            }
        };
        Self {
            section_count: 24,
            font_size: 40.0,
            shape_positions: vec![0.0, 0.7, 0.9, 1.0],
            shape_scales: vec![0.4, 1.0, 1.2, 0.9],
            body: BodyWave {
                amplitude: 50.0,
                length: 400.0,
                cycles: 4.0,
            },
            head_mass: 10.0,
            section_mass: 1.0,
            anchor_spring: SpringSettings {
                strength: 0.05,
                damping: 0.2,
                rest_length: 150.0,
            },
            chain_damping: 1.0,
            snakes: vec![
                snake(
                    "what rattles in the dry grass rattles in you",
                    Side::Right,
                    Corner::TopLeft,
                    [-100.0, -80.0],
                    Side::Right,
                    0,
                    0,
                    0.02,
                ),
                snake(
                    "the warning comes before the bite",
                    Side::Left,
                    Corner::TopRight,
                    [-400.0, -80.0],
                    Side::Right,
                    250,
                    25,
                    0.05,
                ),
                snake(
                    "read slowly and the stones stay still",
                    Side::Right,
                    Corner::BottomLeft,
                    [-100.0, 90.0],
                    Side::Left,
                    500,
                    50,
                    0.2,
                ),
                snake(
                    "every page has a place to hide",
                    Side::Left,
                    Corner::BottomRight,
                    [-400.0, 90.0],
                    Side::Left,
                    100,
                    100,
                    0.4,
                ),
            ],
        }
    }
}

/// Expanding ripples spawned by landed bites
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleSettings {
    pub base_radius: f32,
    pub base_speed: f32,
    /// Random extra growth speed in [0, jitter)
    pub speed_jitter: u32,
    /// Distance from the ripple edge over which vertices are displaced
    pub length: f32,
    pub cycles: f32,
    pub amplitude: f32,
}

impl Default for RippleSettings {
    fn default() -> Self {
        Self {
            base_radius: 100.0,
            base_speed: 10.0,
            speed_jitter: 16,
            length: 400.0,
            cycles: 1.0,
            amplitude: 50.0,
        }
    }
}

/// Word contraction dynamics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractSettings {
    pub period: f32,
    pub period_jitter: f32,
    pub jitter_period_ms: f32,
    /// Velocity multiplier applied every tick
    pub damping: f32,
    /// Amount multiplier applied every tick while releasing
    pub release: f32,
    /// Amounts below this snap to zero once released
    pub epsilon: f32,
    /// Velocity under which the amount starts to decay
    pub release_velocity: f32,
    /// Acceleration injected per contract call is (1 - amount) / divisor
    pub acceleration_divisor: f32,
}

impl Default for ContractSettings {
    fn default() -> Self {
        Self {
            period: 100.0,
            period_jitter: 8.0,
            jitter_period_ms: 700.0,
            damping: 0.8,
            release: 0.99,
            epsilon: 0.001,
            release_velocity: 0.1,
            acceleration_divisor: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity: [f32; 2],
    pub drag: f32,
    /// Integration steps per tick
    pub substeps: u32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0],
            drag: 0.15,
            substeps: 4,
        }
    }
}

/// Sample names and mixing levels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub ambient: Vec<String>,
    pub threat: Vec<String>,
    pub rattle: Vec<String>,
    pub strike: Vec<String>,
    /// Strike sample reserved for the very first bite
    pub first_strike: String,
    pub ambient_volume_start: f32,
    pub ambient_volume_end: f32,
    pub threat_volume: f32,
    pub rattle_volume: f32,
    pub strike_volume: f32,
    pub startup_fade_ms: u32,
    pub page_fade_ms: u32,
    pub release_fade_ms: u32,
    pub threat_ramp_ms: u64,
    pub threat_gap_ms: u64,
    pub threat_gap_jitter_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        let names = |dir: &str, n: usize| -> Vec<String> {
            (1..=n).map(|i| format!("sounds/{dir}/{dir}-{i:02}.aif")).collect()
        };
        Self {
            ambient: names("ambient", 2),
            threat: names("threat", 4),
            rattle: names("rattle", 6),
            strike: names("strike", 6),
            first_strike: "sounds/strike/hi hat.aif".to_string(),
            ambient_volume_start: 1.0,
            ambient_volume_end: 1.0,
            threat_volume: 1.0,
            rattle_volume: 1.0,
            strike_volume: 1.0,
            startup_fade_ms: 5_000,
            page_fade_ms: 30_000,
            release_fade_ms: 1_000,
            threat_ramp_ms: 45_000,
            threat_gap_ms: 4_000,
            threat_gap_jitter_ms: 4_000,
        }
    }
}

/// All installation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub viewport: ViewportSettings,
    /// RNG seed (random when absent)
    pub seed: Option<u64>,
    pub text: TextSettings,
    pub transition: TransitionSettings,
    pub idle: IdleSettings,
    pub bite: BiteSettings,
    pub snake: SnakeSettings,
    pub ripple: RippleSettings,
    pub contract: ContractSettings,
    pub physics: PhysicsSettings,
    pub audio: AudioSettings,
}

impl Settings {
    /// Viewport size as a vector
    pub fn viewport_size(&self) -> Vec2 {
        Vec2::new(self.viewport.width, self.viewport.height)
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(ConfigError::invalid("viewport", "width and height must be positive"));
        }
        if self.text.pages.is_empty() || self.text.pages.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::invalid("text.pages", "every page needs at least one line"));
        }
        if self.snake.snakes.len() < crate::consts::SNAKE_COUNT {
            return Err(ConfigError::invalid(
                "snake.snakes",
                format!(
                    "{} snakes required, got {}",
                    crate::consts::SNAKE_COUNT,
                    self.snake.snakes.len()
                ),
            ));
        }
        if self.snake.section_count == 0 {
            return Err(ConfigError::invalid("snake.section_count", "must be at least 1"));
        }
        if self.bite.next_delay_min_ms > self.bite.next_delay_max_ms {
            return Err(ConfigError::invalid(
                "bite.next_delay_min_ms",
                "minimum delay is larger than maximum delay",
            ));
        }
        if self.physics.substeps == 0 {
            return Err(ConfigError::invalid("physics.substeps", "must be at least 1"));
        }
        if self.transition.reveal_ms <= 0.0 {
            return Err(ConfigError::invalid("transition.reveal_ms", "must be positive"));
        }
        Ok(())
    }
}
