//! Rattlesnakes - a touch-reactive text installation
//!
//! Core modules:
//! - `sim`: Interaction and animation engine (snakes, words, ripples, page changes)
//! - `audio`: Sound direction on top of an external audio engine
//! - `layout`: Text measurement seam and a deterministic page layout
//! - `platform`: Touch input plumbing
//! - `renderer`: Data handed to an external renderer each tick
//! - `settings`: Runtime tunables

pub mod audio;
pub mod error;
pub mod layout;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::Settings;

use glam::Vec2;

/// Engine constants (not tunable at runtime)
pub mod consts {
    /// Simulation rate
    pub const TICK_HZ: f32 = 60.0;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / TICK_HZ;
    /// Maximum ticks run per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Number of snakes, one per screen quadrant
    pub const SNAKE_COUNT: usize = 4;

    /// Distance under which a retracting section counts as home
    pub const RETRACT_EPSILON: f32 = 1.0;
    /// Retract speed is expressed per this many milliseconds of elapsed time
    pub const RETRACT_TIME_SCALE_MS: f32 = 100.0;

    /// Lengths below this are treated as zero in force and weight math
    pub const GEOMETRY_EPSILON: f32 = 1.0e-6;
}

/// Axis-aligned rectangle in screen space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin with the given size
    pub fn from_size(size: Vec2) -> Self {
        Self::new(0.0, 0.0, size.x, size.y)
    }

    /// Half-open containment: left/top edges inside, right/bottom edges outside
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.x + self.width && p.y < self.y + self.height
    }

    /// True if the interiors overlap (touching edges do not count)
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 || other.width <= 0.0 || other.height <= 0.0 {
            return false;
        }
        other.x < self.x + self.width
            && other.x + other.width > self.x
            && other.y < self.y + self.height
            && other.y + other.height > self.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Copy moved by an offset
    #[inline]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }
}

/// Convert elapsed seconds to whole frames at the simulation rate
#[inline]
pub fn seconds_to_frames(secs: f32) -> f32 {
    secs * consts::TICK_HZ
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_half_open() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert!(r.contains(Vec2::new(10.0, 20.0)));
        assert!(r.contains(Vec2::new(109.9, 69.9)));
        assert!(!r.contains(Vec2::new(110.0, 30.0)));
        assert!(!r.contains(Vec2::new(50.0, 70.0)));
        assert!(!r.contains(Vec2::new(9.9, 30.0)));
    }

    #[test]
    fn test_rect_intersects() {
        let viewport = Rect::new(0.0, 0.0, 1280.0, 720.0);
        assert!(viewport.intersects(&Rect::new(-10.0, -10.0, 20.0, 20.0)));
        // Touching the edge is not an overlap
        assert!(!viewport.intersects(&Rect::new(-20.0, 0.0, 20.0, 20.0)));
        assert!(!viewport.intersects(&Rect::new(0.0, 720.0, 20.0, 20.0)));
        // Degenerate rectangles never intersect
        assert!(!viewport.intersects(&Rect::new(5.0, 5.0, 0.0, 10.0)));
    }

    #[test]
    fn test_rect_center_and_translate() {
        let r = Rect::new(0.0, 0.0, 40.0, 20.0).translated(Vec2::new(10.0, 5.0));
        assert_eq!(r.center(), Vec2::new(30.0, 15.0));
    }
}
