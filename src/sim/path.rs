//! Idle wander path
//!
//! When nobody has touched the surface for a while, a point travels along a
//! random cubic Bezier from above the viewport to below it (or back) and
//! softly highlights the words it passes.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::settings::IdleSettings;

/// Evaluate a cubic Bezier at `t` in [0, 1]
pub fn cubic_bezier(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathDirection {
    Forward,
    Backward,
}

/// Four fixed control points and a moving parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BezierPath {
    points: [Vec2; 4],
    t: f32,
    direction: PathDirection,
    speed: f32,
}

impl BezierPath {
    pub fn new(points: [Vec2; 4], speed: f32) -> Self {
        Self {
            points,
            t: 0.0,
            direction: PathDirection::Forward,
            speed,
        }
    }

    pub fn reverse(&mut self) {
        self.direction = PathDirection::Backward;
    }

    pub fn update(&mut self) {
        if self.is_done() {
            return;
        }
        self.t = (self.t + self.speed).min(1.0);
    }

    pub fn is_done(&self) -> bool {
        self.t >= 1.0
    }

    /// Jump to the end of the path
    pub fn end(&mut self) {
        self.t = 1.0;
    }

    pub fn t(&self) -> f32 {
        self.t
    }

    pub fn direction(&self) -> PathDirection {
        self.direction
    }

    pub fn points(&self) -> &[Vec2; 4] {
        &self.points
    }

    /// Current traced point
    pub fn point(&self) -> Vec2 {
        let t = match self.direction {
            PathDirection::Forward => self.t,
            PathDirection::Backward => 1.0 - self.t,
        };
        let [p0, p1, p2, p3] = self.points;
        cubic_bezier(p0, p1, p2, p3, t)
    }
}

/// Runs the wander path when the surface is idle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleAnimator {
    path: BezierPath,
    /// When the current cycle was set up
    last_cycle_ms: u64,
    settings: IdleSettings,
    viewport: Vec2,
}

impl IdleAnimator {
    pub fn new(settings: &IdleSettings, viewport: Vec2, now_ms: u64, rng: &mut Pcg32) -> Self {
        let mut idle = Self {
            path: BezierPath::new([Vec2::ZERO; 4], settings.path_speed),
            last_cycle_ms: now_ms,
            settings: settings.clone(),
            viewport,
        };
        idle.reset(now_ms, rng);
        idle
    }

    /// Fresh random path from above the top edge to below the bottom edge
    pub fn reset(&mut self, now_ms: u64, rng: &mut Pcg32) {
        self.last_cycle_ms = now_ms;
        let (w, h) = (self.viewport.x, self.viewport.y);
        let jitter = self.settings.control_jitter;
        let sx = rng.random_range(0.0..w);
        let ex = rng.random_range(0.0..w);
        let mid = (sx + ex) / 2.0;
        let mut offset = || {
            if jitter > 0.0 {
                rng.random_range(-jitter..jitter)
            } else {
                0.0
            }
        };
        let c1 = Vec2::new(mid + offset(), h / 3.0);
        let c2 = Vec2::new(mid + offset(), h * 2.0 / 3.0);
        self.path = BezierPath::new(
            [Vec2::new(sx, -10.0), c1, c2, Vec2::new(ex, h + 100.0)],
            self.settings.path_speed,
        );
        if rng.random_bool(0.5) {
            self.path.reverse();
        }
    }

    /// Finish the current cycle early (touch arrived or page is changing)
    pub fn end(&mut self) {
        self.path.end();
    }

    pub fn path(&self) -> &BezierPath {
        &self.path
    }

    /// Advance one tick. Returns the point to highlight, if the wander is
    /// running and inside the viewport.
    pub fn step(
        &mut self,
        now_ms: u64,
        last_touch_ms: u64,
        touched: bool,
        rng: &mut Pcg32,
    ) -> Option<Vec2> {
        if touched
            || now_ms.saturating_sub(last_touch_ms) < self.settings.idle_after_ms
            || now_ms.saturating_sub(self.last_cycle_ms) < self.settings.interval_ms
        {
            return None;
        }
        self.path.update();
        if self.path.is_done() {
            self.reset(now_ms, rng);
        }
        let p = self.path.point();
        let inside = (0.0..=self.viewport.x).contains(&p.x) && (0.0..=self.viewport.y).contains(&p.y);
        inside.then_some(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    #[test]
    fn test_bezier_endpoints() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 50.0),
            Vec2::new(90.0, 50.0),
            Vec2::new(100.0, 0.0),
        ];
        assert_eq!(cubic_bezier(pts[0], pts[1], pts[2], pts[3], 0.0), pts[0]);
        assert_eq!(cubic_bezier(pts[0], pts[1], pts[2], pts[3], 1.0), pts[3]);
        let mid = cubic_bezier(pts[0], pts[1], pts[2], pts[3], 0.5);
        assert!((mid.x - 50.0).abs() < 1e-4);
        assert!((mid.y - 37.5).abs() < 1e-4);
    }

    #[test]
    fn test_backward_path_starts_at_end() {
        let pts = [Vec2::ZERO, Vec2::X, Vec2::Y, Vec2::ONE];
        let mut path = BezierPath::new(pts, 0.25);
        path.reverse();
        assert_eq!(path.point(), Vec2::ONE);
        for _ in 0..10 {
            path.update();
        }
        assert!(path.is_done());
        assert_eq!(path.t(), 1.0);
        assert_eq!(path.point(), Vec2::ZERO);
    }

    #[test]
    fn test_idle_waits_for_thresholds() {
        let settings = IdleSettings::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut idle = IdleAnimator::new(&settings, VIEWPORT, 0, &mut rng);
        // Too soon after the last touch
        assert!(idle.step(5_000, 0, false, &mut rng).is_none());
        // Touches block it
        assert!(idle.step(20_000, 0, true, &mut rng).is_none());
        assert_eq!(idle.path().t(), 0.0);
        idle.step(20_000, 0, false, &mut rng);
        assert!(idle.path().t() > 0.0);
    }

    #[test]
    fn test_idle_reset_after_end_pauses_for_interval() {
        let settings = IdleSettings::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut idle = IdleAnimator::new(&settings, VIEWPORT, 0, &mut rng);
        idle.end();
        idle.step(20_000, 0, false, &mut rng);
        assert_eq!(idle.path().t(), 0.0);
        // Within the interval the new path does not move
        idle.step(21_000, 0, false, &mut rng);
        assert_eq!(idle.path().t(), 0.0);
        idle.step(25_000, 0, false, &mut rng);
        assert!(idle.path().t() > 0.0);
    }

    #[test]
    fn test_idle_path_crosses_viewport() {
        let settings = IdleSettings::default();
        let mut rng = Pcg32::seed_from_u64(99);
        let idle = IdleAnimator::new(&settings, VIEWPORT, 0, &mut rng);
        let [start, _, _, end] = *idle.path().points();
        assert_eq!(start.y, -10.0);
        assert_eq!(end.y, 820.0);
        assert!((0.0..1280.0).contains(&start.x));
    }

    proptest! {
        #[test]
        fn prop_bezier_stays_in_hull(t in 0.0f32..=1.0, xs in proptest::array::uniform4(-500.0f32..500.0)) {
            let pts = xs.map(|x| Vec2::new(x, -x));
            let p = cubic_bezier(pts[0], pts[1], pts[2], pts[3], t);
            let min = xs.iter().cloned().fold(f32::INFINITY, f32::min);
            let max = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            prop_assert!(p.x >= min - 1e-2 && p.x <= max + 1e-2);
        }
    }
}
