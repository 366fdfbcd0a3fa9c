//! Expanding ripples spawned where bites land

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::settings::RippleSettings;

/// One growing circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ripple {
    pub center: Vec2,
    pub radius: f32,
    /// Growth per tick
    pub speed: f32,
}

impl Ripple {
    pub fn grow(&mut self) {
        self.radius += self.speed;
    }

    /// True once the ripple is larger than the viewport diagonal
    pub fn is_expired(&self, viewport: Vec2) -> bool {
        self.radius * self.radius > viewport.length_squared()
    }
}

/// All live ripples plus the shape of their displacement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RippleField {
    ripples: Vec<Ripple>,
    viewport: Vec2,
    settings: RippleSettings,
}

impl RippleField {
    pub fn new(settings: &RippleSettings, viewport: Vec2) -> Self {
        Self {
            ripples: Vec::new(),
            viewport,
            settings: settings.clone(),
        }
    }

    /// Start a ripple at the base radius with a randomized growth speed
    pub fn spawn(&mut self, center: Vec2, rng: &mut Pcg32) -> Ripple {
        let jitter = if self.settings.speed_jitter > 0 {
            rng.random_range(0..self.settings.speed_jitter) as f32
        } else {
            0.0
        };
        let ripple = Ripple {
            center,
            radius: self.settings.base_radius,
            speed: self.settings.base_speed + jitter,
        };
        self.ripples.push(ripple);
        log::debug!("Ripple at ({:.0}, {:.0}) speed {}", center.x, center.y, ripple.speed);
        ripple
    }

    /// Grow every ripple and drop the ones that left the viewport
    pub fn update(&mut self) {
        let viewport = self.viewport;
        for r in &mut self.ripples {
            r.grow();
        }
        self.ripples.retain(|r| !r.is_expired(viewport));
    }

    pub fn ripples(&self) -> &[Ripple] {
        &self.ripples
    }

    pub fn is_empty(&self) -> bool {
        self.ripples.is_empty()
    }

    /// Summed depth offset at an absolute screen point
    pub fn depth_at(&self, point: Vec2) -> f32 {
        let RippleSettings {
            length,
            cycles,
            amplitude,
            ..
        } = self.settings;
        if length <= 0.0 {
            return 0.0;
        }
        self.ripples
            .iter()
            .map(|r| {
                let dist = (point.distance(r.center) - r.radius).abs();
                if dist < length {
                    (dist / length * cycles * std::f32::consts::TAU).sin()
                        * amplitude
                        * (1.0 - dist / length)
                } else {
                    0.0
                }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn field() -> RippleField {
        RippleField::new(&RippleSettings::default(), Vec2::new(1280.0, 720.0))
    }

    #[test]
    fn test_spawn_uses_base_radius_and_speed_range() {
        let mut f = field();
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..50 {
            let r = f.spawn(Vec2::new(100.0, 100.0), &mut rng);
            assert_eq!(r.radius, 100.0);
            assert!(r.speed >= 10.0 && r.speed < 26.0);
        }
    }

    #[test]
    fn test_ripple_removed_past_diagonal() {
        let mut f = field();
        let mut rng = Pcg32::seed_from_u64(2);
        f.spawn(Vec2::new(640.0, 360.0), &mut rng);
        let diagonal_sq = 1280.0f32 * 1280.0 + 720.0 * 720.0;
        let mut last = 0.0;
        for _ in 0..1000 {
            if f.is_empty() {
                break;
            }
            last = f.ripples()[0].radius;
            assert!(last * last <= diagonal_sq);
            f.update();
        }
        assert!(f.is_empty());
        assert!(last > 0.0);
    }

    #[test]
    fn test_depth_zero_far_from_edge() {
        let mut f = field();
        let mut rng = Pcg32::seed_from_u64(3);
        f.spawn(Vec2::ZERO, &mut rng);
        // Exactly on the edge the sine term is zero
        assert!(f.depth_at(Vec2::new(100.0, 0.0)).abs() < 1e-3);
        assert_eq!(f.depth_at(Vec2::new(1000.0, 0.0)), 0.0);
        assert!(f.depth_at(Vec2::new(200.0, 0.0)).abs() > 1.0);
    }

    proptest! {
        #[test]
        fn prop_radius_never_shrinks(seed in any::<u64>(), x in 0.0f32..1280.0, y in 0.0f32..720.0) {
            let mut f = field();
            let mut rng = Pcg32::seed_from_u64(seed);
            f.spawn(Vec2::new(x, y), &mut rng);
            let mut prev = f.ripples()[0].radius;
            while !f.is_empty() {
                f.update();
                if let Some(r) = f.ripples().first() {
                    prop_assert!(r.radius >= prev);
                    prev = r.radius;
                }
            }
        }
    }
}
