//! Particle physics context
//!
//! A small mass-spring system shared by all snakes:
//! - Particles with mass, optionally pinned in place
//! - Damped springs between particle pairs
//! - Inverse-square attractions pulling one particle toward another
//! - Global gravity and drag
//!
//! Time is measured in frames (1.0 per simulation tick) and integrated with
//! 4th-order Runge-Kutta split into a configurable number of sub-steps.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::GEOMETRY_EPSILON;
use crate::settings::PhysicsSettings;

/// Index of a particle in a [`ParticleSystem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticleId(usize);

/// Index of a spring in a [`ParticleSystem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpringId(usize);

/// Index of an attraction in a [`ParticleSystem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttractionId(usize);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    /// Fixed particles are never moved by the integrator
    pub fixed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spring {
    pub a: ParticleId,
    pub b: ParticleId,
    pub strength: f32,
    pub damping: f32,
    pub rest_length: f32,
    pub on: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attraction {
    /// Particle being pulled
    pub a: ParticleId,
    /// Particle pulling
    pub b: ParticleId,
    pub strength: f32,
    /// Distances below this are treated as this distance
    pub min_distance: f32,
    pub on: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    springs: Vec<Spring>,
    attractions: Vec<Attraction>,
    pub gravity: Vec2,
    pub drag: f32,
    substeps: u32,
}

impl ParticleSystem {
    pub fn new(gravity: Vec2, drag: f32, substeps: u32) -> Self {
        Self {
            particles: Vec::new(),
            springs: Vec::new(),
            attractions: Vec::new(),
            gravity,
            drag,
            substeps: substeps.max(1),
        }
    }

    pub fn from_settings(settings: &PhysicsSettings) -> Self {
        Self::new(Vec2::from(settings.gravity), settings.drag, settings.substeps)
    }

    pub fn make_particle(&mut self, mass: f32, position: Vec2) -> ParticleId {
        self.particles.push(Particle {
            position,
            velocity: Vec2::ZERO,
            mass,
            fixed: false,
        });
        ParticleId(self.particles.len() - 1)
    }

    pub fn make_spring(
        &mut self,
        a: ParticleId,
        b: ParticleId,
        strength: f32,
        damping: f32,
        rest_length: f32,
    ) -> SpringId {
        self.springs.push(Spring {
            a,
            b,
            strength,
            damping,
            rest_length,
            on: true,
        });
        SpringId(self.springs.len() - 1)
    }

    pub fn make_attraction(
        &mut self,
        a: ParticleId,
        b: ParticleId,
        strength: f32,
        min_distance: f32,
    ) -> AttractionId {
        self.attractions.push(Attraction {
            a,
            b,
            strength,
            min_distance,
            on: true,
        });
        AttractionId(self.attractions.len() - 1)
    }

    #[inline]
    pub fn particle(&self, id: ParticleId) -> &Particle {
        &self.particles[id.0]
    }

    #[inline]
    pub fn particle_mut(&mut self, id: ParticleId) -> &mut Particle {
        &mut self.particles[id.0]
    }

    #[inline]
    pub fn spring(&self, id: SpringId) -> &Spring {
        &self.springs[id.0]
    }

    #[inline]
    pub fn spring_mut(&mut self, id: SpringId) -> &mut Spring {
        &mut self.springs[id.0]
    }

    #[inline]
    pub fn attraction(&self, id: AttractionId) -> &Attraction {
        &self.attractions[id.0]
    }

    #[inline]
    pub fn attraction_mut(&mut self, id: AttractionId) -> &mut Attraction {
        &mut self.attractions[id.0]
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Advance the system by `frames` frames
    pub fn tick(&mut self, frames: f32) {
        if frames <= 0.0 || self.particles.is_empty() {
            return;
        }
        let h = frames / self.substeps as f32;
        for _ in 0..self.substeps {
            self.rk4_step(h);
        }
    }

    fn rk4_step(&mut self, h: f32) {
        let x0: Vec<Vec2> = self.particles.iter().map(|p| p.position).collect();
        let v0: Vec<Vec2> = self.particles.iter().map(|p| p.velocity).collect();

        let k1a = self.accelerations(&x0, &v0);
        let k1v = v0.clone();

        let (x1, v1) = offset_state(&x0, &v0, &k1v, &k1a, h / 2.0);
        let k2a = self.accelerations(&x1, &v1);
        let k2v = v1;

        let (x2, v2) = offset_state(&x0, &v0, &k2v, &k2a, h / 2.0);
        let k3a = self.accelerations(&x2, &v2);
        let k3v = v2;

        let (x3, v3) = offset_state(&x0, &v0, &k3v, &k3a, h);
        let k4a = self.accelerations(&x3, &v3);
        let k4v = v3;

        for (i, p) in self.particles.iter_mut().enumerate() {
            if p.fixed {
                p.velocity = Vec2::ZERO;
                continue;
            }
            p.position = x0[i] + (k1v[i] + 2.0 * k2v[i] + 2.0 * k3v[i] + k4v[i]) * (h / 6.0);
            p.velocity = v0[i] + (k1a[i] + 2.0 * k2a[i] + 2.0 * k3a[i] + k4a[i]) * (h / 6.0);
        }
    }

    /// Acceleration of every particle for a trial state
    fn accelerations(&self, pos: &[Vec2], vel: &[Vec2]) -> Vec<Vec2> {
        let mut forces = vec![Vec2::ZERO; self.particles.len()];

        for (i, p) in self.particles.iter().enumerate() {
            if p.fixed {
                continue;
            }
            forces[i] += self.gravity * p.mass - vel[i] * self.drag;
        }

        for s in self.springs.iter().filter(|s| s.on) {
            let delta = pos[s.a.0] - pos[s.b.0];
            let len = delta.length();
            if len < GEOMETRY_EPSILON {
                continue;
            }
            let dir = delta / len;
            let relative_vel = vel[s.a.0] - vel[s.b.0];
            let magnitude = -(len - s.rest_length) * s.strength - s.damping * dir.dot(relative_vel);
            let force = dir * magnitude;
            forces[s.a.0] += force;
            forces[s.b.0] -= force;
        }

        for at in self.attractions.iter().filter(|at| at.on) {
            let delta = pos[at.b.0] - pos[at.a.0];
            let dist_sq = delta.length_squared();
            if dist_sq < GEOMETRY_EPSILON {
                continue;
            }
            let dir = delta / dist_sq.sqrt();
            let ma = self.particles[at.a.0].mass;
            let mb = self.particles[at.b.0].mass;
            let magnitude =
                at.strength * ma * mb / dist_sq.max(at.min_distance * at.min_distance);
            let force = dir * magnitude;
            forces[at.a.0] += force;
            forces[at.b.0] -= force;
        }

        self.particles
            .iter()
            .zip(forces)
            .map(|(p, f)| {
                if p.fixed || p.mass <= 0.0 {
                    Vec2::ZERO
                } else {
                    f / p.mass
                }
            })
            .collect()
    }
}

fn offset_state(
    x0: &[Vec2],
    v0: &[Vec2],
    dx: &[Vec2],
    dv: &[Vec2],
    h: f32,
) -> (Vec<Vec2>, Vec<Vec2>) {
    let x = x0.iter().zip(dx).map(|(x, d)| *x + *d * h).collect();
    let v = v0.iter().zip(dv).map(|(v, d)| *v + *d * h).collect();
    (x, v)
}
