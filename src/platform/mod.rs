//! Platform abstraction layer
//!
//! Handles host-side plumbing the simulation does not know about:
//! - Touch events arriving from other threads
//! - Turning host frame times into fixed simulation ticks

pub mod touch;

pub use touch::{TouchChannel, TouchSender};

use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Accumulates host frame time and hands out whole simulation ticks
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `dt` seconds of host time; returns how many ticks to run.
    /// Runs at most [`MAX_SUBSTEPS`] and drops the backlog beyond that.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut ticks = 0;
        while self.accumulator >= SIM_DT && ticks < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            ticks += 1;
        }
        if ticks == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        ticks
    }

    /// Fraction of a tick left over, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / SIM_DT
    }
}
