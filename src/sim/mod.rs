//! Deterministic simulation module
//!
//! All interaction and animation rules live here. This module must stay
//! deterministic for a given seed and input sequence:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (touches by id, snakes by quadrant, words by
//!   page/line/position)
//! - No rendering or platform dependencies

pub mod path;
pub mod physics;
pub mod ripple;
pub mod snake;
pub mod state;
pub mod tick;
pub mod touch;
pub mod transition;
pub mod word;

pub use path::{BezierPath, IdleAnimator, cubic_bezier};
pub use physics::{Particle, ParticleId, ParticleSystem};
pub use ripple::{Ripple, RippleField};
pub use snake::{Bite, Letter, Snake, SnakeEvent, SnakeState};
pub use state::{Installation, SimEvent};
pub use tick::{TickInput, tick};
pub use touch::{Touch, TouchEvent, TouchId, TouchSet, select_biting_touch};
pub use transition::{PageTransition, TransitionPhase};
pub use word::{Fade, FadeState, Line, Page, Word, WordRef};
