//! Renderer hand-off
//!
//! Drawing is done by an external renderer. This module defines what it
//! receives each tick: a [`Scene`] snapshot and the vertex layout used for
//! deformed glyph outlines.

pub mod scene;
pub mod vertex;

pub use scene::{LetterView, Scene, SnakeView, WordView};
pub use vertex::GlyphVertex;
