//! Per-tick snapshot handed to the renderer
//!
//! The renderer owns glyph outlines and draw calls; it reads positions,
//! opacities and deformation parameters from a [`Scene`] and deforms its
//! rest vertices with [`Word::deform_vertices`](crate::sim::Word::deform_vertices).

use glam::Vec2;
use serde::Serialize;

use crate::Rect;
use crate::sim::{Installation, Ripple, WordRef};

/// A word with non-zero opacity on the shown page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordView {
    pub word: WordRef,
    pub text: String,
    pub anchor: Vec2,
    pub bounds: Rect,
    pub font_size: f32,
    pub opacity: f32,
    pub contraction: f32,
    pub contraction_origin: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetterView {
    pub ch: char,
    pub position: Vec2,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnakeView {
    pub index: usize,
    pub font_size: f32,
    /// Skeleton, for debug drawing
    pub sections: Vec<Vec2>,
    pub letters: Vec<LetterView>,
    /// Attraction target while biting
    pub prey: Option<Vec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub page: usize,
    pub words: Vec<WordView>,
    pub snakes: Vec<SnakeView>,
    pub ripples: Vec<Ripple>,
    pub idle_point: Option<Vec2>,
}

impl Scene {
    pub fn capture(state: &Installation) -> Self {
        let page = state.page_index;
        let words = state.pages[page]
            .lines
            .iter()
            .enumerate()
            .flat_map(|(line, l)| {
                l.words.iter().enumerate().filter(|(_, w)| w.opacity() > 0.0).map(
                    move |(i, w)| WordView {
                        word: WordRef { page, line, word: i },
                        text: w.text.clone(),
                        anchor: w.anchor,
                        bounds: w.bounds,
                        font_size: w.font_size,
                        opacity: w.opacity(),
                        contraction: w.contraction.amount.min(1.0),
                        contraction_origin: w.contraction.origin,
                    },
                )
            })
            .collect();

        let snakes = state
            .snakes
            .iter()
            .map(|s| SnakeView {
                index: s.index,
                font_size: s.font_size,
                sections: s.section_positions(&state.physics),
                letters: s
                    .letters()
                    .iter()
                    .map(|l| LetterView {
                        ch: l.ch,
                        position: l.position,
                        scale: l.scale,
                    })
                    .collect(),
                prey: s.is_biting().then(|| s.prey_position(&state.physics)),
            })
            .collect();

        Self {
            page,
            words,
            snakes,
            ripples: state.ripples.ripples().to_vec(),
            idle_point: state.idle_point,
        }
    }
}
