//! Text measurement and page layout
//!
//! Font loading is external; the engine only needs advance widths and
//! vertical metrics, supplied through [`TextLayout`].

use glam::Vec2;

use crate::Rect;
use crate::settings::TextSettings;
use crate::sim::word::{Line, Page, Word};

/// Font sizes tried when fitting a line stop here
const MAX_FONT_SIZE: u32 = 512;

/// Font metrics collaborator
pub trait TextLayout {
    /// Horizontal advance of `text` at font `size`
    fn advance(&self, text: &str, size: f32) -> f32;
    /// Distance from the baseline to the top of the tallest glyph
    fn ascent(&self, size: f32) -> f32;
    /// Distance from the baseline to the bottom of the lowest glyph
    fn descent(&self, size: f32) -> f32;

    fn line_height(&self, size: f32) -> f32 {
        self.ascent(size) + self.descent(size)
    }
}

/// Monospaced metrics proportional to the font size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvanceLayout {
    pub advance_factor: f32,
    pub ascent_factor: f32,
    pub descent_factor: f32,
}

impl Default for FixedAdvanceLayout {
    fn default() -> Self {
        Self {
            advance_factor: 0.55,
            ascent_factor: 0.8,
            descent_factor: 0.2,
        }
    }
}

impl TextLayout for FixedAdvanceLayout {
    fn advance(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * self.advance_factor * size
    }

    fn ascent(&self, size: f32) -> f32 {
        self.ascent_factor * size
    }

    fn descent(&self, size: f32) -> f32 {
        self.descent_factor * size
    }
}

/// Largest whole font size at which `line` is narrower than `available`
pub fn fit_font_size(layout: &dyn TextLayout, line: &str, available: f32, min_size: f32) -> f32 {
    let mut size = min_size.max(1.0).floor() as u32;
    while size < MAX_FONT_SIZE && layout.advance(line, (size + 1) as f32) < available {
        size += 1;
    }
    size as f32
}

/// Lay out one page: each line is sized to fill the width, then justified.
///
/// Word bounds reach half a gap into the neighbouring spaces and half the
/// line's extra spacing above and below, so the hit boxes tile the page.
pub fn layout_page(
    layout: &dyn TextLayout,
    lines: &[String],
    spacings: &[f32],
    viewport: Vec2,
    settings: &TextSettings,
) -> Page {
    let available = viewport.x - settings.horizontal_margin * 2.0;
    let mut y = settings.vertical_margin;
    let mut page = Page::default();

    for (i, text) in lines.iter().enumerate() {
        let size = fit_font_size(layout, text, available, settings.min_font_size);
        let ascent = layout.ascent(size);
        let height = layout.line_height(size);
        let spacing = spacings.get(i).copied();

        let pieces: Vec<&str> = text.split(' ').collect();
        let gap = if pieces.len() > 1 {
            let line_width = layout.advance(text, size);
            (available - line_width) / (pieces.len() - 1) as f32 + layout.advance(" ", size)
        } else {
            0.0
        };
        let (pad_top, pad_height) = match spacing {
            Some(s) => (s / 2.0 + 1.0, s + 2.0),
            None => (0.0, 0.0),
        };

        let mut x = settings.horizontal_margin;
        let mut line = Line::default();
        for piece in pieces {
            let width = layout.advance(piece, size);
            let bounds = Rect::new(x - gap / 2.0, y - pad_top, width + gap, height + pad_height);
            line.words.push(Word::new(piece, bounds, Vec2::new(x, y + ascent), size));
            x += width + gap;
        }
        page.lines.push(line);

        y += height + spacing.unwrap_or(0.0);
    }

    page
}
