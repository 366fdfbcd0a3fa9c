//! Vertex types handed to the renderer

use bytemuck::{Pod, Zeroable};

/// Glyph outline vertex, relative to the word's baseline anchor.
/// `z` carries ripple depth.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 3],
}

impl GlyphVertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_casts_to_bytes() {
        let verts = [GlyphVertex::new(1.0, 2.0, 3.0), GlyphVertex::new(4.0, 5.0, 6.0)];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), 2 * 3 * std::mem::size_of::<f32>());
    }
}
