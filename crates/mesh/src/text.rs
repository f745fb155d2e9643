//! Glyph layout against a 16x16 character atlas.
//!
//! Every character, line breaks included, owns four vertices and six indices,
//! so a string of `n` characters always yields `4n` vertices and `6n`
//! indices. Line-break slots collapse to a single point and draw nothing.

use glam::{Vec2, Vec3};

pub const GLYPHS_PER_ROW: u32 = 16;
pub const VERTS_PER_GLYPH: usize = 4;
pub const INDICES_PER_GLYPH: usize = 6;

const CELL: f32 = 1.0 / GLYPHS_PER_ROW as f32;
/// Atlas slot used for characters outside the first 256 code points.
const FALLBACK_GLYPH: u32 = '?' as u32;

pub fn is_line_break(ch: char) -> bool {
    ch == '\n'
}

/// Atlas texture coordinates of the four corners of `ch`.
pub fn glyph_uvs(ch: char) -> [Vec2; 4] {
    let code = match ch as u32 {
        c if c < GLYPHS_PER_ROW * GLYPHS_PER_ROW => c,
        _ => FALLBACK_GLYPH,
    };
    let column = code % GLYPHS_PER_ROW;
    let row = code / GLYPHS_PER_ROW;
    let s = column as f32 * CELL;
    let t = (row + 1) as f32 * CELL;
    [
        Vec2::new(s, 1.0 - t),
        Vec2::new(s, 1.0 - t + CELL),
        Vec2::new(s + CELL, 1.0 - t),
        Vec2::new(s + CELL, 1.0 - t + CELL),
    ]
}

/// Corner positions of the glyph cell at `col`, `row`. Rows run downward.
pub fn glyph_quad(x: f32, y: f32, size: f32, col: u32, row: u32) -> [Vec3; 4] {
    let left = x + col as f32 * size;
    let bottom = y - row as f32 * size;
    [
        Vec3::new(left, bottom, 0.0),
        Vec3::new(left, bottom + size, 0.0),
        Vec3::new(left + size, bottom, 0.0),
        Vec3::new(left + size, bottom + size, 0.0),
    ]
}

/// Index pattern of glyph slot `slot`.
pub fn glyph_indices(slot: usize) -> [u32; INDICES_PER_GLYPH] {
    let o = (slot * VERTS_PER_GLYPH) as u32;
    [o, o + 2, o + 1, o + 1, o + 2, o + 3]
}

/// Positions and texture coordinates for every slot of `text`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphLayout {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
}

impl GlyphLayout {
    pub fn num_glyphs(&self) -> usize {
        self.positions.len() / VERTS_PER_GLYPH
    }

    pub fn indices(&self) -> Vec<u32> {
        (0..self.num_glyphs()).flat_map(glyph_indices).collect()
    }
}

pub fn layout_text(x: f32, y: f32, size: f32, text: &str) -> GlyphLayout {
    let count = text.chars().count();
    let mut layout = GlyphLayout {
        positions: Vec::with_capacity(count * VERTS_PER_GLYPH),
        uvs: Vec::with_capacity(count * VERTS_PER_GLYPH),
    };
    let (mut col, mut row) = (0u32, 0u32);
    for ch in text.chars() {
        if is_line_break(ch) {
            let [origin, ..] = glyph_quad(x, y, size, col, row);
            layout.positions.extend([origin; VERTS_PER_GLYPH]);
            layout.uvs.extend([Vec2::ZERO; VERTS_PER_GLYPH]);
            col = 0;
            row += 1;
            continue;
        }
        layout.positions.extend(glyph_quad(x, y, size, col, row));
        layout.uvs.extend(glyph_uvs(ch));
        col += 1;
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uv_of_a() {
        // 'A' = 65: column 1, row 4
        let uv = glyph_uvs('A');
        let s = 1.0 / 16.0;
        let t = 5.0 / 16.0;
        assert_eq!(uv[0], Vec2::new(s, 1.0 - t));
        assert_eq!(uv[1], Vec2::new(s, 1.0 - t + 1.0 / 16.0));
        assert_eq!(uv[2], Vec2::new(s + 1.0 / 16.0, 1.0 - t));
        assert_eq!(uv[3], Vec2::new(s + 1.0 / 16.0, 1.0 - t + 1.0 / 16.0));
    }

    #[test]
    fn adjacent_glyphs_differ_by_one_cell() {
        let a = glyph_uvs('A');
        let b = glyph_uvs('B');
        assert!((b[0].x - a[0].x - 1.0 / 16.0).abs() < 1e-6);
        assert_eq!(a[0].y, b[0].y);
    }

    #[test]
    fn wide_chars_fall_back() {
        assert_eq!(glyph_uvs('\u{263A}'), glyph_uvs('?'));
    }

    #[test]
    fn layout_ab() {
        let layout = layout_text(0.0, 0.0, 0.1, "AB");
        assert_eq!(layout.positions.len(), 8);
        assert_eq!(layout.indices(), vec![0, 2, 1, 1, 2, 3, 4, 6, 5, 5, 6, 7]);
        assert_eq!(layout.positions[4], Vec3::new(0.1, 0.0, 0.0));
    }

    #[test]
    fn line_break_moves_down_and_keeps_slot() {
        let layout = layout_text(1.0, 2.0, 0.5, "A\nB");
        assert_eq!(layout.num_glyphs(), 3);
        // break slot is degenerate
        assert!(layout.positions[4..8].iter().all(|p| *p == layout.positions[4]));
        // 'B' starts the next row at the left edge
        assert_eq!(layout.positions[8], Vec3::new(1.0, 1.5, 0.0));
    }

    #[test]
    fn first_vertex_is_origin() {
        let layout = layout_text(-0.5, 0.25, 0.1, "\nx");
        assert_eq!(layout.positions[0], Vec3::new(-0.5, 0.25, 0.0));
    }
}
