// SPDX-License-Identifier: GPL-3.0-only

//! 5x7 bitmap glyphs for the overlay caption
//!
//! Only the characters the caption needs are defined. Each row is 5 bits,
//! most significant bit on the left.

pub const GLYPH_WIDTH: i64 = 5;
pub const GLYPH_HEIGHT: i64 = 7;

/// Horizontal gap between glyphs, in glyph pixels
pub const GLYPH_SPACING: i64 = 1;

pub type Glyph = [u8; GLYPH_HEIGHT as usize];

const SPACE: Glyph = [0; 7];

/// Bitmap for `c`, or `None` when the font has no glyph for it
pub fn glyph(c: char) -> Option<&'static Glyph> {
    let glyph: &'static Glyph = match c {
        ' ' => &SPACE,
        'C' => &[0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'Q' => &[0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => &[0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => &[0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'a' => &[0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111],
        'c' => &[0b00000, 0b00000, 0b01110, 0b10000, 0b10000, 0b10001, 0b01110],
        'd' => &[0b00001, 0b00001, 0b01101, 0b10011, 0b10001, 0b10001, 0b01111],
        'e' => &[0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110],
        'n' => &[0b00000, 0b00000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
        'o' => &[0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110],
        _ => return None,
    };
    Some(glyph)
}

/// Whether the glyph pixel at (col, row) is set
pub fn is_set(glyph: &Glyph, col: i64, row: i64) -> bool {
    if !(0..GLYPH_WIDTH).contains(&col) || !(0..GLYPH_HEIGHT).contains(&row) {
        return false;
    }
    glyph[row as usize] & (1 << (GLYPH_WIDTH - 1 - col)) != 0
}
