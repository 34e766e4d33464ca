// SPDX-License-Identifier: GPL-3.0-only

//! Targeting overlay
//!
//! Draws the scan reticle onto a copy of a frame: a circle with a crosshair
//! in the middle, L-shaped brackets at the corners of the circle's bounding
//! square, and a caption in the top-left corner. Everything is drawn in
//! [`overlay::COLOR`] and clipped at the frame edges.
//!
//! # Coordinate System
//!
//! Pixel coordinates are signed so shapes may extend past the frame; only
//! the visible part is written.

mod glyphs;

use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::constants::overlay;

/// Render the targeting overlay onto a copy of `frame`
///
/// The input frame is never modified.
pub fn render(frame: &CameraFrame) -> CameraFrame {
    let mut data = frame.data.clone();
    let mut canvas = Canvas::new(&mut data, frame.width, frame.height);

    let (w, h) = (frame.width as i64, frame.height as i64);
    let (cx, cy) = (w / 2, h / 2);
    let r = w.min(h) / 4;

    canvas.stroke_circle(cx, cy, r, overlay::RETICLE_STROKE as i64);

    let half = r / 2;
    canvas.hline(cx - half, cx + half, cy, overlay::RETICLE_STROKE as i64);
    canvas.vline(cx, cy - half, cy + half, overlay::RETICLE_STROKE as i64);

    draw_brackets(&mut canvas, cx - r, cy - r, cx + r, cy + r);

    let (tx, baseline) = overlay::CAPTION_ORIGIN;
    canvas.text(overlay::CAPTION, tx, baseline, overlay::CAPTION_SCALE);

    frame.with_data(data)
}

/// L-shaped corner brackets around the square (x0, y0)-(x1, y1)
fn draw_brackets(canvas: &mut Canvas<'_>, x0: i64, y0: i64, x1: i64, y1: i64) {
    let arm = overlay::BRACKET_ARM_PX;
    let stroke = overlay::BRACKET_STROKE as i64;

    for (x, y, dx, dy) in [(x0, y0, 1, 1), (x1, y0, -1, 1), (x0, y1, 1, -1), (x1, y1, -1, -1)] {
        let x_end = x + dx * arm;
        let y_end = y + dy * arm;
        canvas.hline(x.min(x_end), x.max(x_end), y, stroke);
        canvas.vline(x, y.min(y_end), y.max(y_end), stroke);
    }
}

/// Mutable view over packed 3-channel pixel data
struct Canvas<'a> {
    data: &'a mut [u8],
    width: i64,
    height: i64,
}

impl<'a> Canvas<'a> {
    fn new(data: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            data,
            width: width as i64,
            height: height as i64,
        }
    }

    /// Set one pixel, ignoring coordinates outside the frame
    fn put(&mut self, x: i64, y: i64) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) as usize * PixelFormat::CHANNELS;
        if let Some(px) = self.data.get_mut(idx..idx + PixelFormat::CHANNELS) {
            px.copy_from_slice(&overlay::COLOR);
        }
    }

    /// Fill the inclusive rectangle (x0, y0)-(x1, y1), clipped
    fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64) {
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.width - 1);
        let y1 = y1.min(self.height - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.put(x, y);
            }
        }
    }

    /// Horizontal line from x0 to x1 centered on row y
    fn hline(&mut self, x0: i64, x1: i64, y: i64, stroke: i64) {
        let top = y - stroke / 2;
        self.fill_rect(x0, top, x1, top + stroke - 1);
    }

    /// Vertical line from y0 to y1 centered on column x
    fn vline(&mut self, x: i64, y0: i64, y1: i64, stroke: i64) {
        let left = x - stroke / 2;
        self.fill_rect(left, y0, left + stroke - 1, y1);
    }

    /// Circle outline of radius r, `stroke` pixels wide straddling the radius
    fn stroke_circle(&mut self, cx: i64, cy: i64, r: i64, stroke: i64) {
        if r <= 0 {
            return;
        }
        let inner = r as f64 - stroke as f64 / 2.0;
        let outer = r as f64 + stroke as f64 / 2.0;
        let extent = r + stroke;

        let y_range = (cy - extent).max(0)..=(cy + extent).min(self.height - 1);
        let x_range = (cx - extent).max(0)..=(cx + extent).min(self.width - 1);

        for y in y_range {
            for x in x_range.clone() {
                let dx = (x - cx) as f64;
                let dy = (y - cy) as f64;
                let d = (dx * dx + dy * dy).sqrt();
                if d >= inner && d < outer {
                    self.put(x, y);
                }
            }
        }
    }

    /// Draw `text` with its left edge at `x` and its last glyph row just
    /// above `baseline`, each glyph pixel scaled to a `scale`-sized block
    fn text(&mut self, text: &str, x: i64, baseline: i64, scale: i64) {
        let top = baseline - glyphs::GLYPH_HEIGHT * scale;
        let advance = (glyphs::GLYPH_WIDTH + glyphs::GLYPH_SPACING) * scale;

        for (i, c) in text.chars().enumerate() {
            let Some(glyph) = glyphs::glyph(c) else {
                continue;
            };
            let gx = x + i as i64 * advance;
            for row in 0..glyphs::GLYPH_HEIGHT {
                for col in 0..glyphs::GLYPH_WIDTH {
                    if glyphs::is_set(glyph, col, row) {
                        let px = gx + col * scale;
                        let py = top + row * scale;
                        self.fill_rect(px, py, px + scale - 1, py + scale - 1);
                    }
                }
            }
        }
    }
}
