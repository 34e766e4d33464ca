// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for raw V4L2 capture buffers
//!
//! Everything here produces tightly packed 3-channel data suitable for
//! [`CameraFrame`](super::types::CameraFrame).

/// Copy `height` rows of `row_bytes` each out of a buffer whose rows are
/// `stride` bytes apart, dropping any padding.
///
/// Rows that would run past the end of `data` are skipped.
pub fn strip_stride(data: &[u8], row_bytes: usize, stride: usize, height: usize) -> Vec<u8> {
    if stride == row_bytes {
        let len = (row_bytes * height).min(data.len());
        return data[..len].to_vec();
    }

    let mut result = Vec::with_capacity(row_bytes * height);
    for y in 0..height {
        let row_start = y * stride;
        let row_end = row_start + row_bytes;
        if row_end <= data.len() {
            result.extend_from_slice(&data[row_start..row_end]);
        }
    }
    result
}

/// Convert YUYV (YUV 4:2:2) to packed RGB
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients. `data` must already be stride-free.
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            if rgb.len() >= pixel_count * 3 {
                break;
            }
            rgb.push((y + 1.402 * v).clamp(0.0, 255.0) as u8);
            rgb.push((y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8);
            rgb.push((y + 1.772 * u).clamp(0.0, 255.0) as u8);
        }
    }

    rgb
}
