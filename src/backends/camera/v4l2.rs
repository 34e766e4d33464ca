// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 colour capture
//!
//! Opens `/dev/videoN` with the v4l crate and streams memory-mapped buffers.
//! YUYV, RGB3, BGR3 and MJPG capture formats are converted to packed
//! 3-channel frames.

use super::format_converters::{strip_stride, yuyv_to_rgb};
use super::types::*;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Number of memory-mapped buffers queued with the driver
const STREAM_BUFFERS: u32 = 4;

/// Capture encodings this backend knows how to convert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureEncoding {
    Yuyv,
    Rgb,
    Bgr,
    Mjpeg,
}

impl CaptureEncoding {
    fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"YUYV" => Some(Self::Yuyv),
            b"RGB3" => Some(Self::Rgb),
            b"BGR3" => Some(Self::Bgr),
            b"MJPG" => Some(Self::Mjpeg),
            _ => None,
        }
    }

    fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Yuyv => 2,
            Self::Rgb | Self::Bgr => 3,
            Self::Mjpeg => 0,
        }
    }
}

/// V4L2 camera backend
///
/// Requests the configured resolution in YUYV; drivers are free to answer
/// with a different size or format, which is accepted as long as it is one
/// of the supported encodings.
#[derive(Debug, Clone)]
pub struct V4l2Backend {
    width: u32,
    height: u32,
}

impl V4l2Backend {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for V4l2Backend {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_CAPTURE_WIDTH,
            crate::constants::DEFAULT_CAPTURE_HEIGHT,
        )
    }
}

impl CameraBackend for V4l2Backend {
    fn open(&self, index: u32) -> BackendResult<CameraHandle> {
        let source = V4l2Source::open(index, self.width, self.height)?;
        Ok(Box::new(source))
    }

    fn name(&self) -> &'static str {
        "v4l2"
    }
}

/// An open, streaming V4L2 device
///
/// Field order matters: the stream is dropped (streaming stopped, buffers
/// unmapped) before the device file is closed.
struct V4l2Source {
    stream: MmapStream<'static>,
    _device: Device,
    index: u32,
    format: Format,
    encoding: CaptureEncoding,
    frame_count: u64,
}

impl V4l2Source {
    fn open(index: u32, width: u32, height: u32) -> BackendResult<Self> {
        let open_failed = |reason: String| CameraError::OpenFailed { index, reason };

        info!(index, width, height, "Opening V4L2 device");

        let device = Device::new(index as usize).map_err(|e| open_failed(e.to_string()))?;

        let requested = Format::new(width, height, FourCC::new(b"YUYV"));
        let format = match device.set_format(&requested) {
            Ok(format) => format,
            Err(e) => {
                warn!(error = %e, "Could not set format, using current device format");
                device.format().map_err(|e| open_failed(e.to_string()))?
            }
        };

        let encoding = CaptureEncoding::from_fourcc(format.fourcc).ok_or_else(|| {
            open_failed(format!("unsupported pixel format {}", format.fourcc))
        })?;

        info!(
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            stride = format.stride,
            "Negotiated V4L2 format"
        );

        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, STREAM_BUFFERS)
            .map_err(|e| open_failed(format!("failed to create buffer stream: {}", e)))?;

        Ok(Self {
            stream,
            _device: device,
            index,
            format,
            encoding,
            frame_count: 0,
        })
    }

    fn convert(&self, buf: &[u8], captured_at: Instant) -> BackendResult<CameraFrame> {
        let width = self.format.width;
        let height = self.format.height;
        let row_bytes = width as usize * self.encoding.bytes_per_pixel();
        let stride = (self.format.stride as usize).max(row_bytes);

        let (data, pixel_format) = match self.encoding {
            CaptureEncoding::Mjpeg => {
                let image = image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg)
                    .map_err(|e| CameraError::ReadFailed(format!("MJPEG decode failed: {}", e)))?;
                return Ok(CameraFrame::from_rgb_image(image.to_rgb8(), captured_at));
            }
            CaptureEncoding::Yuyv => {
                let packed = strip_stride(buf, row_bytes, stride, height as usize);
                (yuyv_to_rgb(&packed, width, height), PixelFormat::RGB24)
            }
            CaptureEncoding::Rgb => (
                strip_stride(buf, row_bytes, stride, height as usize),
                PixelFormat::RGB24,
            ),
            CaptureEncoding::Bgr => (
                strip_stride(buf, row_bytes, stride, height as usize),
                PixelFormat::BGR24,
            ),
        };

        CameraFrame::new(width, height, pixel_format, data, captured_at)
            .map_err(|e| CameraError::ReadFailed(e.to_string()))
    }
}

impl FrameSource for V4l2Source {
    fn read_frame(&mut self) -> BackendResult<CameraFrame> {
        let (buf, meta) = self
            .stream
            .next()
            .map_err(|e| CameraError::ReadFailed(e.to_string()))?;
        let captured_at = Instant::now();

        let used = (meta.bytesused as usize).min(buf.len());
        let buf = if used > 0 { &buf[..used] } else { buf };
        let sequence = meta.sequence;

        // Copy out of the mmap buffer before the next dequeue
        let owned = buf.to_vec();
        let frame = self.convert(&owned, captured_at)?;

        self.frame_count += 1;
        if self.frame_count % 60 == 0 {
            debug!(
                index = self.index,
                frame = self.frame_count,
                sequence,
                size = owned.len(),
                "Frame captured"
            );
        }

        Ok(frame)
    }
}

impl Drop for V4l2Source {
    fn drop(&mut self) {
        info!(index = self.index, frames = self.frame_count, "Releasing V4L2 device");
    }
}
