use super::PreviewSink;
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use v4l::video::Output;
use v4l::{Device, Format, FourCC};

/// Live preview written to a v4l2loopback device as YUYV
///
/// Any video viewer opened on the loopback device shows the camera feed.
pub struct LoopbackPreview {
    // keeps the negotiated format alive for the lifetime of the sink
    _device: Device,
    file: File,
    width: u32,
    height: u32,
}

impl LoopbackPreview {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening preview device {} ({}x{})",
            path.display(),
            width,
            height
        );

        let device = Device::with_path(path)
            .with_context(|| format!("Failed to open v4l2 device at {}", path.display()))?;

        let requested = Format::new(width, height, FourCC::new(b"YUYV"));
        match Output::set_format(&device, &requested) {
            Ok(format) => tracing::debug!(
                "Preview format negotiated: {}x{} {}",
                format.width,
                format.height,
                format.fourcc
            ),
            Err(e) => tracing::warn!(error = %e, "Could not set preview format, using device default"),
        }

        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open {} for writing", path.display()))?;

        Ok(Self {
            _device: device,
            file,
            width,
            height,
        })
    }
}

impl PreviewSink for LoopbackPreview {
    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        let yuyv = if frame.dimensions() == (self.width, self.height) {
            rgb_to_yuyv(frame)
        } else {
            let scaled = imageops::resize(frame, self.width, self.height, FilterType::Triangle);
            rgb_to_yuyv(&scaled)
        };

        self.file
            .write_all(&yuyv)
            .context("Failed to write preview frame")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Pack an RGB frame as YUYV 4:2:2, sharing chroma across pixel pairs
fn rgb_to_yuyv(frame: &RgbImage) -> Vec<u8> {
    let (width, height) = frame.dimensions();
    let mut out = Vec::with_capacity((width.div_ceil(2) * 4 * height) as usize);

    for y in 0..height {
        for x in (0..width).step_by(2) {
            let left = frame.get_pixel(x, y);
            // odd widths repeat the last pixel
            let right = if x + 1 < width { frame.get_pixel(x + 1, y) } else { left };

            let (y0, u0, v0) = rgb_to_yuv(left.0);
            let (y1, u1, v1) = rgb_to_yuv(right.0);

            out.extend_from_slice(&[
                y0,
                ((u0 as u16 + u1 as u16) / 2) as u8,
                y1,
                ((v0 as u16 + v1 as u16) / 2) as u8,
            ]);
        }
    }

    out
}

fn rgb_to_yuv([r, g, b]: [u8; 3]) -> (u8, u8, u8) {
    let (r, g, b) = (r as f32, g as f32, b as f32);

    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = -0.147 * r - 0.289 * g + 0.436 * b + 128.0;
    let v = 0.615 * r - 0.515 * g - 0.100 * b + 128.0;

    (
        y.clamp(0.0, 255.0) as u8,
        u.clamp(0.0, 255.0) as u8,
        v.clamp(0.0, 255.0) as u8,
    )
}
