mod still;
mod v4l_capture;

pub use still::StillCapture;
pub use v4l_capture::WebcamCapture;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

/// JPEG quality used for every still handed to the classifier
pub const JPEG_QUALITY: u8 = 92;

/// A single still frame, JPEG encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    bytes: Vec<u8>,
}

impl EncodedFrame {
    pub fn from_jpeg(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Encode an RGB frame at the fixed quality
    pub fn encode(frame: &RgbImage) -> Result<Self> {
        let _span = tracing::debug_span!("encode_jpeg").entered();

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
            .encode_image(frame)
            .context("Failed to encode frame as JPEG")?;

        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Trait for camera capture sources
///
/// A source owns an external stream with acquire/release semantics. `start`
/// acquires it, `stop` releases it, and implementations also release on drop
/// so a source going out of scope never leaks the device.
pub trait CaptureSource {
    /// Acquire the underlying stream
    fn start(&mut self) -> Result<()>;

    /// Release the underlying stream. Safe to call more than once.
    fn stop(&mut self);

    /// Whether a stream is currently active
    fn is_active(&self) -> bool;

    /// Pull the current frame and encode it
    ///
    /// Returns `None` when there is no active stream or the device could not
    /// deliver a frame. Absence is an expected outcome, not an error.
    fn request_frame(&mut self) -> Option<EncodedFrame>;

    /// Raw frame for the live preview, `None` when inactive
    fn preview_frame(&mut self) -> Option<RgbImage>;
}
