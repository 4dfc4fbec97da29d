use super::{CaptureSource, EncodedFrame};
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Capture source backed by an image file on disk
///
/// Every request yields the same still, re-encoded as JPEG. Useful on
/// machines without a camera.
pub struct StillCapture {
    path: PathBuf,
    frame: Option<RgbImage>,
}

impl StillCapture {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frame: None,
        }
    }
}

impl CaptureSource for StillCapture {
    fn start(&mut self) -> Result<()> {
        tracing::info!("Loading still image from {}", self.path.display());

        let image = image::open(&self.path)
            .with_context(|| format!("Failed to load image from {}", self.path.display()))?;
        self.frame = Some(image.to_rgb8());

        Ok(())
    }

    fn stop(&mut self) {
        self.frame = None;
    }

    fn is_active(&self) -> bool {
        self.frame.is_some()
    }

    fn request_frame(&mut self) -> Option<EncodedFrame> {
        let frame = self.frame.as_ref()?;

        match EncodedFrame::encode(frame) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode still image");
                None
            }
        }
    }

    fn preview_frame(&mut self) -> Option<RgbImage> {
        self.frame.clone()
    }
}
