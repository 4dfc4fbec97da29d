mod loopback;

pub use loopback::LoopbackPreview;

use anyhow::Result;
use image::RgbImage;

/// Destination for the live camera preview
pub trait PreviewSink {
    /// Show a frame
    fn show(&mut self, frame: &RgbImage) -> Result<()>;

    /// Resolution frames are shown at
    fn resolution(&self) -> (u32, u32);
}
