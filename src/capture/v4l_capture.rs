use super::{CaptureSource, EncodedFrame};
use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Frames read after STREAMON before a still is handed out, so exposure can settle
const WARMUP_FRAMES: u64 = 5;

/// Longest a capture request waits for the warm-up frames
const WARMUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Pause after a failed read before trying again
const READ_RETRY: Duration = Duration::from_millis(50);

/// Front-facing webcam read through nokhwa
///
/// A reader thread owns the camera and dequeues frames continuously, keeping
/// only the newest one. The driver's buffer ring therefore never holds stale
/// frames, and capture or preview requests never block on the device.
///
/// The device is not touched until `start`, so a missing camera or a denied
/// permission only shows up as `request_frame` returning `None`.
pub struct WebcamCapture {
    device_index: u32,
    width: u32,
    height: u32,
    reader: Option<FrameReader>,
}

impl WebcamCapture {
    pub fn new(device_index: u32, width: u32, height: u32) -> Self {
        Self {
            device_index,
            width,
            height,
            reader: None,
        }
    }
}

impl CaptureSource for WebcamCapture {
    fn start(&mut self) -> Result<()> {
        if self.reader.is_some() {
            return Ok(());
        }

        tracing::info!(
            "Initializing webcam {} at {}x{}",
            self.device_index,
            self.width,
            self.height
        );

        let (device_index, width, height) = (self.device_index, self.width, self.height);
        let reader = FrameReader::spawn(move || open_camera(device_index, width, height))?;

        tracing::info!("Webcam stream open");
        self.reader = Some(reader);

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.stop();
            tracing::info!("Webcam released");
        }
    }

    fn is_active(&self) -> bool {
        self.reader.is_some()
    }

    fn request_frame(&mut self) -> Option<EncodedFrame> {
        let reader = self.reader.as_ref()?;
        let frame = reader.slot.wait_for(WARMUP_FRAMES, WARMUP_TIMEOUT)?;

        match EncodedFrame::encode(&frame) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping frame that failed to encode");
                None
            }
        }
    }

    fn preview_frame(&mut self) -> Option<RgbImage> {
        let frame = self.reader.as_ref()?.slot.latest()?;
        Some(frame.as_ref().clone())
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_camera(device_index: u32, width: u32, height: u32) -> Result<Camera> {
    let index = CameraIndex::Index(device_index);
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::HighestResolution(
        Resolution::new(width, height),
    ));

    let mut camera = Camera::new(index, requested).context("Failed to open camera")?;

    camera
        .open_stream()
        .context("Failed to open camera stream")?;

    Ok(camera)
}

/// Source of raw frames driven by the reader thread
trait FrameDevice {
    fn next_frame(&mut self) -> Option<RgbImage>;

    fn close(&mut self) {}
}

impl FrameDevice for Camera {
    fn next_frame(&mut self) -> Option<RgbImage> {
        let frame = match self.frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read frame from webcam");
                return None;
            }
        };

        match frame.decode_image::<RgbFormat>() {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to decode webcam frame");
                None
            }
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.stop_stream() {
            tracing::warn!(error = %e, "Failed to stop webcam stream cleanly");
        }
    }
}

/// Newest frame seen so far plus how many frames have been read
#[derive(Default)]
struct FrameSlot {
    state: Mutex<SlotState>,
    fresh: Condvar,
}

#[derive(Default)]
struct SlotState {
    seq: u64,
    frame: Option<Arc<RgbImage>>,
}

impl FrameSlot {
    fn publish(&self, frame: RgbImage) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.seq += 1;
        state.frame = Some(Arc::new(frame));
        drop(state);

        self.fresh.notify_all();
    }

    fn latest(&self) -> Option<Arc<RgbImage>> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.frame.clone()
    }

    /// Newest frame once `min_seq` frames were read, or whatever exists at timeout
    fn wait_for(&self, min_seq: u64, timeout: Duration) -> Option<Arc<RgbImage>> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (state, _) = self
            .fresh
            .wait_timeout_while(state, timeout, |state| state.seq < min_seq)
            .unwrap_or_else(PoisonError::into_inner);

        state.frame.clone()
    }
}

/// Background thread that keeps the slot filled with the newest frame
struct FrameReader {
    slot: Arc<FrameSlot>,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl FrameReader {
    /// Open the device on a dedicated thread and start pumping frames
    ///
    /// Returns once the device is open, or with the error that kept it closed.
    fn spawn<D, F>(open: F) -> Result<Self>
    where
        D: FrameDevice + 'static,
        F: FnOnce() -> Result<D> + Send + 'static,
    {
        let slot = Arc::new(FrameSlot::default());
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let handle = {
            let slot = slot.clone();
            let stop = stop.clone();
            thread::Builder::new()
                .name("webcam-reader".into())
                .spawn(move || {
                    let mut device = match open() {
                        Ok(device) => {
                            ready_tx.send(Ok(())).ok();
                            device
                        }
                        Err(e) => {
                            ready_tx.send(Err(e)).ok();
                            return;
                        }
                    };

                    pump_frames(&mut device, &slot, &stop);
                    device.close();
                })
                .context("Failed to spawn webcam reader thread")?
        };

        let opened = ready_rx
            .recv()
            .map_err(|_| anyhow!("Webcam reader exited before opening the device"))
            .and_then(|opened| opened);

        match opened {
            Ok(()) => Ok(Self { slot, stop, handle }),
            Err(e) => {
                handle.join().ok();
                Err(e)
            }
        }
    }

    fn stop(self) {
        self.stop.store(true, Ordering::Release);
        if self.handle.join().is_err() {
            tracing::warn!("Webcam reader thread panicked");
        }
    }
}

fn pump_frames<D: FrameDevice>(device: &mut D, slot: &FrameSlot, stop: &AtomicBool) {
    while !stop.load(Ordering::Acquire) {
        match device.next_frame() {
            Some(frame) => slot.publish(frame),
            None => thread::sleep(READ_RETRY),
        }
    }
}
