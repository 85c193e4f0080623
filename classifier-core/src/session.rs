//! The capture -> encode -> send -> interpret cycle.
//!
//! The camera, flash LED, and HTTP client sit behind traits so the
//! sequencing and resource discipline run against mocks on the host. The
//! cycle is strictly sequential: one frame lives at a time, and its buffer
//! goes back to the driver as soon as encoding has copied it out.

use crate::error::{CaptureError, CycleError};
use crate::interpret::{self, ClassificationOutcome, UploadResult};
use crate::link::LinkState;
use crate::multipart::{self, MultipartPayload};

/// Frame source collaborator (the camera driver on device). Dropping the
/// frame returns its buffer to the driver, so release happens exactly once
/// on every exit path.
pub trait FrameSource {
    type Frame: AsRef<[u8]>;

    fn acquire_frame(&mut self) -> Option<Self::Frame>;
}

/// Illumination collaborator (the on-board flash LED on device).
pub trait FlashLamp {
    fn set_lit(&mut self, lit: bool);
}

/// Transport collaborator (the HTTP client on device). Infallible by
/// contract: transport-level failures come back as `status_code <= 0`.
pub trait Transport {
    fn send(&mut self, url: &str, payload: &MultipartPayload) -> UploadResult;
}

// Keeps the lamp lit for the duration of a scope; the off transition runs
// on every exit path, including an acquire failure.
struct FlashGuard<'a, L: FlashLamp> {
    lamp: &'a mut L,
}

impl<'a, L: FlashLamp> FlashGuard<'a, L> {
    fn lit(lamp: &'a mut L) -> Self {
        lamp.set_lit(true);
        Self { lamp }
    }
}

impl<L: FlashLamp> Drop for FlashGuard<'_, L> {
    fn drop(&mut self) {
        self.lamp.set_lit(false);
    }
}

/// Grabs one flash-assisted frame: lamp on, `settle` to let the exposure
/// stabilize, grab, lamp off.
pub fn capture_frame<S, L>(
    source: &mut S,
    lamp: &mut L,
    settle: impl FnOnce(),
) -> Result<S::Frame, CaptureError>
where
    S: FrameSource,
    L: FlashLamp,
{
    let _flash = FlashGuard::lit(lamp);
    settle();
    source.acquire_frame().ok_or(CaptureError::NoFrame)
}

/// Everything one completed cycle produced: the raw transport view and the
/// interpreted classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub upload: UploadResult,
    pub outcome: ClassificationOutcome,
}

impl CycleReport {
    /// A received-but-unsuccessful HTTP status the caller should surface
    /// alongside the interpreted outcome.
    pub fn transport_error(&self) -> Option<i32> {
        (self.upload.has_response() && !self.upload.is_success()).then_some(self.upload.status_code)
    }
}

/// Runs one full capture cycle. The link gate comes first: no frame is
/// grabbed and no payload is built while the link is down. Transport and
/// parse failures do not abort the cycle; they are carried in the report.
pub fn run_cycle<S, L, T>(
    link: LinkState,
    source: &mut S,
    lamp: &mut L,
    settle: impl FnOnce(),
    transport: &mut T,
    url: &str,
) -> Result<CycleReport, CycleError>
where
    S: FrameSource,
    L: FlashLamp,
    T: Transport,
{
    if !link.is_connected() {
        return Err(CycleError::LinkDown);
    }

    let frame = capture_frame(source, lamp, settle)?;
    log::info!("captured frame: {} bytes", frame.as_ref().len());

    let payload = multipart::encode(frame.as_ref())?;
    // Encoding copied the bytes; hand the buffer back before the send.
    drop(frame);
    log::info!("multipart payload: {} bytes", payload.len());

    let upload = transport.send(url, &payload);
    let outcome = interpret::interpret(&upload);
    Ok(CycleReport { upload, outcome })
}
