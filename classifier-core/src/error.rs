//! Error types for the capture/upload cycle.

/// Errors from frame acquisition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The camera driver had no frame buffer to hand out.
    #[error("camera returned no frame buffer")]
    NoFrame,
}

/// Errors from multipart encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The payload buffer could not be allocated.
    #[error("failed to allocate {needed} bytes for multipart payload")]
    Alloc { needed: usize },
}

/// Errors that abort a capture cycle before any response can be
/// interpreted. Transport and parse failures are not here: they still
/// produce a classification outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    #[error("link is down, capture cycle skipped")]
    LinkDown,

    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),
}
