//! Multipart/form-data framing for the image upload.
//!
//! The boundary is a single fixed token shared between the framed body and
//! the request's Content-Type header; [`MultipartPayload::content_type`] is
//! the only place the header value comes from, so the two cannot drift.

use crate::error::EncodeError;

/// Boundary token framed into every payload.
pub const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

const FIELD_NAME: &str = "file";
const FILE_NAME: &str = "image.jpg";
const FRAME_CONTENT_TYPE: &str = "image/jpeg";

/// A fully framed multipart body: head, raw frame bytes, closing boundary.
/// Total length is exactly `head + frame + tail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPayload {
    bytes: Vec<u8>,
}

impl MultipartPayload {
    /// Declared Content-Length of the request.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Value for the request's Content-Type header, carrying the same
    /// boundary the body was framed with.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }
}

fn head() -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{FIELD_NAME}\"; filename=\"{FILE_NAME}\"\r\n\
         Content-Type: {FRAME_CONTENT_TYPE}\r\n\r\n"
    )
}

fn tail() -> String {
    format!("\r\n--{BOUNDARY}--\r\n")
}

/// Framing bytes added around a frame of any size.
pub fn overhead() -> usize {
    head().len() + tail().len()
}

/// Frames `frame` into a fresh multipart body. Every call allocates its own
/// buffer sized exactly to the payload; nothing is reused across cycles, so
/// a failed cycle cannot leak stale image bytes into the next one.
pub fn encode(frame: &[u8]) -> Result<MultipartPayload, EncodeError> {
    let head = head();
    let tail = tail();
    let needed = head.len() + frame.len() + tail.len();

    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(needed)
        .map_err(|_| EncodeError::Alloc { needed })?;
    bytes.extend_from_slice(head.as_bytes());
    bytes.extend_from_slice(frame);
    bytes.extend_from_slice(tail.as_bytes());

    Ok(MultipartPayload { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn payload_length_is_exactly_head_plus_frame_plus_tail() {
        let frame = vec![0xFFu8; 1234];
        let payload = encode(&frame).unwrap();
        assert_eq!(payload.len(), overhead() + frame.len());
        assert_eq!(payload.len(), payload.as_bytes().len());
    }

    #[test]
    fn fifty_kilobyte_frame_end_to_end_length() {
        let frame = vec![0xD8u8; 50_000];
        let payload = encode(&frame).unwrap();
        assert_eq!(payload.len(), 50_000 + overhead());
    }

    #[test]
    fn body_is_framed_with_the_fixed_boundary() {
        let payload = encode(b"jpegbytes").unwrap();
        let bytes = payload.as_bytes();

        let head = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"image.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
        );
        let tail = format!("\r\n--{BOUNDARY}--\r\n");

        assert!(bytes.starts_with(head.as_bytes()));
        assert!(bytes.ends_with(tail.as_bytes()));
        assert_eq!(&bytes[head.len()..bytes.len() - tail.len()], b"jpegbytes");
    }

    #[test]
    fn content_type_header_carries_the_body_boundary() {
        let payload = encode(b"x").unwrap();
        assert_eq!(
            payload.content_type(),
            format!("multipart/form-data; boundary={BOUNDARY}")
        );
    }

    #[test]
    fn empty_frame_still_frames_cleanly() {
        let payload = encode(&[]).unwrap();
        assert_eq!(payload.len(), overhead());
    }

    #[test]
    fn consecutive_encodes_do_not_share_buffers() {
        let first = encode(b"first").unwrap();
        let second = encode(b"second").unwrap();
        assert_ne!(first.as_bytes().as_ptr(), second.as_bytes().as_ptr());
    }

    proptest! {
        #[test]
        fn length_identity_holds_for_arbitrary_frames(frame in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let payload = encode(&frame).unwrap();
            prop_assert_eq!(payload.len(), overhead() + frame.len());
        }
    }
}
