//! Classifier Core - Hardware-independent logic for the ESP32-CAM trash classifier
//!
//! This crate contains the device-session and upload-protocol logic that can
//! be tested on the host platform without requiring ESP32 hardware: link and
//! time-sync state machines, the multipart upload encoder, response
//! interpretation, and the capture cycle sequencing. The firmware crate
//! supplies the camera, Wi-Fi, and HTTP collaborators.

pub mod endpoint;
pub mod error;
pub mod interpret;
pub mod link;
pub mod multipart;
pub mod retry;
pub mod session;
pub mod timesync;
