use thiserror::Error;

use crate::capture::domain::capture_sample::CapturePayload;
use crate::capture::domain::session_policy::CaptureMode;

/// Why a session ended without its payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionFailure {
    #[error("Camera error: {0}")]
    Device(String),
    #[error("No face detected. Please try again.")]
    DetectionTimeout,
    #[error("Face detection failed: {0}")]
    Detector(String),
    #[error("Capture failed. Only got {captured} images.")]
    Incomplete { captured: usize, target: usize },
    #[error("Capture produced a {actual:?} payload where {expected:?} was expected")]
    PayloadMismatch {
        expected: CaptureMode,
        actual: CaptureMode,
    },
}

/// Terminal outcome of a session. Produced exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionResult {
    Success(CapturePayload),
    Failure(SessionFailure),
    Cancelled,
}
