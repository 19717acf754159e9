use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("cannot open camera at index {index}: {reason}")]
    Open { index: u32, reason: String },
    #[error("failed to read frame: {0}")]
    Read(String),
    #[error("failed to query cameras: {0}")]
    Query(String),
}

/// Opens camera devices by index.
///
/// The backend crosses into the capture worker; the device it opens stays
/// on that thread, so devices need not be `Send`.
pub trait CameraBackend: Send {
    fn open(&mut self, index: u32) -> Result<Box<dyn CameraDevice>, CameraError>;
}

/// An open camera producing decoded frames.
pub trait CameraDevice {
    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<Frame, CameraError>;

    /// Stops streaming and frees the device. Must be idempotent.
    fn release(&mut self);
}

/// Owns an open device and releases it when dropped, on every exit path.
pub struct CameraGuard {
    device: Box<dyn CameraDevice>,
}

impl CameraGuard {
    pub fn new(device: Box<dyn CameraDevice>) -> Self {
        Self { device }
    }

    pub fn read_frame(&mut self) -> Result<Frame, CameraError> {
        self.device.read_frame()
    }
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        self.device.release();
    }
}
