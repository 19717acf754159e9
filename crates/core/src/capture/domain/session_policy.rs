use std::time::Duration;

use thiserror::Error;

use crate::detection::domain::detector_params::{DetectorParams, DetectorParamsError};
use crate::shared::constants::{
    DEFAULT_CAPTURE_PACING, DEFAULT_LOGIN_FRAME_PACING, DEFAULT_LOGIN_TIMEOUT, DEFAULT_TARGET_COUNT,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureMode {
    /// Stop at the first detected face and keep the full color frame.
    Login,
    /// Collect `target_count` grayscale face crops.
    Enrollment,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("target count must be at least 1")]
    ZeroTarget,
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    #[error("expected a {expected:?} policy")]
    ModeMismatch { expected: CaptureMode },
    #[error(transparent)]
    Detector(#[from] DetectorParamsError),
}

/// Fixed configuration for one acquisition session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionPolicy {
    pub camera_index: u32,
    pub mode: CaptureMode,
    /// `None` runs until the goal is reached or the session is cancelled.
    pub timeout: Option<Duration>,
    pub target_count: usize,
    /// Pause after each retained sample.
    pub capture_pacing: Duration,
    /// Pause after a tick that retained nothing.
    pub frame_pacing: Duration,
    pub detector: DetectorParams,
}

impl SessionPolicy {
    pub fn login(camera_index: u32) -> Self {
        Self {
            camera_index,
            mode: CaptureMode::Login,
            timeout: Some(DEFAULT_LOGIN_TIMEOUT),
            target_count: 1,
            capture_pacing: Duration::ZERO,
            frame_pacing: DEFAULT_LOGIN_FRAME_PACING,
            detector: DetectorParams::default(),
        }
    }

    pub fn enrollment(camera_index: u32) -> Self {
        Self {
            camera_index,
            mode: CaptureMode::Enrollment,
            timeout: None,
            target_count: DEFAULT_TARGET_COUNT,
            capture_pacing: DEFAULT_CAPTURE_PACING,
            frame_pacing: Duration::ZERO,
            detector: DetectorParams::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ignored for login, which always stops at one sample.
    pub fn with_target_count(mut self, target_count: usize) -> Self {
        if self.mode == CaptureMode::Enrollment {
            self.target_count = target_count;
        }
        self
    }

    pub fn with_capture_pacing(mut self, pacing: Duration) -> Self {
        self.capture_pacing = pacing;
        self
    }

    pub fn with_frame_pacing(mut self, pacing: Duration) -> Self {
        self.frame_pacing = pacing;
        self
    }

    pub fn with_detector(mut self, detector: DetectorParams) -> Self {
        self.detector = detector;
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.target_count == 0 {
            return Err(PolicyError::ZeroTarget);
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(PolicyError::ZeroTimeout);
        }
        self.detector.validate()?;
        Ok(())
    }

    /// Validate, and check that the policy drives `mode`.
    pub fn validate_for(&self, mode: CaptureMode) -> Result<(), PolicyError> {
        if self.mode != mode {
            return Err(PolicyError::ModeMismatch { expected: mode });
        }
        self.validate()
    }
}
