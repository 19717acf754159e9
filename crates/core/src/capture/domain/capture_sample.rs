use crate::capture::domain::session_policy::CaptureMode;
use crate::capture::domain::session_result::SessionFailure;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// One decoded frame and the face found on it, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureFrame {
    pub image: Frame,
    pub face: Option<FaceBox>,
}

impl CaptureFrame {
    pub fn face_detected(&self) -> bool {
        self.face.is_some()
    }
}

/// What a session shows while it runs. Purely observational.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewEvent {
    /// Mirrored, annotated frame. Absent for status-only updates.
    pub frame: Option<CaptureFrame>,
    pub status: String,
    /// Percent complete, enrollment only.
    pub progress: Option<u8>,
}

impl PreviewEvent {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            frame: None,
            status: status.into(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Images retained by a successful session.
#[derive(Clone, Debug, PartialEq)]
pub enum CapturePayload {
    /// The full color frame with the face box drawn, in camera orientation.
    Login(Frame),
    /// Grayscale face crops from the mirrored frame, in capture order.
    Enrollment(Vec<Frame>),
}

impl CapturePayload {
    pub fn len(&self) -> usize {
        match self {
            CapturePayload::Login(_) => 1,
            CapturePayload::Enrollment(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode(&self) -> CaptureMode {
        match self {
            CapturePayload::Login(_) => CaptureMode::Login,
            CapturePayload::Enrollment(_) => CaptureMode::Enrollment,
        }
    }

    pub fn into_login(self) -> Result<Frame, SessionFailure> {
        match self {
            CapturePayload::Login(frame) => Ok(frame),
            other => Err(SessionFailure::PayloadMismatch {
                expected: CaptureMode::Login,
                actual: other.mode(),
            }),
        }
    }

    pub fn into_enrollment(self) -> Result<Vec<Frame>, SessionFailure> {
        match self {
            CapturePayload::Enrollment(samples) => Ok(samples),
            other => Err(SessionFailure::PayloadMismatch {
                expected: CaptureMode::Enrollment,
                actual: other.mode(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_detected() {
        let image = Frame::new(vec![0; 4], 2, 2, 1, 0);
        let mut frame = CaptureFrame { image, face: None };
        assert!(!frame.face_detected());
        frame.face = Some(FaceBox::new(0, 0, 1, 1));
        assert!(frame.face_detected());
    }

    #[test]
    fn test_payload_len() {
        let sample = Frame::new(vec![0; 4], 2, 2, 1, 0);
        assert_eq!(CapturePayload::Login(sample.clone()).len(), 1);
        assert_eq!(CapturePayload::Enrollment(vec![sample; 3]).len(), 3);
        assert!(CapturePayload::Enrollment(Vec::new()).is_empty());
    }

    #[test]
    fn test_payload_of_other_mode_is_mismatch() {
        let sample = Frame::new(vec![0; 4], 2, 2, 1, 0);

        assert_eq!(
            CapturePayload::Login(sample.clone()).into_login(),
            Ok(sample.clone())
        );
        assert_eq!(
            CapturePayload::Login(sample.clone()).into_enrollment(),
            Err(SessionFailure::PayloadMismatch {
                expected: CaptureMode::Enrollment,
                actual: CaptureMode::Login,
            })
        );
        assert_eq!(
            CapturePayload::Enrollment(vec![sample]).into_login(),
            Err(SessionFailure::PayloadMismatch {
                expected: CaptureMode::Login,
                actual: CaptureMode::Enrollment,
            })
        );
    }
}
