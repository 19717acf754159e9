use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capture::domain::capture_sample::PreviewEvent;
use crate::capture::domain::session_policy::{CaptureMode, PolicyError};
use crate::capture::domain::session_result::SessionResult;
use crate::capture::frame_acquisition_session::FrameAcquisitionSession;
use crate::pipeline::capture_flow::{CaptureFlow, FlowOutcome};
use crate::shared::constants::STATUS_UPLOADING;
use crate::upload::domain::face_uploader::FaceUploader;
use crate::upload::infrastructure::payload_encoder::encode_enrollment;

/// Capture a set of face crops for `username` and register them.
pub struct FaceEnrollmentUseCase {
    username: String,
    session: FrameAcquisitionSession,
    uploader: Box<dyn FaceUploader>,
}

impl FaceEnrollmentUseCase {
    pub fn new(
        username: impl Into<String>,
        session: FrameAcquisitionSession,
        uploader: Box<dyn FaceUploader>,
    ) -> Result<Self, PolicyError> {
        session.policy().validate_for(CaptureMode::Enrollment)?;
        Ok(Self {
            username: username.into(),
            session,
            uploader,
        })
    }
}

impl CaptureFlow for FaceEnrollmentUseCase {
    fn cancel_token(&self) -> Arc<AtomicBool> {
        self.session.cancel_token()
    }

    fn execute(self: Box<Self>, events: &mut dyn FnMut(PreviewEvent)) -> FlowOutcome {
        let Self {
            username,
            session,
            uploader,
        } = *self;
        let cancelled = session.cancel_token();

        let payload = match session.run(&mut *events) {
            SessionResult::Success(payload) => payload,
            SessionResult::Failure(failure) => return FlowOutcome::Failed(failure.into()),
            SessionResult::Cancelled => return FlowOutcome::Cancelled,
        };
        let samples = match payload.into_enrollment() {
            Ok(samples) => samples,
            Err(failure) => return FlowOutcome::Failed(failure.into()),
        };
        if cancelled.load(Ordering::SeqCst) {
            return FlowOutcome::Cancelled;
        }

        events(
            PreviewEvent::status(format!("Captured {} images. Zipping...", samples.len()))
                .with_progress(100),
        );
        let payload = match encode_enrollment(&username, &samples) {
            Ok(payload) => payload,
            Err(e) => return FlowOutcome::Failed(e.into()),
        };

        events(PreviewEvent::status(STATUS_UPLOADING).with_progress(100));
        match uploader.upload(payload) {
            Ok(ack) => {
                log::info!("Enrolled {} face image(s) for {username}", samples.len());
                FlowOutcome::Succeeded(ack)
            }
            Err(e) => {
                log::warn!("Enrollment for {username} failed: {e}");
                FlowOutcome::Failed(e.into())
            }
        }
    }
}
