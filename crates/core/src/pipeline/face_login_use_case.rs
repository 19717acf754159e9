use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capture::domain::capture_sample::PreviewEvent;
use crate::capture::domain::session_policy::{CaptureMode, PolicyError};
use crate::capture::domain::session_result::SessionResult;
use crate::capture::frame_acquisition_session::FrameAcquisitionSession;
use crate::pipeline::capture_flow::{CaptureFlow, FlowOutcome};
use crate::shared::constants::STATUS_AUTHENTICATING;
use crate::upload::domain::face_uploader::FaceUploader;
use crate::upload::infrastructure::payload_encoder::encode_login;

/// Capture one face and ask the server who it belongs to.
pub struct FaceLoginUseCase {
    session: FrameAcquisitionSession,
    uploader: Box<dyn FaceUploader>,
}

impl FaceLoginUseCase {
    pub fn new(
        session: FrameAcquisitionSession,
        uploader: Box<dyn FaceUploader>,
    ) -> Result<Self, PolicyError> {
        session.policy().validate_for(CaptureMode::Login)?;
        Ok(Self { session, uploader })
    }
}

impl CaptureFlow for FaceLoginUseCase {
    fn cancel_token(&self) -> Arc<AtomicBool> {
        self.session.cancel_token()
    }

    fn execute(self: Box<Self>, events: &mut dyn FnMut(PreviewEvent)) -> FlowOutcome {
        let Self { session, uploader } = *self;
        let cancelled = session.cancel_token();

        let payload = match session.run(&mut *events) {
            SessionResult::Success(payload) => payload,
            SessionResult::Failure(failure) => return FlowOutcome::Failed(failure.into()),
            SessionResult::Cancelled => return FlowOutcome::Cancelled,
        };
        let frame = match payload.into_login() {
            Ok(frame) => frame,
            Err(failure) => return FlowOutcome::Failed(failure.into()),
        };
        if cancelled.load(Ordering::SeqCst) {
            return FlowOutcome::Cancelled;
        }

        events(PreviewEvent::status(STATUS_AUTHENTICATING));
        let result = encode_login(&frame).and_then(|payload| uploader.upload(payload));
        match result {
            Ok(ack) => {
                log::info!("Login accepted: {ack:?}");
                FlowOutcome::Succeeded(ack)
            }
            Err(e) => {
                log::warn!("Login rejected: {e}");
                FlowOutcome::Failed(e.into())
            }
        }
    }
}
