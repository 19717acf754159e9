use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use thiserror::Error;

use crate::capture::domain::capture_sample::PreviewEvent;
use crate::capture::domain::session_result::SessionFailure;
use crate::upload::domain::upload_payload::{ServerAck, UploadError};

#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Session(#[from] SessionFailure),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Terminal outcome of a capture followed by its upload.
#[derive(Debug)]
pub enum FlowOutcome {
    Succeeded(ServerAck),
    Failed(FlowError),
    Cancelled,
}

/// A capture session plus its upload, runnable on a worker thread.
pub trait CaptureFlow: Send {
    /// Flag that cancels the capture. Once the upload has started it runs
    /// to completion.
    fn cancel_token(&self) -> Arc<AtomicBool>;

    /// Run to completion, reporting progress through `events`.
    fn execute(self: Box<Self>, events: &mut dyn FnMut(PreviewEvent)) -> FlowOutcome;
}
