use crate::upload::domain::upload_payload::{ServerAck, UploadError, UploadPayload};

/// Domain interface for delivering captured faces to the verification service.
///
/// One call is one request; implementations never retry.
pub trait FaceUploader: Send {
    fn upload(&self, payload: UploadPayload) -> Result<ServerAck, UploadError>;
}
