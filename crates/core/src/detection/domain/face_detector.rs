use crate::detection::domain::detector_params::DetectorParams;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Frames arrive in grayscale. Boxes come back in the frame's coordinate
/// space, best-supported first. Callers use only the first box; that is a
/// simplification, not a promise that it is the best face.
pub trait FaceDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        params: &DetectorParams,
    ) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>>;
}
