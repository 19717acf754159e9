use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

use crate::camera::domain::camera_device::{CameraBackend, CameraDevice, CameraError};
use crate::shared::frame::Frame;

/// A camera found by [`list_cameras`].
#[derive(Clone, Debug)]
pub struct CameraInfo {
    pub index: String,
    pub name: String,
    pub description: String,
}

/// Enumerate cameras through the platform's native backend.
pub fn list_cameras() -> Result<Vec<CameraInfo>, CameraError> {
    let cameras = nokhwa::query(ApiBackend::Auto).map_err(|e| CameraError::Query(e.to_string()))?;
    Ok(cameras
        .into_iter()
        .map(|info| CameraInfo {
            index: info.index().to_string(),
            name: info.human_name(),
            description: info.description().to_string(),
        })
        .collect())
}

/// Opens webcams through `nokhwa`'s native input backend.
#[derive(Default)]
pub struct NokhwaCameraBackend;

impl NokhwaCameraBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CameraBackend for NokhwaCameraBackend {
    fn open(&mut self, index: u32) -> Result<Box<dyn CameraDevice>, CameraError> {
        let open_error = |e: nokhwa::NokhwaError| CameraError::Open {
            index,
            reason: e.to_string(),
        };

        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested).map_err(open_error)?;
        camera.open_stream().map_err(open_error)?;

        let format = camera.camera_format();
        log::info!(
            "Opened camera {index}: {} ({}x{} @ {} fps)",
            camera.info().human_name(),
            format.width(),
            format.height(),
            format.frame_rate()
        );

        Ok(Box::new(NokhwaCamera {
            camera: Some(camera),
            ticks: 0,
        }))
    }
}

struct NokhwaCamera {
    camera: Option<Camera>,
    ticks: usize,
}

impl CameraDevice for NokhwaCamera {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| CameraError::Read("camera already released".into()))?;

        let buffer = camera
            .frame()
            .map_err(|e| CameraError::Read(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Read(e.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        let frame = Frame::new(decoded.into_raw(), width, height, 3, self.ticks);
        self.ticks += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop camera stream: {e}");
            }
            log::debug!("Camera released after {} frames", self.ticks);
        }
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        self.release();
    }
}
