//! Scripted camera, detector and uploader doubles shared by the session,
//! flow and controller tests.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::camera::domain::camera_device::{CameraBackend, CameraDevice, CameraError};
use crate::detection::domain::detector_params::DetectorParams;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;
use crate::upload::domain::face_uploader::FaceUploader;
use crate::upload::domain::upload_payload::{ServerAck, UploadError, UploadPayload};

pub const FAKE_WIDTH: u32 = 64;
pub const FAKE_HEIGHT: u32 = 48;

/// A face comfortably inside a fake frame.
pub fn fake_face() -> FaceBox {
    FaceBox::new(8, 8, 16, 16)
}

/// RGB frame whose red channel encodes the column, so mirroring is visible.
pub fn fake_frame(index: usize) -> Frame {
    let mut data = Vec::with_capacity((FAKE_WIDTH * FAKE_HEIGHT * 3) as usize);
    for _y in 0..FAKE_HEIGHT {
        for x in 0..FAKE_WIDTH {
            data.extend_from_slice(&[(x * 4) as u8, (index % 256) as u8, 200]);
        }
    }
    Frame::new(data, FAKE_WIDTH, FAKE_HEIGHT, 3, index)
}

#[derive(Clone, Default)]
pub struct CameraCounters {
    pub opens: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
    pub reads: Arc<AtomicUsize>,
}

impl CameraCounters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

pub struct FakeCameraBackend {
    counters: CameraCounters,
    fail_open: bool,
    fail_after: Option<usize>,
}

impl FakeCameraBackend {
    pub fn new() -> (Self, CameraCounters) {
        let counters = CameraCounters::default();
        let backend = Self {
            counters: counters.clone(),
            fail_open: false,
            fail_after: None,
        };
        (backend, counters)
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Reads fail once `frames` frames have been delivered.
    pub fn failing_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }
}

impl CameraBackend for FakeCameraBackend {
    fn open(&mut self, index: u32) -> Result<Box<dyn CameraDevice>, CameraError> {
        if self.fail_open {
            return Err(CameraError::Open {
                index,
                reason: "no such device".into(),
            });
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeCamera {
            counters: self.counters.clone(),
            fail_after: self.fail_after,
            delivered: 0,
        }))
    }
}

struct FakeCamera {
    counters: CameraCounters,
    fail_after: Option<usize>,
    delivered: usize,
}

impl CameraDevice for FakeCamera {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| self.delivered >= n) {
            return Err(CameraError::Read("device unplugged".into()));
        }
        let frame = fake_frame(self.delivered);
        self.delivered += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

type Respond = Box<dyn FnMut(&Frame) -> Result<Vec<FaceBox>, String> + Send>;

/// Detector driven by a closure over the (grayscale) frame it is given.
pub struct ScriptedDetector {
    respond: Respond,
}

impl ScriptedDetector {
    pub fn new(respond: impl FnMut(&Frame) -> Result<Vec<FaceBox>, String> + Send + 'static) -> Self {
        Self {
            respond: Box::new(respond),
        }
    }

    pub fn always(face: FaceBox) -> Self {
        Self::new(move |_| Ok(vec![face]))
    }

    pub fn never() -> Self {
        Self::new(|_| Ok(Vec::new()))
    }

    /// Finds `face` from the frame with index `first` onwards.
    pub fn from_frame(first: usize, face: FaceBox) -> Self {
        Self::new(move |frame| {
            Ok(if frame.index() >= first {
                vec![face]
            } else {
                Vec::new()
            })
        })
    }

    pub fn failing(message: &'static str) -> Self {
        Self::new(move |_| Err(message.to_string()))
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        _params: &DetectorParams,
    ) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        (self.respond)(frame).map_err(|e| e.into())
    }
}

type Reply = Box<dyn Fn() -> Result<ServerAck, UploadError> + Send>;

/// Uploader that records every payload and answers from a closure.
pub struct RecordingUploader {
    calls: Arc<Mutex<Vec<UploadPayload>>>,
    reply: Reply,
}

impl RecordingUploader {
    pub fn new(
        reply: impl Fn() -> Result<ServerAck, UploadError> + Send + 'static,
    ) -> (Self, Arc<Mutex<Vec<UploadPayload>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let uploader = Self {
            calls: calls.clone(),
            reply: Box::new(reply),
        };
        (uploader, calls)
    }

    pub fn accepting(ack: ServerAck) -> (Self, Arc<Mutex<Vec<UploadPayload>>>) {
        Self::new(move || Ok(ack.clone()))
    }

    pub fn rejecting(message: &'static str) -> (Self, Arc<Mutex<Vec<UploadPayload>>>) {
        Self::new(move || Err(UploadError::ServerRejection(message.to_string())))
    }
}

impl FaceUploader for RecordingUploader {
    fn upload(&self, payload: UploadPayload) -> Result<ServerAck, UploadError> {
        self.calls.lock().unwrap().push(payload);
        (self.reply)()
    }
}
