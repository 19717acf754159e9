use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::camera::domain::camera_device::{CameraBackend, CameraGuard};
use crate::capture::domain::capture_sample::{CaptureFrame, CapturePayload, PreviewEvent};
use crate::capture::domain::session_policy::{CaptureMode, SessionPolicy};
use crate::capture::domain::session_result::{SessionFailure, SessionResult};
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::{STATUS_FACE_FOUND, STATUS_LOOKING, STATUS_READ_FAILED};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Log detection timing every N ticks.
const TIMING_LOG_INTERVAL: usize = 10;

/// One item of a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStep {
    Preview(PreviewEvent),
    /// Always the last item.
    Finished(SessionResult),
}

/// Camera -> detector -> accumulate loop for one login or enrollment.
///
/// The session is consumed by [`start`](Self::start) or [`run`](Self::run);
/// it cannot be restarted.
pub struct FrameAcquisitionSession {
    backend: Box<dyn CameraBackend>,
    detector: Box<dyn FaceDetector>,
    policy: SessionPolicy,
    cancelled: Arc<AtomicBool>,
}

impl FrameAcquisitionSession {
    pub fn new(
        backend: Box<dyn CameraBackend>,
        detector: Box<dyn FaceDetector>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            backend,
            detector,
            policy,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an existing cancellation flag instead of a fresh one.
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancelled = token;
        self
    }

    /// Setting the flag ends the session with `Cancelled` at the next tick.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Start acquiring lazily. The camera opens on the first `next()`.
    pub fn start(self) -> AcquisitionSteps {
        log::info!(
            "Starting {:?} session on camera {} (target {}, timeout {:?})",
            self.policy.mode,
            self.policy.camera_index,
            self.policy.target_count,
            self.policy.timeout
        );
        AcquisitionSteps {
            backend: self.backend,
            detector: self.detector,
            policy: self.policy,
            cancelled: self.cancelled,
            camera: None,
            started: Instant::now(),
            pause: Duration::ZERO,
            ticks: 0,
            login_sample: None,
            samples: Vec::new(),
            queued: None,
            finished: false,
        }
    }

    /// Drive the session to completion, handing each preview to `on_preview`.
    pub fn run(self, mut on_preview: impl FnMut(PreviewEvent)) -> SessionResult {
        let mut steps = self.start();
        loop {
            match steps.next() {
                Some(SessionStep::Preview(event)) => on_preview(event),
                Some(SessionStep::Finished(result)) => return result,
                // `finished` is only set alongside a yielded or queued Finished step
                None => unreachable!("session steps ended without a result"),
            }
        }
    }
}

/// Iterator over a running session's steps.
///
/// Yields previews, then exactly one [`SessionStep::Finished`], then `None`.
/// Dropping it early releases the camera.
pub struct AcquisitionSteps {
    backend: Box<dyn CameraBackend>,
    detector: Box<dyn FaceDetector>,
    policy: SessionPolicy,
    cancelled: Arc<AtomicBool>,
    camera: Option<CameraGuard>,
    started: Instant,
    pause: Duration,
    ticks: usize,
    login_sample: Option<Frame>,
    samples: Vec<Frame>,
    queued: Option<SessionStep>,
    finished: bool,
}

impl Iterator for AcquisitionSteps {
    type Item = SessionStep;

    fn next(&mut self) -> Option<SessionStep> {
        if let Some(step) = self.queued.take() {
            return Some(step);
        }
        if self.finished {
            return None;
        }

        if self.camera.is_none() {
            match self.backend.open(self.policy.camera_index) {
                Ok(device) => {
                    self.camera = Some(CameraGuard::new(device));
                    self.started = Instant::now();
                }
                Err(e) => {
                    log::warn!("{e}");
                    return Some(self.finish(SessionResult::Failure(SessionFailure::Device(
                        e.to_string(),
                    ))));
                }
            }
        }

        Some(self.tick())
    }
}

impl AcquisitionSteps {
    fn tick(&mut self) -> SessionStep {
        if !self.pause.is_zero() {
            std::thread::sleep(std::mem::take(&mut self.pause));
        }

        if self.cancelled.load(Ordering::SeqCst) {
            return self.finish(SessionResult::Cancelled);
        }
        if let Some(payload) = self.take_completed_payload() {
            return self.finish(SessionResult::Success(payload));
        }
        if self.policy.timeout.is_some_and(|t| self.started.elapsed() >= t) {
            let failure = match self.policy.mode {
                CaptureMode::Login => SessionFailure::DetectionTimeout,
                CaptureMode::Enrollment => SessionFailure::Incomplete {
                    captured: self.samples.len(),
                    target: self.policy.target_count,
                },
            };
            return self.finish(SessionResult::Failure(failure));
        }

        let Some(camera) = self.camera.as_mut() else {
            return self.finish(SessionResult::Failure(SessionFailure::Device(
                "camera is not open".to_string(),
            )));
        };
        let frame = match camera.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("{e}");
                let result = SessionResult::Failure(SessionFailure::Device(e.to_string()));
                if self.policy.mode == CaptureMode::Enrollment {
                    let finished = self.finish(result);
                    self.queued = Some(finished);
                    return SessionStep::Preview(
                        PreviewEvent::status(STATUS_READ_FAILED).with_progress(self.progress()),
                    );
                }
                return self.finish(result);
            }
        };

        self.ticks += 1;
        let detect_start = Instant::now();
        let mirrored = frame.mirrored();
        let gray = mirrored.to_grayscale();
        let faces = match self.detector.detect(&gray, &self.policy.detector) {
            Ok(faces) => faces,
            Err(e) => {
                log::warn!("Face detection failed on tick {}: {e}", self.ticks);
                return self.finish(SessionResult::Failure(SessionFailure::Detector(
                    e.to_string(),
                )));
            }
        };
        if self.ticks % TIMING_LOG_INTERVAL == 0 {
            log::debug!(
                "Tick {}: detection {:.1}ms, {} face(s)",
                self.ticks,
                detect_start.elapsed().as_secs_f64() * 1000.0,
                faces.len()
            );
        }

        let face = faces.first().copied();
        let event = match self.policy.mode {
            CaptureMode::Login => self.login_tick(mirrored, face),
            CaptureMode::Enrollment => self.enrollment_tick(mirrored, &gray, face),
        };
        SessionStep::Preview(event)
    }

    fn login_tick(&mut self, mirrored: Frame, face: Option<FaceBox>) -> PreviewEvent {
        match face {
            Some(face) => {
                log::info!("Face found on tick {}", self.ticks);
                let annotated = mirrored.annotated(&face);
                // uploaded in camera orientation, box included
                self.login_sample = Some(annotated.mirrored());
                PreviewEvent {
                    frame: Some(CaptureFrame {
                        image: annotated,
                        face: Some(face),
                    }),
                    status: STATUS_FACE_FOUND.to_string(),
                    progress: None,
                }
            }
            None => {
                self.pause = self.policy.frame_pacing;
                preview(&mirrored, None, STATUS_LOOKING.to_string())
            }
        }
    }

    fn enrollment_tick(&mut self, mirrored: Frame, gray: &Frame, face: Option<FaceBox>) -> PreviewEvent {
        let captured = face.and_then(|f| gray.crop(&f).map(|crop| (f, crop)));
        let event = match captured {
            Some((face, crop)) => {
                self.samples.push(crop);
                self.pause = self.policy.capture_pacing;
                let status = format!(
                    "Captured image {}/{}",
                    self.samples.len(),
                    self.policy.target_count
                );
                preview(&mirrored, Some(face), status)
            }
            None => {
                self.pause = self.policy.frame_pacing;
                preview(&mirrored, None, STATUS_LOOKING.to_string())
            }
        };
        event.with_progress(self.progress())
    }

    fn take_completed_payload(&mut self) -> Option<CapturePayload> {
        match self.policy.mode {
            CaptureMode::Login => self.login_sample.take().map(CapturePayload::Login),
            CaptureMode::Enrollment if self.samples.len() >= self.policy.target_count => {
                Some(CapturePayload::Enrollment(std::mem::take(&mut self.samples)))
            }
            CaptureMode::Enrollment => None,
        }
    }

    fn progress(&self) -> u8 {
        let target = self.policy.target_count.max(1);
        (self.samples.len().min(target) * 100 / target) as u8
    }

    /// Release the camera and produce the terminal step.
    fn finish(&mut self, result: SessionResult) -> SessionStep {
        self.camera = None;
        self.finished = true;
        match &result {
            SessionResult::Success(payload) => log::info!(
                "Session finished after {} tick(s) with {} sample(s)",
                self.ticks,
                payload.len()
            ),
            SessionResult::Failure(failure) => {
                log::info!("Session failed after {} tick(s): {failure}", self.ticks)
            }
            SessionResult::Cancelled => log::info!("Session cancelled after {} tick(s)", self.ticks),
        }
        SessionStep::Finished(result)
    }
}

/// Mirrored preview, annotated when a face is present.
fn preview(mirrored: &Frame, face: Option<FaceBox>, status: String) -> PreviewEvent {
    let image = match &face {
        Some(f) => mirrored.annotated(f),
        None => mirrored.clone(),
    };
    PreviewEvent {
        frame: Some(CaptureFrame { image, face }),
        status,
        progress: None,
    }
}
