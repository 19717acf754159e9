/// BlazeFace face detector using ONNX Runtime via `ort`.
///
/// The short-range model sees the frame at 128×128, so faces far from the
/// camera get few pixels. Like a cascade's `detectMultiScale`, the detector
/// therefore also searches centered windows that shrink by `scale_factor`
/// per level, pools every candidate above `confidence` and keeps faces that
/// at least `min_neighbors` candidates agree on.
use std::path::Path;

use crate::detection::domain::detector_params::DetectorParams;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::neighbor_grouping::{group_candidates, Candidate, DEFAULT_GROUPING_EPS};
use crate::detection::infrastructure::execution_provider::preferred_execution_providers;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Full frame plus at most this many zoomed-in levels.
const MAX_PYRAMID_LEVELS: usize = 3;

/// Values per anchor in the regressor output (box + 6 keypoints).
const REGRESSOR_STRIDE: usize = 16;

pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;
        log::info!("Loaded face detector from {}", model_path.display());
        Ok(Self {
            session,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        params: &DetectorParams,
    ) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let mut candidates = Vec::new();

        for window in pyramid_windows(frame.width(), frame.height(), params.scale_factor) {
            let input_tensor = preprocess(frame, &window, INPUT_SIZE);
            let input_value = ort::value::Tensor::from_array(input_tensor)?;
            let outputs = self.session.run(ort::inputs![input_value])?;

            // regressors: [1, 896, 16], classificators: [1, 896, 1]
            if outputs.len() < 2 {
                return Err(
                    format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
                );
            }

            let regressors = outputs[0].try_extract_array::<f32>()?;
            let scores = outputs[1].try_extract_array::<f32>()?;
            let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
            let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

            candidates.extend(decode(
                reg_data,
                score_data,
                &self.anchors,
                &window,
                params.confidence as f32,
            ));
        }

        let faces = group_candidates(&candidates, params.min_neighbors, DEFAULT_GROUPING_EPS)
            .into_iter()
            .filter_map(|g| g.face.clamp_to(frame.width(), frame.height()))
            .collect();

        Ok(faces)
    }
}

// ---------------------------------------------------------------------------
// Search windows
// ---------------------------------------------------------------------------

/// A sub-rectangle of the frame fed to the model on its own.
#[derive(Clone, Debug, PartialEq)]
struct Window {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Full frame first, then centered windows shrinking by `scale_factor`
/// while the short side still covers the model input.
fn pyramid_windows(frame_width: u32, frame_height: u32, scale_factor: f64) -> Vec<Window> {
    let mut windows = vec![Window {
        x: 0,
        y: 0,
        width: frame_width,
        height: frame_height,
    }];

    let mut scale = scale_factor;
    while windows.len() <= MAX_PYRAMID_LEVELS {
        let width = (frame_width as f64 / scale) as u32;
        let height = (frame_height as f64 / scale) as u32;
        if width.min(height) < INPUT_SIZE {
            break;
        }
        windows.push(Window {
            x: (frame_width - width) / 2,
            y: (frame_height - height) / 2,
            width,
            height,
        });
        scale *= scale_factor;
    }

    windows
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Resize `window` of the frame to `size × size`, normalized to [0,1] NCHW.
///
/// Grayscale frames are replicated across the three input channels.
fn preprocess(frame: &Frame, window: &Window, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let channels = frame.channels() as usize;
    let s = size as usize;
    let (wx, wy) = (window.x as usize, window.y as usize);
    let (ww, wh) = (window.width as usize, window.height as usize);

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = wy + (((y as f64 + 0.5) * wh as f64 / s as f64) as usize).min(wh - 1);
        for x in 0..s {
            let src_x = wx + (((x as f64 + 0.5) * ww as f64 / s as f64) as usize).min(ww - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c.min(channels - 1)]] as f32 / 255.0;
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode anchor-relative boxes above `confidence` into frame coordinates.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    window: &Window,
    confidence: f32,
) -> Vec<Candidate> {
    let num_anchors = anchors.len().min(NUM_ANCHORS);
    let (ww, wh) = (window.width as f32, window.height as f32);
    let mut candidates = Vec::new();

    for (i, &raw_score) in score_data.iter().enumerate().take(num_anchors) {
        let score = sigmoid(raw_score);
        if score < confidence {
            continue;
        }

        let offset = i * REGRESSOR_STRIDE;
        if offset + 4 > reg_data.len() {
            break;
        }

        let anchor = &anchors[i];
        let cx = anchor[0] + reg_data[offset] / INPUT_SIZE as f32;
        let cy = anchor[1] + reg_data[offset + 1] / INPUT_SIZE as f32;
        let w = reg_data[offset + 2] / INPUT_SIZE as f32;
        let h = reg_data[offset + 3] / INPUT_SIZE as f32;

        candidates.push(Candidate {
            x1: (window.x as f32 + (cx - w / 2.0) * ww) as f64,
            y1: (window.y as f32 + (cy - h / 2.0) * wh) as f64,
            x2: (window.x as f32 + (cx + w / 2.0) * ww) as f64,
            y2: (window.y as f32 + (cy + h / 2.0) * wh) as f64,
            score: score as f64,
        });
    }

    candidates
}

// ---------------------------------------------------------------------------
// Anchor generation (BlazeFace short-range)
// ---------------------------------------------------------------------------

/// The short-range model uses two feature map sizes: 16×16 and 8×8,
/// with 2 and 6 anchors per cell respectively.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn full(width: u32, height: u32) -> Window {
        Window {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    #[test]
    fn test_preprocess_shape() {
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let tensor = preprocess(&frame, &full(200, 100), INPUT_SIZE);
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
    }

    #[test]
    fn test_preprocess_replicates_gray() {
        let frame = Frame::new(vec![255u8; 50 * 50], 50, 50, 1, 0);
        let tensor = preprocess(&frame, &full(50, 50), INPUT_SIZE);
        for c in 0..3 {
            assert_relative_eq!(tensor[[0, c, 10, 10]], 1.0);
        }
    }

    #[test]
    fn test_preprocess_samples_inside_window() {
        // left half black, right half white; a right-half window is all white
        let mut data = vec![0u8; 256 * 128];
        for row in data.chunks_mut(256) {
            row[128..].fill(255);
        }
        let frame = Frame::new(data, 256, 128, 1, 0);
        let window = Window {
            x: 128,
            y: 0,
            width: 128,
            height: 128,
        };
        let tensor = preprocess(&frame, &window, INPUT_SIZE);
        assert!(tensor.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_generate_anchors_count() {
        // 16×16 grid × 2 anchors + 8×8 grid × 6 anchors = 512 + 384 = 896
        assert_eq!(generate_anchors().len(), NUM_ANCHORS);
    }

    #[test]
    fn test_anchors_in_unit_range() {
        for a in &generate_anchors() {
            assert!(a[0] > 0.0 && a[0] < 1.0);
            assert!(a[1] > 0.0 && a[1] < 1.0);
        }
    }

    #[test]
    fn test_pyramid_starts_with_full_frame() {
        let windows = pyramid_windows(640, 480, 1.3);
        assert_eq!(windows[0], full(640, 480));
    }

    #[test]
    fn test_pyramid_windows_shrink_and_stay_centered() {
        let windows = pyramid_windows(640, 480, 1.3);
        assert_eq!(windows.len(), MAX_PYRAMID_LEVELS + 1);
        for pair in windows.windows(2) {
            assert!(pair[1].width < pair[0].width);
            assert!(pair[1].height < pair[0].height);
        }
        for w in &windows {
            assert!(w.width.min(w.height) >= INPUT_SIZE);
            assert_eq!(w.x * 2 + w.width, 640 - (640 - w.width) % 2);
        }
    }

    #[test]
    fn test_pyramid_small_frame_has_single_level() {
        assert_eq!(pyramid_windows(150, 150, 1.3).len(), 1);
    }

    #[test]
    fn test_decode_maps_window_to_frame() {
        let anchors = vec![[0.5f32, 0.5f32]];
        let mut reg = vec![0.0f32; REGRESSOR_STRIDE];
        // half the window wide and tall, centered on the anchor
        reg[2] = 64.0;
        reg[3] = 64.0;
        let window = Window {
            x: 100,
            y: 50,
            width: 200,
            height: 100,
        };
        let candidates = decode(&reg, &[10.0], &anchors, &window, 0.5);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_relative_eq!(c.x1, 150.0);
        assert_relative_eq!(c.x2, 250.0);
        assert_relative_eq!(c.y1, 75.0);
        assert_relative_eq!(c.y2, 125.0);
    }

    #[test]
    fn test_decode_filters_low_scores() {
        let anchors = vec![[0.5f32, 0.5f32]; 2];
        let reg = vec![0.0f32; REGRESSOR_STRIDE * 2];
        let candidates = decode(&reg, &[-10.0, 0.0], &anchors, &full(128, 128), 0.5);
        // sigmoid(0) == 0.5 passes the inclusive threshold
        assert_eq!(candidates.len(), 1);
        assert_relative_eq!(candidates[0].score, 0.5);
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!((sigmoid(10.0) - 1.0).abs() < 0.001);
        assert!(sigmoid(-10.0) < 0.001);
    }
}
