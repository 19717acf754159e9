use thiserror::Error;

use crate::shared::constants::{DEFAULT_CONFIDENCE, DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_FACTOR};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorParamsError {
    #[error("scale factor must be greater than 1.0, got {0}")]
    ScaleFactor(f64),
    #[error("confidence must be between 0.0 and 1.0, got {0}")]
    Confidence(f64),
}

/// Multi-scale detection tuning.
///
/// - `scale_factor`: step between search scales; each level looks at a
///   window `scale_factor` times smaller than the previous one.
/// - `min_neighbors`: how many raw candidate boxes must agree on a face
///   before it is reported. Higher values trade recall for precision.
/// - `confidence`: per-candidate score threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorParams {
    pub scale_factor: f64,
    pub min_neighbors: u32,
    pub confidence: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

impl DetectorParams {
    pub fn validate(&self) -> Result<(), DetectorParamsError> {
        if self.scale_factor.is_nan() || self.scale_factor <= 1.0 {
            return Err(DetectorParamsError::ScaleFactor(self.scale_factor));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(DetectorParamsError::Confidence(self.confidence));
        }
        Ok(())
    }
}
