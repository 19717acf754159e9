use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{BUNDLED_MODEL_DIR, DETECTOR_MODEL_NAME};

/// Application directory name under the platform data dir.
const APP_DIR: &str = "FaceGate";

#[derive(Error, Debug, PartialEq)]
pub enum ModelLocateError {
    #[error("face detector model not found (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },
    #[error("could not determine data directory")]
    NoDataDir,
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Find the face detector model.
///
/// Lookup order:
/// 1. `explicit`, if given (no fallback when it is missing)
/// 2. `assets/face_detection_short_range.onnx` relative to the working dir
/// 3. The platform data directory, see [`model_data_dir`]
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, ModelLocateError> {
    locate_in(explicit, Path::new(BUNDLED_MODEL_DIR), model_data_dir().ok())
}

/// Platform-specific directory for installed models.
///
/// - macOS: `~/Library/Application Support/FaceGate/models/`
/// - Linux: `$XDG_DATA_HOME/FaceGate/models/` or `~/.local/share/FaceGate/models/`
/// - Windows: `%APPDATA%/FaceGate/models/`
pub fn model_data_dir() -> Result<PathBuf, ModelLocateError> {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR).join("models"))
        .ok_or(ModelLocateError::NoDataDir)
}

fn locate_in(
    explicit: Option<&Path>,
    bundled_dir: &Path,
    data_dir: Option<PathBuf>,
) -> Result<PathBuf, ModelLocateError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(ModelLocateError::NotFound {
            searched: vec![path.to_path_buf()],
        });
    }

    let candidates: Vec<PathBuf> = std::iter::once(bundled_dir.join(DETECTOR_MODEL_NAME))
        .chain(data_dir.map(|d| d.join(DETECTOR_MODEL_NAME)))
        .collect();

    match candidates.iter().find(|p| p.is_file()) {
        Some(found) => {
            log::debug!("Using face detector model at {}", found.display());
            Ok(found.clone())
        }
        None => Err(ModelLocateError::NotFound {
            searched: candidates,
        }),
    }
}
