use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use facegate_core::capture::domain::session_policy::SessionPolicy;
use facegate_core::detection::domain::detector_params::DetectorParams;
use facegate_core::shared::constants::{
    DEFAULT_API_URL, DEFAULT_CAMERA_INDEX, DEFAULT_CAPTURE_PACING, DEFAULT_CONFIDENCE,
    DEFAULT_LOGIN_TIMEOUT, DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_FACTOR, DEFAULT_TARGET_COUNT,
};

/// Persisted CLI configuration. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub camera_index: u32,
    pub model_path: Option<PathBuf>,
    pub login_timeout_secs: u64,
    pub enrollment_count: usize,
    pub enrollment_pacing_ms: u64,
    /// Unset means enrollment runs until every image is captured.
    pub enrollment_timeout_secs: Option<u64>,
    pub scale_factor: f64,
    pub min_neighbors: u32,
    pub confidence: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            camera_index: DEFAULT_CAMERA_INDEX,
            model_path: None,
            login_timeout_secs: DEFAULT_LOGIN_TIMEOUT.as_secs(),
            enrollment_count: DEFAULT_TARGET_COUNT,
            enrollment_pacing_ms: DEFAULT_CAPTURE_PACING.as_millis() as u64,
            enrollment_timeout_secs: None,
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceGate").join("settings.json"))
    }

    /// Load from the config directory, falling back to defaults.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable settings at {}: {e}", path.display());
            Self::default()
        })
    }

    /// Save to the config directory and return where it went.
    pub fn save(&self) -> io::Result<PathBuf> {
        let path = Self::config_path().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not determine config directory")
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    pub fn detector_params(&self) -> DetectorParams {
        DetectorParams {
            scale_factor: self.scale_factor,
            min_neighbors: self.min_neighbors,
            confidence: self.confidence,
        }
    }

    pub fn login_policy(&self) -> SessionPolicy {
        SessionPolicy::login(self.camera_index)
            .with_timeout(Some(Duration::from_secs(self.login_timeout_secs)))
            .with_detector(self.detector_params())
    }

    pub fn enrollment_policy(&self) -> SessionPolicy {
        SessionPolicy::enrollment(self.camera_index)
            .with_target_count(self.enrollment_count)
            .with_capture_pacing(Duration::from_millis(self.enrollment_pacing_ms))
            .with_timeout(self.enrollment_timeout_secs.map(Duration::from_secs))
            .with_detector(self.detector_params())
    }
}
