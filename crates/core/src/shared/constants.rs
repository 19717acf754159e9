use std::time::Duration;

pub const DETECTOR_MODEL_NAME: &str = "face_detection_short_range.onnx";

/// Relative location of the bundled detector model.
pub const BUNDLED_MODEL_DIR: &str = "assets";

pub const DEFAULT_CAMERA_INDEX: u32 = 0;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay between login ticks without a face (~20 fps).
pub const DEFAULT_LOGIN_FRAME_PACING: Duration = Duration::from_millis(50);

pub const DEFAULT_TARGET_COUNT: usize = 50;

/// Pause after each enrollment capture so the user can vary pose.
pub const DEFAULT_CAPTURE_PACING: Duration = Duration::from_millis(100);

pub const DEFAULT_SCALE_FACTOR: f64 = 1.3;
pub const DEFAULT_MIN_NEIGHBORS: u32 = 5;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

pub const LOGIN_ENDPOINT: &str = "login-face";
pub const REGISTER_ENDPOINT: &str = "register-face";
pub const LOGIN_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const REGISTER_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

pub const LOGIN_IMAGE_NAME: &str = "login_image.jpg";
pub const FACES_ARCHIVE_NAME: &str = "faces.zip";
pub const UPLOAD_FIELD: &str = "file";
pub const USERNAME_FIELD: &str = "username";

pub const STATUS_LOOKING: &str = "Looking for face...";
pub const STATUS_FACE_FOUND: &str = "Face found... Authenticating...";
pub const STATUS_READ_FAILED: &str = "Error: Can't read frame.";
pub const STATUS_AUTHENTICATING: &str = "Authenticating with server...";
pub const STATUS_UPLOADING: &str = "Uploading to server...";

pub const ENROLLMENT_CONFIRMATION: &str = "Face registered successfully! Training started.";
