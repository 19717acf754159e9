mod settings;
mod terminal_sink;

use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;

use clap::{Args, Parser, Subcommand};

use facegate_core::camera::infrastructure::nokhwa_camera::{list_cameras, NokhwaCameraBackend};
use facegate_core::capture::domain::session_policy::SessionPolicy;
use facegate_core::capture::frame_acquisition_session::FrameAcquisitionSession;
use facegate_core::controller::session_controller::{ControllerSignal, SessionController};
use facegate_core::detection::domain::face_detector::FaceDetector;
use facegate_core::detection::infrastructure::model_locator;
use facegate_core::detection::infrastructure::onnx_blazeface_detector::OnnxBlazefaceDetector;
use facegate_core::pipeline::capture_flow::CaptureFlow;
use facegate_core::pipeline::face_enrollment_use_case::FaceEnrollmentUseCase;
use facegate_core::pipeline::face_login_use_case::FaceLoginUseCase;
use facegate_core::upload::domain::upload_payload::ServerAck;
use facegate_core::upload::infrastructure::upload_client::UploadClient;

use settings::Settings;
use terminal_sink::TerminalSink;

/// Face login and face enrollment against a FaceGate verification server.
#[derive(Parser)]
#[command(name = "facegate", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Subcommand)]
enum Command {
    /// Identify yourself by face.
    Login {
        /// Seconds to look for a face before giving up.
        #[arg(long)]
        timeout: Option<u64>,

        /// Keep the latest preview frame in this JPEG file.
        #[arg(long)]
        preview_file: Option<PathBuf>,
    },
    /// Capture face images for an account and register them.
    Enroll {
        /// Account the faces belong to.
        #[arg(long)]
        username: String,

        /// Number of face images to capture.
        #[arg(long)]
        count: Option<usize>,

        /// Give up after this many seconds (default: no limit).
        #[arg(long)]
        timeout: Option<u64>,

        /// Keep the latest preview frame in this JPEG file.
        #[arg(long)]
        preview_file: Option<PathBuf>,
    },
    /// List available cameras.
    Cameras,
    /// Print the effective settings.
    Config {
        /// Persist them as the new defaults.
        #[arg(long)]
        save: bool,
    },
}

/// Per-run overrides of the saved settings.
#[derive(Args)]
struct Overrides {
    /// Verification server base URL.
    #[arg(long, global = true, env = "FACEGATE_API_URL")]
    api_url: Option<String>,

    /// Camera index.
    #[arg(long, global = true)]
    camera: Option<u32>,

    /// Path to the face detection ONNX model.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, global = true)]
    confidence: Option<f64>,

    /// Step between detection scales (> 1.0).
    #[arg(long, global = true)]
    scale_factor: Option<f64>,

    /// Candidate boxes that must agree before a face counts.
    #[arg(long, global = true)]
    min_neighbors: Option<u32>,
}

impl Overrides {
    fn apply(self, settings: &mut Settings) {
        if let Some(api_url) = self.api_url {
            settings.api_url = api_url;
        }
        if let Some(camera) = self.camera {
            settings.camera_index = camera;
        }
        if let Some(model) = self.model {
            settings.model_path = Some(model);
        }
        if let Some(confidence) = self.confidence {
            settings.confidence = confidence;
        }
        if let Some(scale_factor) = self.scale_factor {
            settings.scale_factor = scale_factor;
        }
        if let Some(min_neighbors) = self.min_neighbors {
            settings.min_neighbors = min_neighbors;
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = Settings::load();
    cli.overrides.apply(&mut settings);

    match cli.command {
        Command::Login {
            timeout,
            preview_file,
        } => {
            if let Some(secs) = timeout {
                settings.login_timeout_secs = secs;
            }
            validate(&settings)?;
            run_login(&settings, preview_file)
        }
        Command::Enroll {
            username,
            count,
            timeout,
            preview_file,
        } => {
            if let Some(count) = count {
                settings.enrollment_count = count;
            }
            if timeout.is_some() {
                settings.enrollment_timeout_secs = timeout;
            }
            validate(&settings)?;
            validate_username(&username)?;
            run_enroll(&settings, username.trim(), preview_file)
        }
        Command::Cameras => run_cameras(),
        Command::Config { save } => {
            validate(&settings)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if save {
                let path = settings.save()?;
                eprintln!("Saved settings to {}", path.display());
            }
            Ok(())
        }
    }
}

fn run_login(
    settings: &Settings,
    preview_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = build_session(settings, settings.login_policy())?;
    let uploader = Box::new(UploadClient::new(settings.api_url.as_str()));
    let flow = FaceLoginUseCase::new(session, uploader)?;
    eprintln!("Look at the camera...");
    drive(Box::new(flow), preview_file)
}

fn run_enroll(
    settings: &Settings,
    username: &str,
    preview_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = build_session(settings, settings.enrollment_policy())?;
    let uploader = Box::new(UploadClient::new(settings.api_url.as_str()));
    let flow = FaceEnrollmentUseCase::new(username, session, uploader)?;
    eprintln!(
        "Capturing {} face images for {username}. Move your head slowly...",
        settings.enrollment_count
    );
    drive(Box::new(flow), preview_file)
}

fn run_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = list_cameras()?;
    if cameras.is_empty() {
        eprintln!("No cameras found");
        return Ok(());
    }
    for camera in cameras {
        println!("{}: {} ({})", camera.index, camera.name, camera.description);
    }
    Ok(())
}

/// Run `flow` on a worker, mirroring its progress to the terminal.
fn drive(
    flow: Box<dyn CaptureFlow>,
    preview_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = SessionController::spawn(flow);
    let token = controller.cancel_token();
    ctrlc::set_handler(move || token.store(true, Ordering::SeqCst))?;

    let mut sink = TerminalSink::new(preview_file);
    let signal = controller.drive(&mut sink);
    sink.finish();

    match signal {
        ControllerSignal::Success(ServerAck::Identity(username)) => {
            println!("Welcome, {username}!");
            Ok(())
        }
        ControllerSignal::Success(ServerAck::Enrolled(message)) => {
            println!("{message}");
            Ok(())
        }
        ControllerSignal::Failure(message) => Err(message.into()),
        ControllerSignal::Cancelled => {
            log::info!("Cancelled by user");
            Ok(())
        }
    }
}

/// Locate the model and open the detector before touching the camera.
fn build_session(
    settings: &Settings,
    policy: SessionPolicy,
) -> Result<FrameAcquisitionSession, Box<dyn std::error::Error>> {
    policy.validate()?;
    let model_path = model_locator::locate(settings.model_path.as_deref())?;
    let detector: Box<dyn FaceDetector> = Box::new(OnnxBlazefaceDetector::new(&model_path)?);
    Ok(FrameAcquisitionSession::new(
        Box::new(NokhwaCameraBackend::new()),
        detector,
        policy,
    ))
}

fn validate(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if !(settings.api_url.starts_with("http://") || settings.api_url.starts_with("https://")) {
        return Err(format!(
            "API URL must start with http:// or https://, got '{}'",
            settings.api_url
        )
        .into());
    }
    if settings.login_timeout_secs == 0 {
        return Err("Login timeout must be at least 1 second".into());
    }
    if settings.enrollment_count == 0 {
        return Err("Enrollment count must be at least 1".into());
    }
    if settings.enrollment_timeout_secs == Some(0) {
        return Err("Enrollment timeout must be at least 1 second".into());
    }
    settings.detector_params().validate()?;
    Ok(())
}

fn validate_username(username: &str) -> Result<(), Box<dyn std::error::Error>> {
    if username.trim().is_empty() {
        return Err("Username must not be empty".into());
    }
    Ok(())
}
