use std::fs;
use std::path::PathBuf;

use facegate_core::capture::domain::capture_sample::PreviewEvent;
use facegate_core::controller::session_controller::PreviewSink;

/// Shows session progress on stderr.
///
/// With a preview file, every preview frame is also written there as JPEG so
/// an image viewer with auto-reload can stand in for a video window.
pub struct TerminalSink {
    preview_file: Option<PathBuf>,
    last_status: String,
    preview_failed: bool,
}

impl TerminalSink {
    pub fn new(preview_file: Option<PathBuf>) -> Self {
        Self {
            preview_file,
            last_status: String::new(),
            preview_failed: false,
        }
    }

    /// End the status line.
    pub fn finish(&self) {
        if !self.last_status.is_empty() {
            eprintln!();
        }
    }

    fn write_preview(&mut self, event: &PreviewEvent) {
        let (Some(path), Some(frame)) = (&self.preview_file, &event.frame) else {
            return;
        };
        if self.preview_failed {
            return;
        }
        let result = frame
            .image
            .encode_jpeg()
            .map_err(|e| e.to_string())
            .and_then(|jpeg| fs::write(path, jpeg).map_err(|e| e.to_string()));
        if let Err(e) = result {
            log::warn!("Cannot write preview to {}: {e}", path.display());
            self.preview_failed = true;
        }
    }
}

fn status_line(event: &PreviewEvent) -> String {
    match event.progress {
        Some(pct) => format!("{} [{pct}%]", event.status),
        None => event.status.clone(),
    }
}

impl PreviewSink for TerminalSink {
    fn show(&mut self, event: &PreviewEvent) {
        self.write_preview(event);

        let line = status_line(event);
        if line != self.last_status {
            // pad to overwrite a longer previous line
            let width = self.last_status.len();
            eprint!("\r{line:<width$}");
            self.last_status = line;
        }
    }
}
