use reqwest::blocking::multipart::{Form, Part};

use crate::shared::constants::{FACES_ARCHIVE_NAME, LOGIN_IMAGE_NAME, UPLOAD_FIELD, USERNAME_FIELD};
use crate::upload::domain::face_uploader::FaceUploader;
use crate::upload::domain::upload_payload::{ServerAck, UploadError, UploadPayload};
use crate::upload::infrastructure::server_response::{interpret_enrollment, interpret_login};

/// Multipart HTTP client for the face verification service.
pub struct UploadClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl UploadClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

fn file_part(bytes: Vec<u8>, file_name: &'static str, mime: &str) -> Result<Part, UploadError> {
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(|e| UploadError::Encode(e.to_string()))
}

impl FaceUploader for UploadClient {
    fn upload(&self, payload: UploadPayload) -> Result<ServerAck, UploadError> {
        let url = self.url_for(payload.endpoint());
        let timeout = payload.timeout();

        let (form, is_login) = match payload {
            UploadPayload::Login { jpeg } => {
                log::info!("Uploading login image ({} bytes) to {url}", jpeg.len());
                let form = Form::new().part(UPLOAD_FIELD, file_part(jpeg, LOGIN_IMAGE_NAME, "image/jpeg")?);
                (form, true)
            }
            UploadPayload::Enrollment { username, archive } => {
                log::info!(
                    "Uploading face archive for {username} ({} bytes) to {url}",
                    archive.len()
                );
                let form = Form::new()
                    .part(UPLOAD_FIELD, file_part(archive, FACES_ARCHIVE_NAME, "application/zip")?)
                    .text(USERNAME_FIELD, username);
                (form, false)
            }
        };

        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .multipart(form)
            .send()
            .map_err(UploadError::transport)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(UploadError::transport)?;
        log::info!("Server answered {status} for {url}");

        if is_login {
            interpret_login(status, &body)
        } else {
            interpret_enrollment(status, &body)
        }
    }
}
