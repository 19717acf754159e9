use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::shared::frame::Frame;
use crate::upload::domain::upload_payload::{UploadError, UploadPayload};

/// Archive entry name for the sample at `index`.
pub fn archive_entry_name(index: usize) -> String {
    format!("image_{index}.jpg")
}

/// JPEG-encode the login frame.
pub fn encode_login(frame: &Frame) -> Result<UploadPayload, UploadError> {
    let jpeg = frame
        .encode_jpeg()
        .map_err(|e| UploadError::Encode(e.to_string()))?;
    Ok(UploadPayload::Login { jpeg })
}

/// Zip the enrollment samples for `username`.
pub fn encode_enrollment(username: &str, samples: &[Frame]) -> Result<UploadPayload, UploadError> {
    let archive = build_face_archive(samples)?;
    Ok(UploadPayload::Enrollment {
        username: username.to_string(),
        archive,
    })
}

/// Deflate-compressed zip holding `image_0.jpg ..= image_{N-1}.jpg` in
/// capture order.
pub fn build_face_archive(samples: &[Frame]) -> Result<Vec<u8>, UploadError> {
    if samples.is_empty() {
        return Err(UploadError::Encode("no samples to archive".to_string()));
    }

    let zip_error = |e: zip::result::ZipError| UploadError::Encode(e.to_string());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (i, sample) in samples.iter().enumerate() {
        let jpeg = sample
            .encode_jpeg()
            .map_err(|e| UploadError::Encode(e.to_string()))?;
        writer
            .start_file(archive_entry_name(i), options)
            .map_err(zip_error)?;
        writer
            .write_all(&jpeg)
            .map_err(|e| UploadError::Encode(e.to_string()))?;
    }

    let cursor = writer.finish().map_err(zip_error)?;
    let bytes = cursor.into_inner();
    log::debug!("Archived {} sample(s) into {} bytes", samples.len(), bytes.len());
    Ok(bytes)
}
