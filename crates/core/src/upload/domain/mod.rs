pub mod face_uploader;
pub mod upload_payload;
