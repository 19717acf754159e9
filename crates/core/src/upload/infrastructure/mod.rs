pub mod payload_encoder;
pub mod server_response;
pub mod upload_client;
