pub mod domain;
pub mod frame_acquisition_session;
