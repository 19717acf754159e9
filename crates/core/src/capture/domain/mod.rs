pub mod capture_sample;
pub mod session_policy;
pub mod session_result;
