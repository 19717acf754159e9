pub mod capture_flow;
pub mod face_enrollment_use_case;
pub mod face_login_use_case;
