pub mod session_controller;
