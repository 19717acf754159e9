pub mod detector_params;
pub mod face_detector;
pub mod neighbor_grouping;
