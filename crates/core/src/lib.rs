pub mod camera;
pub mod capture;
pub mod controller;
pub mod detection;
pub mod pipeline;
pub mod shared;
pub mod upload;

#[cfg(test)]
mod test_support;
