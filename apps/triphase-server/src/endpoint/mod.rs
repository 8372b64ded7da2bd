pub mod misc;
pub mod triphase;
