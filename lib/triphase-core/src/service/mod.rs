pub mod error;
pub mod triphase;
