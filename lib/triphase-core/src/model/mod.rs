pub mod artifact;
pub mod batch;
pub mod job;
pub mod session;
