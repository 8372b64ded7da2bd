pub mod error;
pub mod memory;
pub mod session_repository;
