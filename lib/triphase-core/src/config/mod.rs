use thiserror::Error;

use crate::error::{ErrorCode, ErrorCodeMixin};

pub mod core_config;
mod placeholder;
mod properties;


#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration source found")]
    NotFound,
    #[error("Invalid properties syntax on line {line}: {reason}")]
    Syntax { line: usize, reason: String },
    #[error("Missing mandatory configuration key `{0}`")]
    MissingKey(&'static str),
    #[error("Configuration parsing error: `{0}`")]
    Parsing(String),
    #[error("Unknown document manager `{0}`")]
    UnknownDocumentManager(String),
    #[error("Invalid document manager parameter `{key}`: {reason}")]
    InvalidDocumentManagerParameter { key: String, reason: String },
}

impl ErrorCodeMixin for ConfigError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::BR_0001
    }
}
