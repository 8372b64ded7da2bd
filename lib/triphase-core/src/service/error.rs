use shared_types::SessionId;
use thiserror::Error;
use triphase_crypto::certificate::CertificateError;

use crate::error::{ErrorCode, ErrorCodeMixin};
use crate::repository::error::DataLayerError;

/// Failures of a whole request, as opposed to per-document [`crate::model::batch::JobFailure`]s
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Session `{0}` not found or expired")]
    SessionNotFound(SessionId),
    #[error(transparent)]
    Repository(#[from] DataLayerError),
    #[error("Mapping error: `{0}`")]
    MappingError(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("At least one document is required")]
    EmptyDocumentList,
    #[error("Invalid signer certificate: `{0}`")]
    InvalidCertificate(#[from] CertificateError),
}

impl ErrorCodeMixin for ServiceError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::Validation(error) => error.error_code(),
            Self::SessionNotFound(_) => ErrorCode::BR_0005,
            Self::Repository(error) => error.error_code(),
            Self::MappingError(_) => ErrorCode::BR_0000,
        }
    }
}

impl ErrorCodeMixin for ValidationError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyDocumentList => ErrorCode::BR_0003,
            Self::InvalidCertificate(_) => ErrorCode::BR_0004,
        }
    }
}
