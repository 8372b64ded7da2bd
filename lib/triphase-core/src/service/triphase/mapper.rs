use triphase_crypto::CryptoProviderError;

use super::dto::{PostSignDocumentDTO, PreSignDocumentDTO};
use crate::model::batch::{FailureKind, JobFailure};
use crate::model::job::{DocumentJob, IllegalTransition, JobPhase, JobSettings};
use crate::provider::document_manager::DocumentManagerError;
use crate::provider::signature_format::error::FormatError;

impl From<PreSignDocumentDTO> for DocumentJob {
    fn from(value: PreSignDocumentDTO) -> Self {
        Self {
            reference: value.reference,
            settings: value.settings,
            phase: JobPhase::Pre,
        }
    }
}

impl From<PostSignDocumentDTO> for DocumentJob {
    fn from(value: PostSignDocumentDTO) -> Self {
        Self {
            reference: value.reference,
            settings: JobSettings::default(),
            phase: JobPhase::Post {
                signature: value.signature,
            },
        }
    }
}

pub(super) fn resolution_failure(error: DocumentManagerError) -> JobFailure {
    JobFailure::new(FailureKind::Resolution, error.to_string())
}

pub(super) fn storage_failure(error: DocumentManagerError) -> JobFailure {
    JobFailure::new(FailureKind::Storage, error.to_string())
}

pub(super) fn unsupported_format(message: impl Into<String>) -> JobFailure {
    JobFailure::new(FailureKind::UnsupportedFormat, message)
}

pub(super) fn session_failure(message: impl Into<String>) -> JobFailure {
    JobFailure::new(FailureKind::Session, message)
}

pub(super) fn crypto_failure(error: CryptoProviderError) -> JobFailure {
    JobFailure::internal(error.to_string())
}

pub(super) fn transition_failure(error: IllegalTransition) -> JobFailure {
    JobFailure::internal(error.to_string())
}

/// Errors while preparing the data to be signed
pub(super) fn pre_sign_failure(error: FormatError) -> JobFailure {
    match error {
        FormatError::CryptoProvider(error) => crypto_failure(error),
        error => unsupported_format(error.to_string()),
    }
}

/// Errors while embedding and validating a client signature
pub(super) fn assembly_failure(error: FormatError) -> JobFailure {
    match error {
        FormatError::InvalidSignature => {
            JobFailure::new(FailureKind::InvalidSignature, error.to_string())
        }
        FormatError::CryptoProvider(error) => crypto_failure(error),
        error => JobFailure::new(FailureKind::Assembly, error.to_string()),
    }
}
