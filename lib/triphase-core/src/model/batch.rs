use strum::Display;
use thiserror::Error;

use crate::error::{ErrorCode, ErrorCodeMixin};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum FailureKind {
    #[strum(serialize = "ResolutionError")]
    Resolution,
    #[strum(serialize = "UnsupportedFormatError")]
    UnsupportedFormat,
    #[strum(serialize = "InvalidSignatureError")]
    InvalidSignature,
    #[strum(serialize = "AssemblyError")]
    Assembly,
    #[strum(serialize = "StorageError")]
    Storage,
    #[strum(serialize = "TimeoutError")]
    Timeout,
    #[strum(serialize = "SessionError")]
    Session,
    #[strum(serialize = "InternalError")]
    Internal,
}

impl ErrorCodeMixin for FailureKind {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::Resolution => ErrorCode::BR_0010,
            Self::UnsupportedFormat => ErrorCode::BR_0011,
            Self::InvalidSignature => ErrorCode::BR_0012,
            Self::Assembly => ErrorCode::BR_0013,
            Self::Storage => ErrorCode::BR_0014,
            Self::Timeout => ErrorCode::BR_0015,
            Self::Session => ErrorCode::BR_0016,
            Self::Internal => ErrorCode::BR_0017,
        }
    }
}

/// Failure of a single document, isolated in its own result slot
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::new(FailureKind::Timeout, "Request deadline exceeded")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Internal, message)
    }
}

impl ErrorCodeMixin for JobFailure {
    fn error_code(&self) -> ErrorCode {
        self.kind.error_code()
    }
}

pub type JobOutcome<T> = Result<T, JobFailure>;

/// One outcome per submitted job, in submission order
pub type BatchResult<T> = Vec<JobOutcome<T>>;
