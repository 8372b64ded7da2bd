use shared_types::SessionId;
use thiserror::Error;

use crate::error::{ErrorCode, ErrorCodeMixin};

#[derive(Debug, Error)]
pub enum DataLayerError {
    #[error("Already exists")]
    AlreadyExists,

    #[error("Session `{0}` not found")]
    RecordNotFound(SessionId),

    #[error("Job index {index} out of range for session `{session}`")]
    IncorrectParameters { session: SessionId, index: usize },

    #[error("Record not updated")]
    RecordNotUpdated,
}

impl ErrorCodeMixin for DataLayerError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::RecordNotFound(_) => ErrorCode::BR_0005,
            Self::AlreadyExists | Self::IncorrectParameters { .. } | Self::RecordNotUpdated => {
                ErrorCode::BR_0006
            }
        }
    }
}
