use serde::Serialize;
use strum::{Display, EnumMessage};

/// Stable error codes surfaced to API clients
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumMessage, Serialize)]
#[allow(non_camel_case_types)]
pub enum ErrorCode {
    #[strum(message = "Unmapped error")]
    BR_0000,
    #[strum(message = "Configuration error")]
    BR_0001,
    #[strum(message = "Request authentication failed")]
    BR_0002,
    #[strum(message = "Empty document list")]
    BR_0003,
    #[strum(message = "Invalid signer certificate")]
    BR_0004,
    #[strum(message = "Session not found")]
    BR_0005,
    #[strum(message = "Session storage error")]
    BR_0006,

    #[strum(message = "Document could not be resolved")]
    BR_0010,
    #[strum(message = "Unsupported signature format or algorithm")]
    BR_0011,
    #[strum(message = "Invalid signature value")]
    BR_0012,
    #[strum(message = "Signature assembly failed")]
    BR_0013,
    #[strum(message = "Signed document could not be stored")]
    BR_0014,
    #[strum(message = "Request deadline exceeded")]
    BR_0015,
    #[strum(message = "Session state does not allow the operation")]
    BR_0016,
    #[strum(message = "Internal document processing error")]
    BR_0017,

    #[strum(message = "General input validation error")]
    BR_0020,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        self.get_message().unwrap_or("Unknown error")
    }
}

pub trait ErrorCodeMixin {
    fn error_code(&self) -> ErrorCode;
}
