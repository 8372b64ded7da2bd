use thiserror::Error;
use triphase_crypto::CryptoProviderError;

use crate::model::job::SignatureMode;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Unsupported document: {0}")]
    UnsupportedDocument(String),
    #[error("Signature mode `{0}` is not supported")]
    UnsupportedMode(SignatureMode),
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Signature verification failed")]
    InvalidSignature,
    #[error("Crypto provider error: `{0}`")]
    CryptoProvider(#[from] CryptoProviderError),
}

impl From<der::Error> for FormatError {
    fn from(error: der::Error) -> Self {
        Self::InvalidStructure(error.to_string())
    }
}

impl From<lopdf::Error> for FormatError {
    fn from(error: lopdf::Error) -> Self {
        Self::InvalidStructure(error.to_string())
    }
}

impl From<ct_codecs::Error> for FormatError {
    fn from(error: ct_codecs::Error) -> Self {
        Self::Encoding(error.to_string())
    }
}

impl From<std::io::Error> for FormatError {
    fn from(error: std::io::Error) -> Self {
        Self::Encoding(error.to_string())
    }
}
