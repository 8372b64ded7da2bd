//! Pluggable retrieval of source documents and storage of signed ones

use shared_types::DocumentRef;
use thiserror::Error;

use crate::model::artifact::StoredDocument;

pub mod filesystem;
pub mod inline;
pub mod provider;


#[derive(Debug, Error)]
pub enum DocumentManagerError {
    #[error("Document `{0}` not found")]
    NotFound(DocumentRef),
    #[error("Invalid document reference `{0}`: {1}")]
    InvalidReference(DocumentRef, String),
    #[error("Document `{0}` already exists")]
    AlreadyExists(DocumentRef),
    #[error("IO error: `{0}`")]
    Io(#[from] std::io::Error),
}

/// Implementations are shared by all in-flight jobs of all requests.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait DocumentManager: Send + Sync {
    async fn fetch(&self, reference: &DocumentRef) -> Result<Vec<u8>, DocumentManagerError>;

    async fn store(
        &self,
        reference: &DocumentRef,
        content: Vec<u8>,
    ) -> Result<StoredDocument, DocumentManagerError>;
}
