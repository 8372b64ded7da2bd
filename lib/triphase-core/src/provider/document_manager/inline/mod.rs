//! References carry the document content itself, base64url encoded.

use ct_codecs::{Base64UrlSafe, Base64UrlSafeNoPadding, Decoder};
use shared_types::DocumentRef;

use super::{DocumentManager, DocumentManagerError};
use crate::model::artifact::StoredDocument;


pub struct InlineDocumentManager;

#[async_trait::async_trait]
impl DocumentManager for InlineDocumentManager {
    async fn fetch(&self, reference: &DocumentRef) -> Result<Vec<u8>, DocumentManagerError> {
        let encoded = reference.as_str();
        let content = Base64UrlSafeNoPadding::decode_to_vec(encoded, None)
            .or_else(|_| Base64UrlSafe::decode_to_vec(encoded, None))
            .map_err(|e| DocumentManagerError::InvalidReference(reference.clone(), e.to_string()))?;

        if content.is_empty() {
            return Err(DocumentManagerError::NotFound(reference.clone()));
        }

        Ok(content)
    }

    async fn store(
        &self,
        _reference: &DocumentRef,
        content: Vec<u8>,
    ) -> Result<StoredDocument, DocumentManagerError> {
        Ok(StoredDocument::Inline(content))
    }
}
