use shared_types::DocumentRef;
use time::OffsetDateTime;
use triphase_crypto::hasher::DigestAlgorithm;
use triphase_crypto::signer::SignatureAlgorithm;

use super::job::{SignatureFormat, SignatureMode};

/// Everything needed to rebuild the pre-sign bytes of a job byte for byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureParams {
    pub format: SignatureFormat,
    pub algorithm: SignatureAlgorithm,
    pub mode: SignatureMode,
    /// Whole seconds, fixed at pre-sign time
    pub signing_time: OffsetDateTime,
    /// Digest of the source document under `algorithm.digest_algorithm()`
    pub document_digest: Vec<u8>,
    /// SHA-256 of the signer certificate
    pub certificate_digest: Vec<u8>,
    pub content_description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreSignArtifact {
    /// Exact bytes the client signs
    pub pre_sign: Vec<u8>,
    pub digest: Vec<u8>,
    pub digest_algorithm: DigestAlgorithm,
    pub params: SignatureParams,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoredDocument {
    /// Written by the document manager, retrievable under this reference
    Reference(DocumentRef),
    /// Handed back to the caller
    Inline(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedDocument {
    pub source: DocumentRef,
    pub delivery: StoredDocument,
}
