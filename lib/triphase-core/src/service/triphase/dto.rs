use shared_types::{DocumentRef, SessionId};

use crate::model::artifact::{PreSignArtifact, SignedDocument};
use crate::model::batch::BatchResult;
use crate::model::job::{JobSettings, SignatureValue};

#[derive(Clone, Debug)]
pub struct PreSignRequestDTO {
    pub format: String,
    pub algorithm: String,
    /// DER encoded X.509 certificate of the client signing key
    pub certificate: Vec<u8>,
    pub documents: Vec<PreSignDocumentDTO>,
}

#[derive(Clone, Debug)]
pub struct PreSignDocumentDTO {
    pub reference: DocumentRef,
    pub settings: JobSettings,
}

#[derive(Clone, Debug)]
pub struct PreSignResponseDTO {
    pub session_id: SessionId,
    pub results: BatchResult<PreSignArtifact>,
}

#[derive(Clone, Debug)]
pub struct PostSignRequestDTO {
    pub session_id: SessionId,
    /// Entry `i` completes job `i` of the session
    pub documents: Vec<PostSignDocumentDTO>,
}

#[derive(Clone, Debug)]
pub struct PostSignDocumentDTO {
    pub reference: DocumentRef,
    pub signature: SignatureValue,
}

#[derive(Clone, Debug)]
pub struct PostSignResponseDTO {
    pub session_id: SessionId,
    pub results: BatchResult<SignedDocument>,
}
