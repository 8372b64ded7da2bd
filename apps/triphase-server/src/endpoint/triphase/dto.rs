use one_dto_mapper::{Into, convert_inner};
use serde::{Deserialize, Serialize};
use shared_types::{DocumentRef, SessionId};
use triphase_core::model::job::JobSettings;
use utoipa::ToSchema;

use crate::dto::error::ErrorCode;

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PreSignRequestRestDTO {
    /// Signature format: `CAdES`, `XAdES` or `PAdES`.
    #[schema(example = "CAdES")]
    pub format: String,
    /// Signature algorithm of the client key.
    #[schema(example = "SHA256withRSA")]
    pub algorithm: String,
    /// Base64url encoded DER certificate of the client signing key.
    pub certificate: String,
    pub documents: Vec<PreSignDocumentRestDTO>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PreSignDocumentRestDTO {
    /// Document reference understood by the configured document manager.
    pub reference: DocumentRef,
    /// Overrides of the request level parameters for this document.
    #[serde(default)]
    pub settings: Option<JobSettingsRestDTO>,
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema, Into)]
#[into(JobSettings)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobSettingsRestDTO {
    pub format: Option<String>,
    #[into(with_fn = convert_inner)]
    pub mode: Option<SignatureModeRestEnum>,
    /// Content description embedded in the signed properties.
    pub content_description: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, ToSchema, Into)]
#[into("triphase_core::model::job::SignatureMode")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum SignatureModeRestEnum {
    /// Document content is embedded in the signature
    Implicit,
    /// Detached signature
    Explicit,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PreSignResponseRestDTO {
    pub session_id: SessionId,
    /// One entry per submitted document, in submission order.
    pub results: Vec<PreSignResultRestDTO>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PreSignResultRestDTO {
    pub index: usize,
    pub status: JobStatusRestEnum,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PreSignArtifactRestDTO>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobErrorRestDTO>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PreSignArtifactRestDTO {
    /// Base64url encoded bytes the client has to sign.
    pub pre_sign: String,
    /// Base64url encoded digest of `preSign`.
    pub digest: String,
    #[schema(example = "SHA-256")]
    pub digest_algorithm: String,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostSignRequestRestDTO {
    pub session_id: SessionId,
    /// Entry `i` completes document `i` of the pre-sign request.
    pub documents: Vec<PostSignDocumentRestDTO>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostSignDocumentRestDTO {
    pub reference: DocumentRef,
    /// Base64url encoded signature value computed over `preSign`.
    pub signature: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostSignResponseRestDTO {
    pub session_id: SessionId,
    pub results: Vec<PostSignResultRestDTO>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostSignResultRestDTO {
    pub index: usize,
    pub status: JobStatusRestEnum,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<SignedDocumentRestDTO>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobErrorRestDTO>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignedDocumentRestDTO {
    /// Where the document manager stored the signed document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<DocumentRef>,
    /// Base64url encoded signed document, when delivered inline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum JobStatusRestEnum {
    Ok,
    Error,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobErrorRestDTO {
    pub code: ErrorCode,
    #[schema(example = "ResolutionError")]
    pub kind: String,
    pub message: String,
}
