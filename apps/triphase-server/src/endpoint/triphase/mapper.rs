use ct_codecs::{Base64UrlSafe, Base64UrlSafeNoPadding, Decoder, Encoder};
use triphase_core::error::ErrorCodeMixin;
use triphase_core::model::artifact::{PreSignArtifact, SignedDocument, StoredDocument};
use triphase_core::model::batch::{JobFailure, JobOutcome};
use triphase_core::service::triphase::dto::{
    PostSignDocumentDTO, PostSignRequestDTO, PostSignResponseDTO, PreSignDocumentDTO,
    PreSignRequestDTO, PreSignResponseDTO,
};

use super::dto::{
    JobErrorRestDTO, JobStatusRestEnum, PostSignRequestRestDTO, PostSignResponseRestDTO,
    PostSignResultRestDTO, PreSignArtifactRestDTO, PreSignRequestRestDTO,
    PreSignResponseRestDTO, PreSignResultRestDTO, SignedDocumentRestDTO,
};
use crate::dto::error::ErrorResponseRestDTO;

fn decode(field: &str, value: &str) -> Result<Vec<u8>, ErrorResponseRestDTO> {
    Base64UrlSafeNoPadding::decode_to_vec(value, None)
        .or_else(|_| Base64UrlSafe::decode_to_vec(value, None))
        .map_err(|e| ErrorResponseRestDTO::invalid_input(format!("`{field}` is not base64url: {e}")))
}

fn encode(value: &[u8]) -> String {
    // encoding into a sufficiently large buffer cannot fail
    Base64UrlSafeNoPadding::encode_to_string(value).unwrap_or_default()
}

impl TryFrom<PreSignRequestRestDTO> for PreSignRequestDTO {
    type Error = ErrorResponseRestDTO;

    fn try_from(value: PreSignRequestRestDTO) -> Result<Self, Self::Error> {
        Ok(Self {
            format: value.format,
            algorithm: value.algorithm,
            certificate: decode("certificate", &value.certificate)?,
            documents: value
                .documents
                .into_iter()
                .map(|document| PreSignDocumentDTO {
                    reference: document.reference,
                    settings: document.settings.unwrap_or_default().into(),
                })
                .collect(),
        })
    }
}

impl TryFrom<PostSignRequestRestDTO> for PostSignRequestDTO {
    type Error = ErrorResponseRestDTO;

    fn try_from(value: PostSignRequestRestDTO) -> Result<Self, Self::Error> {
        let documents: Vec<PostSignDocumentDTO> = value
            .documents
            .into_iter()
            .enumerate()
            .map(|(index, document)| {
                let signature = decode(&format!("documents[{index}].signature"), &document.signature)?;
                Ok(PostSignDocumentDTO {
                    reference: document.reference,
                    signature: signature.into(),
                })
            })
            .collect::<Result<_, ErrorResponseRestDTO>>()?;

        Ok(Self {
            session_id: value.session_id,
            documents,
        })
    }
}

impl From<&JobFailure> for JobErrorRestDTO {
    fn from(value: &JobFailure) -> Self {
        Self {
            code: value.error_code().into(),
            kind: value.kind.to_string(),
            message: value.message.to_owned(),
        }
    }
}

impl From<PreSignArtifact> for PreSignArtifactRestDTO {
    fn from(value: PreSignArtifact) -> Self {
        Self {
            pre_sign: encode(&value.pre_sign),
            digest: encode(&value.digest),
            digest_algorithm: value.digest_algorithm.to_string(),
        }
    }
}

impl From<SignedDocument> for SignedDocumentRestDTO {
    fn from(value: SignedDocument) -> Self {
        match value.delivery {
            StoredDocument::Reference(reference) => Self {
                reference: Some(reference),
                content: None,
            },
            StoredDocument::Inline(content) => Self {
                reference: None,
                content: Some(encode(&content)),
            },
        }
    }
}

impl From<(usize, JobOutcome<PreSignArtifact>)> for PreSignResultRestDTO {
    fn from((index, outcome): (usize, JobOutcome<PreSignArtifact>)) -> Self {
        match outcome {
            Ok(artifact) => Self {
                index,
                status: JobStatusRestEnum::Ok,
                artifact: Some(artifact.into()),
                error: None,
            },
            Err(failure) => Self {
                index,
                status: JobStatusRestEnum::Error,
                artifact: None,
                error: Some((&failure).into()),
            },
        }
    }
}

impl From<(usize, JobOutcome<SignedDocument>)> for PostSignResultRestDTO {
    fn from((index, outcome): (usize, JobOutcome<SignedDocument>)) -> Self {
        match outcome {
            Ok(document) => Self {
                index,
                status: JobStatusRestEnum::Ok,
                document: Some(document.into()),
                error: None,
            },
            Err(failure) => Self {
                index,
                status: JobStatusRestEnum::Error,
                document: None,
                error: Some((&failure).into()),
            },
        }
    }
}

impl From<PreSignResponseDTO> for PreSignResponseRestDTO {
    fn from(value: PreSignResponseDTO) -> Self {
        Self {
            session_id: value.session_id,
            results: value.results.into_iter().enumerate().map(Into::into).collect(),
        }
    }
}

impl From<PostSignResponseDTO> for PostSignResponseRestDTO {
    fn from(value: PostSignResponseDTO) -> Self {
        Self {
            session_id: value.session_id,
            results: value.results.into_iter().enumerate().map(Into::into).collect(),
        }
    }
}
