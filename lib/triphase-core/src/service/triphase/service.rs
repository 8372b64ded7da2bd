use std::sync::Arc;

use shared_types::{DocumentRef, SessionId};
use time::OffsetDateTime;
use triphase_crypto::certificate::SignerCertificate;
use triphase_crypto::hasher::DigestAlgorithm;
use triphase_crypto::signer::SignatureAlgorithm;

use super::TriphaseService;
use super::dto::{PostSignRequestDTO, PostSignResponseDTO, PreSignRequestDTO, PreSignResponseDTO};
use super::mapper::{
    assembly_failure, crypto_failure, pre_sign_failure, resolution_failure, session_failure,
    storage_failure, transition_failure, unsupported_format,
};
use crate::config::core_config::DeliveryMode;
use crate::model::artifact::{PreSignArtifact, SignatureParams, SignedDocument, StoredDocument};
use crate::model::batch::{FailureKind, JobFailure, JobOutcome};
use crate::model::job::{
    DocumentJob, JobLifecycle, JobPhase, JobSettings, JobState, SignatureFormat, SignatureValue,
};
use crate::model::session::{CompletionClaim, JobCompletion, JobRecord, JobStatus, TriphaseSession};
use crate::provider::signature_format::SigningInput;
use crate::service::error::{ServiceError, ValidationError};

/// Request level parameters shared by the jobs of one pre-sign request
struct PreSignContext {
    format: String,
    algorithm: String,
    certificate: SignerCertificate,
    signing_time: OffsetDateTime,
}

/// Session snapshot shared by the jobs of one post-sign request
struct PostSignContext {
    session: TriphaseSession,
    certificate: SignerCertificate,
}

impl TriphaseService {
    /// Builds the data to be signed for every document and opens a session.
    pub async fn pre_sign(
        &self,
        request: PreSignRequestDTO,
    ) -> Result<PreSignResponseDTO, ServiceError> {
        if request.documents.is_empty() {
            return Err(ValidationError::EmptyDocumentList.into());
        }
        let certificate =
            SignerCertificate::from_der(&request.certificate).map_err(ValidationError::from)?;

        let now = OffsetDateTime::now_utc();
        // whole seconds, every encoding of the signing time must agree
        let signing_time = now.replace_nanosecond(0).unwrap_or(now);

        let context = Arc::new(PreSignContext {
            format: request.format,
            algorithm: request.algorithm,
            certificate,
            signing_time,
        });

        let jobs: Vec<DocumentJob> = request.documents.into_iter().map(Into::into).collect();
        let references: Vec<DocumentRef> = jobs.iter().map(|job| job.reference.clone()).collect();

        let results = self
            .batch
            .run(jobs, |_, job| {
                let service = self.clone();
                let context = context.clone();
                async move { service.pre_sign_job(job, &context).await }
            })
            .await;

        let session = TriphaseSession {
            id: SessionId::new_v4(),
            created_date: now,
            expires_at: now + self.session_ttl,
            certificate: context.certificate.der().to_vec(),
            jobs: references
                .into_iter()
                .zip(&results)
                .map(|(reference, result)| match result {
                    Ok(artifact) => JobRecord {
                        reference,
                        params: Some(artifact.params.clone()),
                        status: JobStatus::AwaitingSignature,
                    },
                    Err(failure) => JobRecord {
                        reference,
                        params: None,
                        status: JobStatus::Failed(failure.kind),
                    },
                })
                .collect(),
        };

        let ready = results.iter().filter(|result| result.is_ok()).count();
        let session_id = self.session_repository.create_session(session).await?;
        tracing::info!(
            "Created session `{session_id}` for `{}`: {ready} of {} documents awaiting signature",
            context.certificate.subject(),
            results.len()
        );

        Ok(PreSignResponseDTO {
            session_id,
            results,
        })
    }

    /// Embeds the client signatures and delivers the signed documents.
    pub async fn post_sign(
        &self,
        request: PostSignRequestDTO,
    ) -> Result<PostSignResponseDTO, ServiceError> {
        if request.documents.is_empty() {
            return Err(ValidationError::EmptyDocumentList.into());
        }

        let session_id = request.session_id;
        let session = self
            .session_repository
            .get_session(&session_id)
            .await?
            .filter(|session| !session.is_expired(OffsetDateTime::now_utc()))
            .ok_or(ServiceError::SessionNotFound(session_id))?;
        let certificate = SignerCertificate::from_der(&session.certificate)
            .map_err(|e| ServiceError::MappingError(e.to_string()))?;

        let context = Arc::new(PostSignContext {
            session,
            certificate,
        });

        let jobs: Vec<DocumentJob> = request.documents.into_iter().map(Into::into).collect();
        let results = self
            .batch
            .run(jobs, |index, job| {
                let service = self.clone();
                let context = context.clone();
                async move { service.post_sign_job(index, job, &context).await }
            })
            .await;

        let done = results.iter().filter(|result| result.is_ok()).count();
        tracing::info!(
            "Session `{session_id}`: {done} of {} documents signed",
            results.len()
        );

        Ok(PostSignResponseDTO {
            session_id,
            results,
        })
    }

    /// Drops sessions past their expiry, returns how many were removed
    pub async fn delete_expired_sessions(&self) -> Result<usize, ServiceError> {
        let removed = self
            .session_repository
            .delete_expired(OffsetDateTime::now_utc())
            .await?;
        if removed > 0 {
            tracing::debug!("Removed {removed} expired sessions");
        }
        Ok(removed)
    }

    async fn pre_sign_job(
        &self,
        job: DocumentJob,
        context: &PreSignContext,
    ) -> JobOutcome<PreSignArtifact> {
        let mut lifecycle = JobLifecycle::received(job.reference.clone());

        match self
            .build_artifact(&job.reference, &job.settings, context)
            .await
        {
            Ok(artifact) => {
                lifecycle
                    .advance(JobState::PreBuilt)
                    .map_err(transition_failure)?;
                lifecycle
                    .advance(JobState::AwaitingSignature)
                    .map_err(transition_failure)?;
                Ok(artifact)
            }
            Err(failure) => {
                tracing::debug!("Pre-sign of `{}` failed: {failure}", job.reference);
                lifecycle.fail(failure.kind).map_err(transition_failure)?;
                Err(failure)
            }
        }
    }

    async fn build_artifact(
        &self,
        reference: &DocumentRef,
        settings: &JobSettings,
        context: &PreSignContext,
    ) -> JobOutcome<PreSignArtifact> {
        let format_name = settings.format.as_deref().unwrap_or(&context.format);
        let format: SignatureFormat = format_name
            .parse()
            .map_err(|_| unsupported_format(format!("Unknown signature format `{format_name}`")))?;
        let algorithm: SignatureAlgorithm = context.algorithm.parse().map_err(|_| {
            unsupported_format(format!(
                "Unknown signature algorithm `{}`",
                context.algorithm
            ))
        })?;

        if !context.certificate.supports(algorithm) {
            return Err(unsupported_format(format!(
                "Certificate key does not support `{algorithm}`"
            )));
        }
        self.crypto
            .get_verifier(algorithm)
            .map_err(|e| unsupported_format(e.to_string()))?
            .check_public_key(context.certificate.public_key())
            .map_err(|e| unsupported_format(e.to_string()))?;

        let formatter = self
            .formatter_provider
            .get_formatter(format)
            .ok_or_else(|| unsupported_format(format!("No formatter for `{format}`")))?;

        let document = self
            .document_manager
            .fetch(reference)
            .await
            .map_err(resolution_failure)?;
        formatter
            .check_document(&document)
            .map_err(pre_sign_failure)?;

        let digest_algorithm = algorithm.digest_algorithm();
        let hasher = self
            .crypto
            .get_hasher(digest_algorithm)
            .map_err(crypto_failure)?;
        let certificate_hasher = self
            .crypto
            .get_hasher(DigestAlgorithm::Sha256)
            .map_err(crypto_failure)?;

        let params = SignatureParams {
            format,
            algorithm,
            mode: settings.mode.unwrap_or_default(),
            signing_time: context.signing_time,
            document_digest: hasher.hash(&document),
            certificate_digest: certificate_hasher.hash(context.certificate.der()),
            content_description: settings.content_description.clone(),
        };

        let pre_sign = formatter
            .pre_sign(SigningInput {
                document: &document,
                params: &params,
                certificate: &context.certificate,
            })
            .map_err(pre_sign_failure)?;

        Ok(PreSignArtifact {
            digest: hasher.hash(&pre_sign),
            pre_sign,
            digest_algorithm,
            params,
        })
    }

    async fn post_sign_job(
        &self,
        index: usize,
        job: DocumentJob,
        context: &PostSignContext,
    ) -> JobOutcome<SignedDocument> {
        let JobPhase::Post { signature } = job.phase else {
            return Err(JobFailure::internal("Missing signature value"));
        };
        let session_id = context.session.id;

        let record = context
            .session
            .jobs
            .get(index)
            .ok_or_else(|| session_failure(format!("Session has no document at index {index}")))?;
        if record.reference != job.reference {
            return Err(session_failure(format!(
                "Document `{}` does not match session entry `{}`",
                job.reference, record.reference
            )));
        }
        let params = match (&record.status, &record.params) {
            (JobStatus::Failed(kind), _) => {
                return Err(session_failure(format!("Pre-sign of this document failed: {kind}")));
            }
            (_, Some(params)) => params,
            (_, None) => return Err(session_failure("Missing signature parameters")),
        };

        let fingerprint = self
            .crypto
            .get_hasher(DigestAlgorithm::Sha256)
            .map_err(crypto_failure)?
            .hash(signature.as_bytes());

        match self
            .session_repository
            .begin_completion(&session_id, index, &fingerprint)
            .await
            .map_err(|e| JobFailure::internal(e.to_string()))?
        {
            CompletionClaim::Proceed => {}
            CompletionClaim::Completed(document) => {
                tracing::info!(
                    "Document `{}` of session `{session_id}` already signed with this signature",
                    job.reference
                );
                return Ok(document);
            }
            CompletionClaim::Conflict => {
                return Err(session_failure(
                    "Document was already signed with a different signature",
                ));
            }
            CompletionClaim::InProgress => {
                return Err(session_failure(
                    "Document is being completed by another request",
                ));
            }
            CompletionClaim::Unavailable(kind) => {
                return Err(session_failure(format!("Pre-sign of this document failed: {kind}")));
            }
        }

        let mut lifecycle = JobLifecycle::awaiting_signature(job.reference.clone());
        let result = match self
            .assemble_job(&job.reference, params, &signature, context, &mut lifecycle)
            .await
        {
            Ok(signed) => {
                self.deliver(session_id, index, &job.reference, fingerprint, signed)
                    .await
            }
            Err(failure) => {
                if let Err(error) = self
                    .session_repository
                    .abort_completion(&session_id, index)
                    .await
                {
                    tracing::warn!("Failed to release completion of `{}`: {error}", job.reference);
                }
                Err(failure)
            }
        };

        match result {
            Ok(document) => {
                lifecycle
                    .advance(JobState::Done)
                    .map_err(transition_failure)?;
                Ok(document)
            }
            Err(failure) => {
                tracing::debug!("Post-sign of `{}` failed: {failure}", job.reference);
                if lifecycle.fail(failure.kind).is_err() {
                    tracing::warn!("Job `{}` was already marked failed", job.reference);
                }
                Err(failure)
            }
        }
    }

    /// Hands the signed document over and records the completion.
    ///
    /// Storing runs on its own task: a request deadline abandons the wait but never the
    /// write, and the job stays pinned until the write has settled.
    async fn deliver(
        &self,
        session_id: SessionId,
        index: usize,
        reference: &DocumentRef,
        fingerprint: Vec<u8>,
        signed: Vec<u8>,
    ) -> JobOutcome<SignedDocument> {
        match self.delivery {
            DeliveryMode::Inline => {
                self.record_completion(
                    session_id,
                    index,
                    fingerprint,
                    SignedDocument {
                        source: reference.clone(),
                        delivery: StoredDocument::Inline(signed),
                    },
                )
                .await
            }
            DeliveryMode::Store => {
                self.session_repository
                    .begin_delivery(&session_id, index, &fingerprint)
                    .await
                    .map_err(|e| JobFailure::internal(e.to_string()))?;

                let service = self.clone();
                let reference = reference.clone();
                tokio::spawn(async move {
                    service
                        .store_and_record(session_id, index, reference, fingerprint, signed)
                        .await
                })
                .await
                .map_err(|e| JobFailure::internal(format!("Delivery task failed: {e}")))?
            }
        }
    }

    async fn store_and_record(
        &self,
        session_id: SessionId,
        index: usize,
        reference: DocumentRef,
        fingerprint: Vec<u8>,
        signed: Vec<u8>,
    ) -> JobOutcome<SignedDocument> {
        match self.document_manager.store(&reference, signed).await {
            Ok(delivery) => {
                self.record_completion(
                    session_id,
                    index,
                    fingerprint,
                    SignedDocument {
                        source: reference,
                        delivery,
                    },
                )
                .await
            }
            Err(error) => {
                if let Err(error) = self
                    .session_repository
                    .abort_completion(&session_id, index)
                    .await
                {
                    tracing::warn!("Failed to release completion of `{reference}`: {error}");
                }
                Err(storage_failure(error))
            }
        }
    }

    async fn record_completion(
        &self,
        session_id: SessionId,
        index: usize,
        fingerprint: Vec<u8>,
        document: SignedDocument,
    ) -> JobOutcome<SignedDocument> {
        self.session_repository
            .finish_completion(
                &session_id,
                index,
                JobCompletion {
                    signature_fingerprint: fingerprint,
                    document: document.clone(),
                },
            )
            .await
            .map_err(|e| JobFailure::internal(e.to_string()))?;
        Ok(document)
    }

    /// Rebuilds the pre-sign bytes, checks the signature and embeds it
    async fn assemble_job(
        &self,
        reference: &DocumentRef,
        params: &SignatureParams,
        signature: &SignatureValue,
        context: &PostSignContext,
        lifecycle: &mut JobLifecycle,
    ) -> JobOutcome<Vec<u8>> {
        let document = self
            .document_manager
            .fetch(reference)
            .await
            .map_err(resolution_failure)?;

        let document_digest = self
            .crypto
            .get_hasher(params.algorithm.digest_algorithm())
            .map_err(crypto_failure)?
            .hash(&document);
        if document_digest != params.document_digest {
            return Err(JobFailure::new(
                FailureKind::Assembly,
                "Document changed since pre-sign",
            ));
        }

        let formatter = self
            .formatter_provider
            .get_formatter(params.format)
            .ok_or_else(|| unsupported_format(format!("No formatter for `{}`", params.format)))?;
        let input = SigningInput {
            document: &document,
            params,
            certificate: &context.certificate,
        };

        let pre_sign = formatter.pre_sign(input).map_err(assembly_failure)?;
        self.crypto
            .get_verifier(params.algorithm)
            .map_err(crypto_failure)?
            .verify(
                &pre_sign,
                signature.as_bytes(),
                context.certificate.public_key(),
            )
            .map_err(|e| JobFailure::new(FailureKind::InvalidSignature, e.to_string()))?;

        let signed = formatter
            .assemble(input, signature.as_bytes())
            .map_err(assembly_failure)?;
        formatter
            .validate(&signed, input)
            .map_err(assembly_failure)?;
        lifecycle
            .advance(JobState::PostAssembled)
            .map_err(transition_failure)?;

        Ok(signed)
    }
}
