use std::time::Duration;

use shared_types::{DocumentRef, SessionId};
use time::OffsetDateTime;

use super::MemorySessionRepository;
use crate::model::artifact::{SignedDocument, StoredDocument};
use crate::model::batch::FailureKind;
use crate::model::session::{
    CompletionClaim, JobCompletion, JobRecord, JobStatus, TriphaseSession,
};
use crate::repository::error::DataLayerError;
use crate::repository::session_repository::SessionRepository;

const LEASE: Duration = Duration::from_secs(60);

fn session(statuses: Vec<JobStatus>) -> TriphaseSession {
    let now = OffsetDateTime::now_utc();
    TriphaseSession {
        id: SessionId::new_v4(),
        created_date: now,
        expires_at: now + Duration::from_secs(300),
        certificate: vec![1, 2, 3],
        jobs: statuses
            .into_iter()
            .enumerate()
            .map(|(index, status)| JobRecord {
                reference: DocumentRef::from(format!("doc-{index}")),
                params: None,
                status,
            })
            .collect(),
    }
}

fn completion(fingerprint: &[u8]) -> JobCompletion {
    JobCompletion {
        signature_fingerprint: fingerprint.to_vec(),
        document: SignedDocument {
            source: DocumentRef::from("doc-0"),
            delivery: StoredDocument::Reference(DocumentRef::from("doc-0.signed")),
        },
    }
}

#[tokio::test]
async fn test_create_and_get_session() {
    let repository = MemorySessionRepository::new(LEASE);
    let session = session(vec![JobStatus::AwaitingSignature]);

    let id = repository.create_session(session.clone()).await.unwrap();
    assert_eq!(id, session.id);
    assert_eq!(repository.get_session(&id).await.unwrap(), Some(session.clone()));

    assert!(matches!(
        repository.create_session(session).await,
        Err(DataLayerError::AlreadyExists)
    ));
    assert_eq!(repository.get_session(&SessionId::new_v4()).await.unwrap(), None);
}

#[tokio::test]
async fn test_completion_claim_lifecycle() {
    let repository = MemorySessionRepository::new(LEASE);
    let id = repository
        .create_session(session(vec![JobStatus::AwaitingSignature]))
        .await
        .unwrap();

    assert_eq!(
        repository.begin_completion(&id, 0, b"sig-a").await.unwrap(),
        CompletionClaim::Proceed
    );
    assert_eq!(
        repository.begin_completion(&id, 0, b"sig-a").await.unwrap(),
        CompletionClaim::InProgress
    );

    repository
        .finish_completion(&id, 0, completion(b"sig-a"))
        .await
        .unwrap();

    assert_eq!(
        repository.begin_completion(&id, 0, b"sig-a").await.unwrap(),
        CompletionClaim::Completed(completion(b"sig-a").document)
    );
    assert_eq!(
        repository.begin_completion(&id, 0, b"sig-b").await.unwrap(),
        CompletionClaim::Conflict
    );
}

#[tokio::test]
async fn test_abort_completion_allows_retry() {
    let repository = MemorySessionRepository::new(LEASE);
    let id = repository
        .create_session(session(vec![JobStatus::AwaitingSignature]))
        .await
        .unwrap();

    repository.begin_completion(&id, 0, b"sig-a").await.unwrap();
    repository.abort_completion(&id, 0).await.unwrap();

    assert_eq!(
        repository.begin_completion(&id, 0, b"sig-b").await.unwrap(),
        CompletionClaim::Proceed
    );
}

#[tokio::test]
async fn test_stale_claim_is_reclaimed() {
    let repository = MemorySessionRepository::new(Duration::ZERO);
    let id = repository
        .create_session(session(vec![JobStatus::AwaitingSignature]))
        .await
        .unwrap();

    repository.begin_completion(&id, 0, b"sig-a").await.unwrap();
    assert_eq!(
        repository.begin_completion(&id, 0, b"sig-a").await.unwrap(),
        CompletionClaim::Proceed
    );
}

#[tokio::test]
async fn test_delivering_job_is_never_reclaimed() {
    let repository = MemorySessionRepository::new(Duration::ZERO);
    let id = repository
        .create_session(session(vec![JobStatus::AwaitingSignature]))
        .await
        .unwrap();

    repository.begin_completion(&id, 0, b"sig-a").await.unwrap();
    repository.begin_delivery(&id, 0, b"sig-a").await.unwrap();

    assert_eq!(
        repository.begin_completion(&id, 0, b"sig-a").await.unwrap(),
        CompletionClaim::InProgress
    );

    repository
        .finish_completion(&id, 0, completion(b"sig-a"))
        .await
        .unwrap();
    assert_eq!(
        repository.begin_completion(&id, 0, b"sig-a").await.unwrap(),
        CompletionClaim::Completed(completion(b"sig-a").document)
    );
}

#[tokio::test]
async fn test_delivery_requires_matching_claim() {
    let repository = MemorySessionRepository::new(LEASE);
    let id = repository
        .create_session(session(vec![JobStatus::AwaitingSignature]))
        .await
        .unwrap();

    assert!(matches!(
        repository.begin_delivery(&id, 0, b"sig-a").await,
        Err(DataLayerError::RecordNotUpdated)
    ));

    repository.begin_completion(&id, 0, b"sig-a").await.unwrap();
    assert!(matches!(
        repository.begin_delivery(&id, 0, b"sig-b").await,
        Err(DataLayerError::RecordNotUpdated)
    ));

    repository.begin_delivery(&id, 0, b"sig-a").await.unwrap();
    repository.abort_completion(&id, 0).await.unwrap();
    assert_eq!(
        repository.begin_completion(&id, 0, b"sig-b").await.unwrap(),
        CompletionClaim::Proceed
    );
}

#[tokio::test]
async fn test_finish_requires_matching_claim() {
    let repository = MemorySessionRepository::new(LEASE);
    let id = repository
        .create_session(session(vec![JobStatus::AwaitingSignature]))
        .await
        .unwrap();

    assert!(matches!(
        repository.finish_completion(&id, 0, completion(b"sig-a")).await,
        Err(DataLayerError::RecordNotUpdated)
    ));

    repository.begin_completion(&id, 0, b"sig-a").await.unwrap();
    assert!(matches!(
        repository.finish_completion(&id, 0, completion(b"sig-b")).await,
        Err(DataLayerError::RecordNotUpdated)
    ));
}

#[tokio::test]
async fn test_failed_job_is_unavailable() {
    let repository = MemorySessionRepository::new(LEASE);
    let id = repository
        .create_session(session(vec![
            JobStatus::AwaitingSignature,
            JobStatus::Failed(FailureKind::Resolution),
        ]))
        .await
        .unwrap();

    assert_eq!(
        repository.begin_completion(&id, 1, b"sig").await.unwrap(),
        CompletionClaim::Unavailable(FailureKind::Resolution)
    );
    assert!(matches!(
        repository.begin_completion(&id, 2, b"sig").await,
        Err(DataLayerError::IncorrectParameters { index: 2, .. })
    ));
    assert!(matches!(
        repository.begin_completion(&SessionId::new_v4(), 0, b"sig").await,
        Err(DataLayerError::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_expired() {
    let repository = MemorySessionRepository::new(LEASE);
    let live = session(vec![]);
    let mut expired = session(vec![]);
    expired.expires_at = expired.created_date - Duration::from_secs(1);

    repository.create_session(live.clone()).await.unwrap();
    repository.create_session(expired.clone()).await.unwrap();

    let removed = repository
        .delete_expired(OffsetDateTime::now_utc())
        .await
        .unwrap();

    assert_eq!(removed, 1);
    assert!(repository.get_session(&live.id).await.unwrap().is_some());
    assert!(repository.get_session(&expired.id).await.unwrap().is_none());
}
