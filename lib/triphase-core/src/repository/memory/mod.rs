//! Process local session store

use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared_types::SessionId;
use time::OffsetDateTime;

use super::error::DataLayerError;
use super::session_repository::SessionRepository;
use crate::model::session::{
    CompletionClaim, JobCompletion, JobRecord, JobStatus, TriphaseSession,
};

#[cfg(test)]
mod test;

pub struct MemorySessionRepository {
    sessions: DashMap<SessionId, TriphaseSession>,
    /// How long a completion claim blocks other requests
    completion_lease: Duration,
}

impl MemorySessionRepository {
    pub fn new(completion_lease: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            completion_lease,
        }
    }

    fn update_job<T>(
        &self,
        id: &SessionId,
        index: usize,
        update: impl FnOnce(&mut JobRecord) -> T,
    ) -> Result<T, DataLayerError> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or(DataLayerError::RecordNotFound(*id))?;
        let job = session
            .jobs
            .get_mut(index)
            .ok_or(DataLayerError::IncorrectParameters {
                session: *id,
                index,
            })?;

        Ok(update(job))
    }
}

#[async_trait::async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create_session(&self, session: TriphaseSession) -> Result<SessionId, DataLayerError> {
        let id = session.id;
        match self.sessions.entry(id) {
            Entry::Occupied(_) => Err(DataLayerError::AlreadyExists),
            Entry::Vacant(entry) => {
                entry.insert(session);
                Ok(id)
            }
        }
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<TriphaseSession>, DataLayerError> {
        Ok(self.sessions.get(id).map(|session| session.clone()))
    }

    async fn begin_completion(
        &self,
        id: &SessionId,
        index: usize,
        signature_fingerprint: &[u8],
    ) -> Result<CompletionClaim, DataLayerError> {
        let now = OffsetDateTime::now_utc();
        let lease_until = now + self.completion_lease;

        self.update_job(id, index, |job| {
            let claim = match &job.status {
                JobStatus::AwaitingSignature => CompletionClaim::Proceed,
                JobStatus::Completing {
                    lease_until: current,
                    ..
                } if *current <= now => {
                    tracing::warn!("Reclaiming stale completion of job `{}`", job.reference);
                    CompletionClaim::Proceed
                }
                JobStatus::Completing { .. } | JobStatus::Delivering { .. } => {
                    CompletionClaim::InProgress
                }
                JobStatus::Done(completion)
                    if completion.signature_fingerprint == signature_fingerprint =>
                {
                    CompletionClaim::Completed(completion.document.clone())
                }
                JobStatus::Done(_) => CompletionClaim::Conflict,
                JobStatus::Failed(kind) => CompletionClaim::Unavailable(*kind),
            };

            if claim == CompletionClaim::Proceed {
                job.status = JobStatus::Completing {
                    signature_fingerprint: signature_fingerprint.to_vec(),
                    lease_until,
                };
            }
            claim
        })
    }

    async fn begin_delivery(
        &self,
        id: &SessionId,
        index: usize,
        signature_fingerprint: &[u8],
    ) -> Result<(), DataLayerError> {
        self.update_job(id, index, |job| match &job.status {
            JobStatus::Completing {
                signature_fingerprint: claimed,
                ..
            } if claimed.as_slice() == signature_fingerprint => {
                job.status = JobStatus::Delivering {
                    signature_fingerprint: signature_fingerprint.to_vec(),
                };
                Ok(())
            }
            _ => Err(DataLayerError::RecordNotUpdated),
        })?
    }

    async fn finish_completion(
        &self,
        id: &SessionId,
        index: usize,
        completion: JobCompletion,
    ) -> Result<(), DataLayerError> {
        self.update_job(id, index, |job| match &job.status {
            JobStatus::Completing {
                signature_fingerprint,
                ..
            }
            | JobStatus::Delivering {
                signature_fingerprint,
            } if *signature_fingerprint == completion.signature_fingerprint => {
                job.status = JobStatus::Done(completion);
                Ok(())
            }
            _ => Err(DataLayerError::RecordNotUpdated),
        })?
    }

    async fn abort_completion(&self, id: &SessionId, index: usize) -> Result<(), DataLayerError> {
        self.update_job(id, index, |job| {
            if matches!(
                job.status,
                JobStatus::Completing { .. } | JobStatus::Delivering { .. }
            ) {
                job.status = JobStatus::AwaitingSignature;
            }
        })
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<usize, DataLayerError> {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        Ok(before.saturating_sub(self.sessions.len()))
    }
}
