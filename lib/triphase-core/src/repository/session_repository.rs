use shared_types::SessionId;
use time::OffsetDateTime;

use super::error::DataLayerError;
use crate::model::session::{CompletionClaim, JobCompletion, TriphaseSession};

/// Storage of triphase sessions between the pre-sign and post-sign requests.
///
/// Completion of a job is a claim/finish protocol so that concurrent or repeated
/// post-sign requests deliver each signed document at most once.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session: TriphaseSession) -> Result<SessionId, DataLayerError>;

    async fn get_session(&self, id: &SessionId) -> Result<Option<TriphaseSession>, DataLayerError>;

    /// Atomically claims job `index` for completion with the given signature fingerprint
    async fn begin_completion(
        &self,
        id: &SessionId,
        index: usize,
        signature_fingerprint: &[u8],
    ) -> Result<CompletionClaim, DataLayerError>;

    /// Pins a claimed job while its signed document is being stored.
    ///
    /// Unlike a plain claim this does not expire, so a retry never stores twice.
    async fn begin_delivery(
        &self,
        id: &SessionId,
        index: usize,
        signature_fingerprint: &[u8],
    ) -> Result<(), DataLayerError>;

    async fn finish_completion(
        &self,
        id: &SessionId,
        index: usize,
        completion: JobCompletion,
    ) -> Result<(), DataLayerError>;

    /// Releases a claim after a failed attempt; the job can be completed again
    async fn abort_completion(&self, id: &SessionId, index: usize) -> Result<(), DataLayerError>;

    /// Returns the number of removed sessions
    async fn delete_expired(&self, now: OffsetDateTime) -> Result<usize, DataLayerError>;
}
