use shared_types::{DocumentRef, SessionId};
use time::OffsetDateTime;

use super::artifact::{SignatureParams, SignedDocument};
use super::batch::FailureKind;

/// Server-side state kept between the pre-sign and post-sign requests.
///
/// Never holds document content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriphaseSession {
    pub id: SessionId,
    pub created_date: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub certificate: Vec<u8>,
    pub jobs: Vec<JobRecord>,
}

impl TriphaseSession {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobRecord {
    pub reference: DocumentRef,
    pub params: Option<SignatureParams>,
    pub status: JobStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobStatus {
    AwaitingSignature,
    /// Claimed by an in-flight post-sign request; reclaimable after `lease_until`
    Completing {
        signature_fingerprint: Vec<u8>,
        lease_until: OffsetDateTime,
    },
    /// Signed document handed to the document manager; only the delivery settles it
    Delivering { signature_fingerprint: Vec<u8> },
    Done(JobCompletion),
    Failed(FailureKind),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobCompletion {
    /// SHA-256 of the accepted signature value
    pub signature_fingerprint: Vec<u8>,
    pub document: SignedDocument,
}

/// Result of trying to claim a job for post-sign completion
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionClaim {
    Proceed,
    /// Same signature already completed; nothing to store again
    Completed(SignedDocument),
    /// Completed with a different signature
    Conflict,
    /// Another request is completing the job
    InProgress,
    /// The job failed during pre-sign
    Unavailable(FailureKind),
}
