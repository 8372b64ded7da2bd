use shared_types::DocumentRef;
use strum::{Display, EnumString};
use thiserror::Error;

use super::batch::FailureKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SignatureFormat {
    CAdES,
    XAdES,
    PAdES,
}

/// Whether the signed content travels inside the signature container
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SignatureMode {
    #[default]
    Implicit,
    Explicit,
}

/// Per-document override of the request level parameters.
///
/// The format is kept unparsed so an unknown identifier only fails its own job.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobSettings {
    pub format: Option<String>,
    pub mode: Option<SignatureMode>,
    pub content_description: Option<String>,
}

/// Raw signature value computed by the client
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureValue(Vec<u8>);

impl SignatureValue {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for SignatureValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobPhase {
    Pre,
    Post { signature: SignatureValue },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentJob {
    pub reference: DocumentRef,
    pub settings: JobSettings,
    pub phase: JobPhase,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobState {
    Received,
    PreBuilt,
    AwaitingSignature,
    PostAssembled,
    Done,
    Failed(FailureKind),
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("Illegal transition of job `{reference}` from {from:?} to {to:?}")]
pub struct IllegalTransition {
    pub reference: DocumentRef,
    pub from: JobState,
    pub to: JobState,
}

/// Tracks the state of one document while a request is being processed.
#[derive(Debug)]
pub struct JobLifecycle {
    reference: DocumentRef,
    state: JobState,
}

impl JobLifecycle {
    pub fn received(reference: DocumentRef) -> Self {
        Self {
            reference,
            state: JobState::Received,
        }
    }

    /// Resumes a job whose pre-sign artifact was handed out by an earlier request
    pub fn awaiting_signature(reference: DocumentRef) -> Self {
        Self {
            reference,
            state: JobState::AwaitingSignature,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn advance(&mut self, next: JobState) -> Result<(), IllegalTransition> {
        if !is_allowed(&self.state, &next) {
            return Err(IllegalTransition {
                reference: self.reference.clone(),
                from: self.state.clone(),
                to: next,
            });
        }

        tracing::debug!(
            "Job `{}`: {:?} -> {:?}",
            self.reference,
            self.state,
            next
        );
        self.state = next;
        Ok(())
    }

    pub fn fail(&mut self, kind: FailureKind) -> Result<(), IllegalTransition> {
        self.advance(JobState::Failed(kind))
    }
}

fn is_allowed(from: &JobState, to: &JobState) -> bool {
    match (from, to) {
        (JobState::Failed(_), _) => false,
        (_, JobState::Failed(_)) => true,
        (JobState::Received, JobState::PreBuilt)
        | (JobState::PreBuilt, JobState::AwaitingSignature)
        | (JobState::AwaitingSignature, JobState::PostAssembled)
        | (JobState::PostAssembled, JobState::Done) => true,
        _ => false,
    }
}
