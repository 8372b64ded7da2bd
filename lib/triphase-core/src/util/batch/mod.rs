//! Concurrent execution of independent document jobs under a shared deadline

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::config::core_config::TriphaseConfig;
use crate::model::batch::{BatchResult, JobFailure, JobOutcome};


#[derive(Clone, Debug)]
pub struct BatchCoordinator {
    max_concurrency: usize,
    timeout: Duration,
}

impl BatchCoordinator {
    pub fn new(max_concurrency: usize, timeout: Duration) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            timeout,
        }
    }

    pub fn from_config(config: &TriphaseConfig) -> Self {
        Self::new(config.batch_max_concurrency(), config.batch_timeout())
    }

    /// Runs `operation` for every job, at most `max_concurrency` at a time.
    ///
    /// The result has one entry per job in input order. A job that panics yields an
    /// internal failure, a job unfinished at the deadline is aborted and yields a timeout.
    pub async fn run<I, T, F, Fut>(&self, jobs: Vec<I>, operation: F) -> BatchResult<T>
    where
        T: Send + 'static,
        F: Fn(usize, I) -> Fut,
        Fut: Future<Output = JobOutcome<T>> + Send + 'static,
    {
        let deadline = Instant::now() + self.timeout;
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        let mut slots: Vec<Option<JobOutcome<T>>> = jobs.iter().map(|_| None).collect();
        let mut task_indices = HashMap::new();
        let mut tasks = JoinSet::new();

        for (index, job) in jobs.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let job = operation(index, job);

            let handle = tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| JobFailure::internal("Batch worker pool closed"))?;
                job.await
            });
            task_indices.insert(handle.id(), index);
        }

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next_with_id()).await {
                Ok(None) => break,
                Ok(Some(Ok((id, outcome)))) => {
                    if let Some(index) = task_indices.get(&id) {
                        slots[*index] = Some(outcome);
                    }
                }
                Ok(Some(Err(error))) => {
                    if let Some(index) = task_indices.get(&error.id()) {
                        tracing::error!("Job {index} terminated abnormally: {error}");
                        slots[*index] = Some(Err(JobFailure::internal(
                            "Job terminated abnormally",
                        )));
                    }
                }
                Err(_) => {
                    tracing::warn!(
                        "Batch deadline of {:?} exceeded, aborting {} unfinished jobs",
                        self.timeout,
                        tasks.len()
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(JobFailure::timeout())))
            .collect()
    }
}
