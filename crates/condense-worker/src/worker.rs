//! Worker loop and per-job processing.

use crate::config::WorkerConfig;
use condense_core::error::SummarizeFailure;
use condense_core::events::{JobEvent, JobEventKind};
use condense_core::job::{Job, JobState, JobTransition};
use condense_core::ports::{ContentCache, Delivery, JobObserver, JobQueue, JobStore, Summarizer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// How long to pause the loop after a dequeue failure before trying again.
const DEQUEUE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Redelivery delay requested when a store write fails mid-processing.
const STORE_RETRY_DELAY: Duration = Duration::from_secs(5);

/// A summarization worker.
///
/// Several worker tasks may run concurrently against the same queue
/// consumer; queue delivery semantics keep any one delivery on a single
/// task, and store writes are revision-checked to tolerate redeliveries.
pub struct Worker {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn JobQueue>,
    cache: Arc<dyn ContentCache>,
    summarizer: Arc<dyn Summarizer>,
    observers: Vec<Arc<dyn JobObserver>>,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
        cache: Arc<dyn ContentCache>,
        summarizer: Arc<dyn Summarizer>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            queue,
            cache,
            summarizer,
            observers: Vec::new(),
            config,
        }
    }

    /// Register a lifecycle observer. Observers run inline after each
    /// transition and must not block.
    pub fn with_observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Run the worker loop until `shutdown` flips to true.
    ///
    /// The shutdown signal is only honored between deliveries; an in-flight
    /// job runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            max_retries = self.config.max_retries,
            task_timeout_secs = self.config.task_timeout_secs,
            "Worker started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender also means the process is going away.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Worker shutting down");
                        return;
                    }
                }
                delivery = self.queue.dequeue() => {
                    match delivery {
                        Ok(delivery) => self.process(delivery).await,
                        Err(e) => {
                            warn!(error = %e, "Dequeue failed; backing off");
                            tokio::time::sleep(DEQUEUE_RETRY_DELAY).await;
                        }
                    }
                }
            }
        }
    }

    /// Process one delivery through the job state machine.
    pub async fn process(&self, delivery: Delivery) {
        let job_id = delivery.job_id;

        let job = match self.store.get(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!(job_id = %job_id, "Delivery for unknown job; discarding");
                self.settle(delivery).await;
                return;
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Store read failed; requeueing");
                self.requeue(delivery, STORE_RETRY_DELAY).await;
                return;
            }
        };

        // Redelivery of an already-settled job (including a revoked one):
        // completion handling is idempotent, nothing left to do.
        if job.state.is_terminal() {
            debug!(job_id = %job_id, state = %job.state, "Delivery for settled job; discarding");
            self.settle(delivery).await;
            return;
        }

        let job = match self.store.apply(job_id, JobTransition::Start).await {
            Ok(job) => job,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Failed to start job; requeueing");
                self.requeue(delivery, STORE_RETRY_DELAY).await;
                return;
            }
        };

        // A revoke can land between the terminal check and the Start write;
        // the transition is then ignored and the stored state tells us so.
        if job.state != JobState::Started {
            debug!(job_id = %job_id, state = %job.state, "Job no longer startable; discarding");
            self.settle(delivery).await;
            return;
        }

        self.emit(JobEvent::new(job_id, JobEventKind::Started));

        let outcome = match timeout(
            self.config.task_timeout(),
            self.summarizer.summarize(&job.input),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(SummarizeFailure::Transient(format!(
                "Collaborator call exceeded {}s",
                self.config.task_timeout_secs
            ))),
        };

        match outcome {
            Ok(summary) => self.complete(delivery, &job, summary).await,
            Err(SummarizeFailure::Transient(message)) => {
                self.retry_or_fail(delivery, &job, message).await
            }
            Err(SummarizeFailure::Permanent(message)) => {
                self.fail(delivery, job_id, message).await
            }
        }
    }

    async fn complete(&self, delivery: Delivery, job: &Job, summary: String) {
        let job_id = job.id;

        // Last cancellation checkpoint: a revoke that arrived while the
        // collaborator was running means the result must not be committed.
        // A revoke landing after this read loses the race and the result
        // commits anyway; that is the documented best-effort contract.
        match self.store.get(job_id).await {
            Ok(Some(current)) if current.state == JobState::Revoked => {
                info!(job_id = %job_id, "Job revoked mid-flight; discarding result");
                self.settle(delivery).await;
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Revocation check failed; committing anyway");
            }
        }

        match self
            .store
            .apply(job_id, JobTransition::Succeed { result: summary.clone() })
            .await
        {
            Ok(updated) if updated.state == JobState::Succeeded => {
                // Write-through; keyed by fingerprint, so a duplicate
                // completion just overwrites with the same value.
                if !self
                    .cache
                    .set(&job.input.text, &summary, self.config.cache_ttl())
                    .await
                {
                    warn!(job_id = %job_id, "Result not cached; job still succeeded");
                }
                self.emit(JobEvent::new(job_id, JobEventKind::Succeeded));
                info!(job_id = %job_id, chars = summary.len(), "Job succeeded");
            }
            Ok(updated) => {
                debug!(job_id = %job_id, state = %updated.state, "Completion raced a settled state");
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Failed to record success; requeueing");
                self.requeue(delivery, STORE_RETRY_DELAY).await;
                return;
            }
        }

        self.settle(delivery).await;
    }

    async fn retry_or_fail(&self, delivery: Delivery, job: &Job, message: String) {
        let job_id = job.id;

        // attempt_count counts collaborator invocations already charged to
        // this job; the one that just failed makes it attempt_count + 1.
        if job.attempt_count + 1 >= self.config.max_retries {
            self.fail(delivery, job_id, message).await;
            return;
        }

        let job = match self
            .store
            .apply(job_id, JobTransition::Retry { error: message.clone() })
            .await
        {
            Ok(job) => job,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Failed to record retry; requeueing");
                self.requeue(delivery, STORE_RETRY_DELAY).await;
                return;
            }
        };

        if job.state != JobState::Retrying {
            debug!(job_id = %job_id, state = %job.state, "Retry raced a settled state");
            self.settle(delivery).await;
            return;
        }

        let delay = backoff_delay(self.config.retry_base(), job.attempt_count);
        warn!(
            job_id = %job_id,
            attempt = job.attempt_count,
            delay_secs = delay.as_secs(),
            error = %message,
            "Transient failure; scheduling retry"
        );
        self.emit(JobEvent::new(
            job_id,
            JobEventKind::Retrying {
                attempt: job.attempt_count,
                error: message,
            },
        ));

        if let Err(e) = delivery.nak(delay).await {
            warn!(job_id = %job_id, error = %e, "Nak failed; redelivery falls back to ack deadline");
        }
    }

    async fn fail(&self, delivery: Delivery, job_id: condense_core::ids::JobId, message: String) {
        match self
            .store
            .apply(job_id, JobTransition::Fail { error: message.clone() })
            .await
        {
            Ok(job) if job.state == JobState::Failed => {
                self.emit(JobEvent::new(job_id, JobEventKind::Failed { error: message }));
            }
            Ok(job) => {
                debug!(job_id = %job_id, state = %job.state, "Failure raced a settled state");
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Failed to record failure; requeueing");
                self.requeue(delivery, STORE_RETRY_DELAY).await;
                return;
            }
        }

        self.settle(delivery).await;
    }

    async fn settle(&self, delivery: Delivery) {
        let job_id = delivery.job_id;
        if let Err(e) = delivery.ack().await {
            warn!(job_id = %job_id, error = %e, "Ack failed; expect a redelivery");
        }
    }

    async fn requeue(&self, delivery: Delivery, delay: Duration) {
        let job_id = delivery.job_id;
        if let Err(e) = delivery.nak(delay).await {
            warn!(job_id = %job_id, error = %e, "Nak failed; redelivery falls back to ack deadline");
        }
    }

    fn emit(&self, event: JobEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }
}

/// Exponential backoff: `base * 2^(attempt - 1)` for the 1-based attempt
/// count recorded on the job.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_zero_attempt_clamps_to_base() {
        let base = Duration::from_secs(2);
        assert_eq!(backoff_delay(base, 0), Duration::from_secs(2));
    }
}
