//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the core domain and external
//! adapters: the cache and queue backends, the summarization collaborator,
//! and lifecycle observers.

use crate::error::{Result, SummarizeFailure};
use crate::events::JobEvent;
use crate::ids::JobId;
use crate::job::{Job, JobTransition, SummaryInput};
use async_trait::async_trait;
use std::time::Duration;

/// Content-addressed result cache.
///
/// `get` and `set` degrade rather than fail: a backend outage must surface
/// as a miss (logged by the implementation), never as an error on the
/// request path.
#[async_trait]
pub trait ContentCache: Send + Sync {
    /// Look up a cached summary for the given text. Backend failures
    /// degrade to `None`.
    async fn get(&self, text: &str) -> Option<String>;

    /// Look up by precomputed fingerprint; used to resolve cache handles.
    async fn get_by_fingerprint(&self, fp: &str) -> Option<String>;

    /// Store a summary. Failures are logged by the implementation and
    /// reported in the return value; callers treat them as non-fatal.
    async fn set(&self, text: &str, value: &str, ttl: Duration) -> bool;

    /// Drop any cached value for the given text.
    async fn invalidate(&self, text: &str) -> bool;

    /// Health probe for the backing store.
    async fn ping(&self) -> Result<()>;

    /// Short label for the active backend, surfaced in health output.
    fn backend(&self) -> &'static str;
}

/// Durable mapping from job id to job state.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new job in `Pending` state.
    async fn create(&self, input: SummaryInput) -> Result<Job>;

    /// Fetch a job. Unknown ids are `None`, never an error.
    async fn get(&self, id: JobId) -> Result<Option<Job>>;

    /// Apply a state transition and persist the result.
    ///
    /// Writes are revision-checked per job id and retried on conflict, so
    /// concurrent redeliveries cannot produce lost updates. Transitions that
    /// the state machine rejects leave the job unchanged; implementations
    /// log them as anomalies and return the stored job.
    async fn apply(&self, id: JobId, transition: JobTransition) -> Result<Job>;

    /// Health probe for the backing store.
    async fn ping(&self) -> Result<()>;
}

/// Durable work queue with at-least-once delivery.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for execution.
    async fn enqueue(&self, job_id: JobId) -> Result<()>;

    /// Block until a delivery is available.
    async fn dequeue(&self) -> Result<Delivery>;

    /// Health probe for the backing queue.
    async fn ping(&self) -> Result<()>;
}

/// A single queue delivery. Dropping it without acking leaves the message
/// for redelivery after the backend's ack deadline.
pub struct Delivery {
    pub job_id: JobId,
    acker: Box<dyn Acker>,
}

impl Delivery {
    pub fn new(job_id: JobId, acker: Box<dyn Acker>) -> Self {
        Self { job_id, acker }
    }

    /// Acknowledge the delivery; the message will not be redelivered.
    pub async fn ack(self) -> Result<()> {
        self.acker.ack().await
    }

    /// Negatively acknowledge, requesting redelivery after `delay`.
    pub async fn nak(self, delay: Duration) -> Result<()> {
        self.acker.nak(delay).await
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("job_id", &self.job_id)
            .finish_non_exhaustive()
    }
}

/// Backend-specific acknowledgment for a delivery.
#[async_trait]
pub trait Acker: Send + Sync {
    async fn ack(self: Box<Self>) -> Result<()>;
    async fn nak(self: Box<Self>, delay: Duration) -> Result<()>;
}

/// The external summarization collaborator.
///
/// Treated as an opaque remote operation with unspecified latency; failures
/// are classified transient (retryable) or permanent.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        input: &SummaryInput,
    ) -> std::result::Result<String, SummarizeFailure>;

    /// Health probe for the collaborator (configuration or reachability).
    async fn ping(&self) -> Result<()>;
}

/// Observer of job lifecycle events, decoupled from the worker loop.
pub trait JobObserver: Send + Sync {
    fn on_event(&self, event: &JobEvent);
}
