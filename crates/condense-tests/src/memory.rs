//! In-memory port implementations for tests.

use async_trait::async_trait;
use condense_core::error::SummarizeFailure;
use condense_core::ids::JobId;
use condense_core::job::{Job, JobTransition, SummaryInput, TransitionOutcome};
use condense_core::ports::{Acker, Delivery, JobQueue, JobStore, Summarizer};
use condense_core::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Job store backed by a process-local map.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, input: SummaryInput) -> Result<Job> {
        let job = Job::new(input);
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn apply(&self, id: JobId, transition: JobTransition) -> Result<Job> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| Error::JobNotFound(id.to_string()))?;

        if job.apply(transition.clone()) == TransitionOutcome::Ignored {
            warn!(job_id = %id, transition = transition.name(), "Ignoring illegal transition");
        }

        Ok(job.clone())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Work queue backed by an unbounded channel. Nak re-sends the job id after
/// the requested delay; redelivery on a missed ack is not simulated.
pub struct MemoryJobQueue {
    tx: mpsc::UnboundedSender<JobId>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<JobId>>,
}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }
    }
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job_id: JobId) -> Result<()> {
        self.tx
            .send(job_id)
            .map_err(|_| Error::BackendDegraded("Queue channel closed".to_string()))
    }

    async fn dequeue(&self) -> Result<Delivery> {
        let job_id = self
            .rx
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| Error::Queue("Queue channel closed".to_string()))?;

        Ok(Delivery::new(
            job_id,
            Box::new(MemoryAcker {
                job_id,
                tx: self.tx.clone(),
            }),
        ))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

struct MemoryAcker {
    job_id: JobId,
    tx: mpsc::UnboundedSender<JobId>,
}

#[async_trait]
impl Acker for MemoryAcker {
    async fn ack(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    async fn nak(self: Box<Self>, delay: Duration) -> Result<()> {
        let tx = self.tx.clone();
        let job_id = self.job_id;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(job_id);
        });
        Ok(())
    }
}

/// One scripted collaborator response.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Ok(String),
    Transient(String),
    Permanent(String),
}

/// Collaborator double that replays a script, then echoes a default summary.
pub struct ScriptedSummarizer {
    steps: Mutex<VecDeque<ScriptStep>>,
    calls: AtomicU32,
}

impl Default for ScriptedSummarizer {
    fn default() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
        }
    }
}

impl ScriptedSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of collaborator invocations so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(
        &self,
        input: &SummaryInput,
    ) -> std::result::Result<String, SummarizeFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(ScriptStep::Ok(summary)) => Ok(summary),
            Some(ScriptStep::Transient(message)) => Err(SummarizeFailure::Transient(message)),
            Some(ScriptStep::Permanent(message)) => Err(SummarizeFailure::Permanent(message)),
            None => Ok(format!("summary: {}", input.text)),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
