//! JetStream KV job store.

use crate::config::NatsConfig;
use async_nats::jetstream;
use async_nats::jetstream::kv;
use async_trait::async_trait;
use condense_core::ids::JobId;
use condense_core::job::{Job, JobTransition, SummaryInput, TransitionOutcome};
use condense_core::ports::JobStore;
use condense_core::{Error, Result};
use tracing::{debug, warn};

/// How many times a revision-conflicted update is retried before giving up.
const MAX_CAS_RETRIES: u32 = 5;

/// Job store on a JetStream KV bucket.
///
/// Each job is one key; transitions are applied read-modify-write with the
/// entry revision, so two workers racing on a redelivered job cannot lose
/// updates: the slower write conflicts, rereads, and the state machine
/// ignores the now-illegal transition.
pub struct KvJobStore {
    store: kv::Store,
}

impl KvJobStore {
    pub async fn create(jetstream: &jetstream::Context, config: &NatsConfig) -> Result<Self> {
        let store = jetstream
            .create_key_value(kv::Config {
                bucket: config.jobs_bucket.clone(),
                max_age: config.max_age,
                ..Default::default()
            })
            .await
            .map_err(|e| {
                Error::BackendDegraded(format!(
                    "Failed to open jobs bucket {}: {}",
                    config.jobs_bucket, e
                ))
            })?;

        Ok(Self { store })
    }

    fn key(id: JobId) -> String {
        id.to_string()
    }

    fn decode(bytes: &[u8]) -> Result<Job> {
        serde_json::from_slice(bytes).map_err(|e| Error::Store(format!("Corrupt job record: {}", e)))
    }
}

#[async_trait]
impl JobStore for KvJobStore {
    async fn create(&self, input: SummaryInput) -> Result<Job> {
        let job = Job::new(input);
        let payload = serde_json::to_vec(&job)?;
        let key = Self::key(job.id);

        self.store
            .put(key.as_str(), payload.into())
            .await
            .map_err(|e| Error::Store(format!("Failed to persist job {}: {}", job.id, e)))?;

        debug!(job_id = %job.id, "Job created");
        Ok(job)
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>> {
        let entry = self
            .store
            .entry(Self::key(id))
            .await
            .map_err(|e| Error::Store(format!("Failed to read job {}: {}", id, e)))?;

        match entry {
            Some(entry) => Ok(Some(Self::decode(&entry.value)?)),
            None => Ok(None),
        }
    }

    async fn apply(&self, id: JobId, transition: JobTransition) -> Result<Job> {
        let key = Self::key(id);

        for attempt in 0..MAX_CAS_RETRIES {
            let entry = self
                .store
                .entry(key.as_str())
                .await
                .map_err(|e| Error::Store(format!("Failed to read job {}: {}", id, e)))?
                .ok_or_else(|| Error::JobNotFound(id.to_string()))?;

            let mut job = Self::decode(&entry.value)?;
            let from = job.state;

            if job.apply(transition.clone()) == TransitionOutcome::Ignored {
                warn!(
                    job_id = %id,
                    state = %from,
                    transition = transition.name(),
                    "Ignoring illegal transition"
                );
                return Ok(job);
            }

            let payload = serde_json::to_vec(&job)?;
            match self
                .store
                .update(key.as_str(), payload.into(), entry.revision)
                .await
            {
                Ok(_) => {
                    debug!(job_id = %id, from = %from, to = %job.state, "Job transitioned");
                    return Ok(job);
                }
                Err(e) => {
                    debug!(
                        job_id = %id,
                        attempt,
                        error = %e,
                        "Revision conflict on job update; retrying"
                    );
                }
            }
        }

        Err(Error::Store(format!(
            "Gave up applying {} to job {} after {} conflicts",
            transition.name(),
            id,
            MAX_CAS_RETRIES
        )))
    }

    async fn ping(&self) -> Result<()> {
        self.store
            .status()
            .await
            .map(|_| ())
            .map_err(|e| Error::BackendDegraded(format!("Jobs bucket unavailable: {}", e)))
    }
}
