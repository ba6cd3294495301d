//! Lifecycle observers.

use condense_core::events::{JobEvent, JobEventKind};
use condense_core::ports::JobObserver;
use tracing::{info, warn};

/// Observer that logs every lifecycle event.
#[derive(Default)]
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

impl JobObserver for LogObserver {
    fn on_event(&self, event: &JobEvent) {
        match &event.kind {
            JobEventKind::Started => {
                info!(job_id = %event.job_id, "Job started");
            }
            JobEventKind::Retrying { attempt, error } => {
                warn!(job_id = %event.job_id, attempt, error = %error, "Job retrying");
            }
            JobEventKind::Succeeded => {
                info!(job_id = %event.job_id, "Job succeeded");
            }
            JobEventKind::Failed { error } => {
                warn!(job_id = %event.job_id, error = %error, "Job failed");
            }
            JobEventKind::Revoked => {
                info!(job_id = %event.job_id, "Job revoked");
            }
        }
    }
}
