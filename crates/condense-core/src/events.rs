//! Job lifecycle events.
//!
//! Every state transition produces a [`JobEvent`] consumed by observers
//! (logging, metrics) registered with the worker, keeping side channels out
//! of the worker's core loop.

use crate::ids::JobId;
use crate::job::JobState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    pub job_id: JobId,
    pub kind: JobEventKind,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEventKind {
    Started,
    Retrying { attempt: u32, error: String },
    Succeeded,
    Failed { error: String },
    Revoked,
}

impl JobEvent {
    pub fn new(job_id: JobId, kind: JobEventKind) -> Self {
        Self {
            job_id,
            kind,
            at: Utc::now(),
        }
    }

    /// Subject for this event on an event stream.
    pub fn subject(&self) -> String {
        format!("job.{}.{}", self.state(), self.job_id)
    }

    /// The state the job entered with this event.
    pub fn state(&self) -> JobState {
        match &self.kind {
            JobEventKind::Started => JobState::Started,
            JobEventKind::Retrying { .. } => JobState::Retrying,
            JobEventKind::Succeeded => JobState::Succeeded,
            JobEventKind::Failed { .. } => JobState::Failed,
            JobEventKind::Revoked => JobState::Revoked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_includes_kind_and_id() {
        let id = JobId::new();
        let event = JobEvent::new(id, JobEventKind::Succeeded);
        assert_eq!(event.subject(), format!("job.succeeded.{}", id));
    }

    #[test]
    fn test_event_serializes_tagged() {
        let event = JobEvent::new(
            JobId::new(),
            JobEventKind::Retrying {
                attempt: 2,
                error: "upstream 503".to_string(),
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "retrying");
        assert_eq!(json["kind"]["attempt"], 2);
    }
}
