//! Job and summarization input types.

use crate::error::{Error, Result};
use crate::ids::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested summary length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Length {
    Short,
    #[default]
    Medium,
    Long,
}

/// Requested summary format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    #[default]
    Paragraph,
    Bullets,
}

/// How closely the summary should stick to the source wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extractiveness {
    #[default]
    Low,
    High,
}

macro_rules! enum_str {
    ($ty:ident { $($variant:ident => $text:expr),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }

            pub fn parse_field(field: &str, value: &str) -> Result<Self> {
                match value {
                    $($text => Ok($ty::$variant),)+
                    other => Err(Error::Validation(format!(
                        "{} must be one of: {}; got {:?}",
                        field,
                        [$($text),+].join(", "),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

enum_str!(Length { Short => "short", Medium => "medium", Long => "long" });
enum_str!(Format { Paragraph => "paragraph", Bullets => "bullets" });
enum_str!(Extractiveness { Low => "low", High => "high" });

/// Validated summarization request parameters. Immutable after job creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryInput {
    pub text: String,
    pub length: Length,
    pub format: Format,
    pub extractiveness: Extractiveness,
}

impl SummaryInput {
    /// Validate raw request fields into a typed input.
    ///
    /// Missing optional fields take their defaults; invalid enum values and
    /// blank text are rejected before a job is created.
    pub fn parse(
        text: String,
        length: Option<&str>,
        format: Option<&str>,
        extractiveness: Option<&str>,
    ) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(Error::Validation("text must not be empty".to_string()));
        }

        Ok(Self {
            text,
            length: match length {
                Some(v) => Length::parse_field("length", v)?,
                None => Length::default(),
            },
            format: match format {
                Some(v) => Format::parse_field("format", v)?,
                None => Format::default(),
            },
            extractiveness: match extractiveness {
                Some(v) => Extractiveness::parse_field("extractiveness", v)?,
                None => Extractiveness::default(),
            },
        })
    }
}

/// Job lifecycle state.
///
/// `Pending → Started → {Succeeded | Retrying | Failed}`, `Retrying → Started`
/// after backoff, and `Pending|Started → Revoked` on external cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Started,
    Retrying,
    Succeeded,
    Failed,
    Revoked,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Revoked
        )
    }

    /// States in which a revoke request is honored.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, JobState::Pending | JobState::Started)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Started => "started",
            JobState::Retrying => "retrying",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::Revoked => "revoked",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state transition applied to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobTransition {
    Start,
    Succeed { result: String },
    Retry { error: String },
    Fail { error: String },
    Revoke,
}

impl JobTransition {
    pub fn name(&self) -> &'static str {
        match self {
            JobTransition::Start => "start",
            JobTransition::Succeed { .. } => "succeed",
            JobTransition::Retry { .. } => "retry",
            JobTransition::Fail { .. } => "fail",
            JobTransition::Revoke => "revoke",
        }
    }
}

/// Result of applying a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    /// The transition was not legal from the current state and was ignored.
    Ignored,
}

/// A unit of asynchronous summarization work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    pub input: SummaryInput,
    pub result: Option<String>,
    pub error: Option<String>,
    pub attempt_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(input: SummaryInput) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            state: JobState::Pending,
            input,
            result: None,
            error: None,
            attempt_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a transition, enforcing the state machine.
    ///
    /// Illegal transitions (including any transition out of a terminal state)
    /// leave the job untouched and return [`TransitionOutcome::Ignored`];
    /// callers log these as anomalies rather than failing.
    pub fn apply(&mut self, transition: JobTransition) -> TransitionOutcome {
        use JobState::*;

        let legal = match (&self.state, &transition) {
            (Pending, JobTransition::Start) => true,
            (Retrying, JobTransition::Start) => true,
            (Started, JobTransition::Succeed { .. }) => true,
            (Started, JobTransition::Retry { .. }) => true,
            (Started, JobTransition::Fail { .. }) => true,
            (Pending, JobTransition::Revoke) => true,
            (Started, JobTransition::Revoke) => true,
            _ => false,
        };

        if !legal {
            return TransitionOutcome::Ignored;
        }

        match transition {
            JobTransition::Start => {
                self.state = Started;
            }
            JobTransition::Succeed { result } => {
                self.state = Succeeded;
                self.result = Some(result);
                self.error = None;
            }
            JobTransition::Retry { error } => {
                self.state = Retrying;
                self.error = Some(error);
                self.attempt_count += 1;
            }
            JobTransition::Fail { error } => {
                self.state = Failed;
                self.error = Some(error);
                self.result = None;
            }
            JobTransition::Revoke => {
                self.state = Revoked;
            }
        }

        self.updated_at = Utc::now();
        TransitionOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input() -> SummaryInput {
        SummaryInput::parse("The quick brown fox.".to_string(), None, None, None).unwrap()
    }

    #[test]
    fn test_parse_defaults() {
        let input = input();
        assert_eq!(input.length, Length::Medium);
        assert_eq!(input.format, Format::Paragraph);
        assert_eq!(input.extractiveness, Extractiveness::Low);
    }

    #[test]
    fn test_parse_rejects_invalid_enum() {
        let err = SummaryInput::parse("text".to_string(), Some("urgent"), None, None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("length"));
    }

    #[test]
    fn test_parse_rejects_blank_text() {
        let err = SummaryInput::parse("   ".to_string(), None, None, None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = Job::new(input());
        assert_eq!(job.apply(JobTransition::Start), TransitionOutcome::Applied);
        assert_eq!(job.state, JobState::Started);

        let outcome = job.apply(JobTransition::Succeed {
            result: "A fox.".to_string(),
        });
        assert_eq!(outcome, TransitionOutcome::Applied);
        assert_eq!(job.state, JobState::Succeeded);
        assert_eq!(job.result.as_deref(), Some("A fox."));
        assert_eq!(job.error, None);
    }

    #[test]
    fn test_retry_increments_attempts_then_restart() {
        let mut job = Job::new(input());
        job.apply(JobTransition::Start);
        job.apply(JobTransition::Retry {
            error: "upstream 503".to_string(),
        });
        assert_eq!(job.state, JobState::Retrying);
        assert_eq!(job.attempt_count, 1);

        assert_eq!(job.apply(JobTransition::Start), TransitionOutcome::Applied);
        assert_eq!(job.state, JobState::Started);
    }

    #[test]
    fn test_failed_never_carries_result() {
        let mut job = Job::new(input());
        job.apply(JobTransition::Start);
        job.apply(JobTransition::Fail {
            error: "rejected".to_string(),
        });
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.result, None);
        assert_eq!(job.error.as_deref(), Some("rejected"));
    }

    #[test]
    fn test_terminal_states_are_frozen() {
        let mut job = Job::new(input());
        job.apply(JobTransition::Start);
        job.apply(JobTransition::Succeed {
            result: "done".to_string(),
        });

        for transition in [
            JobTransition::Start,
            JobTransition::Revoke,
            JobTransition::Fail {
                error: "late".to_string(),
            },
        ] {
            assert_eq!(job.apply(transition), TransitionOutcome::Ignored);
        }
        assert_eq!(job.state, JobState::Succeeded);
        assert_eq!(job.result.as_deref(), Some("done"));
        assert_eq!(job.error, None);
    }

    #[test]
    fn test_revoke_only_from_pending_or_started() {
        let mut job = Job::new(input());
        assert_eq!(job.apply(JobTransition::Revoke), TransitionOutcome::Applied);
        assert_eq!(job.state, JobState::Revoked);

        let mut job = Job::new(input());
        job.apply(JobTransition::Start);
        job.apply(JobTransition::Retry {
            error: "hiccup".to_string(),
        });
        // A revoke during the backoff window is ignored.
        assert_eq!(job.apply(JobTransition::Revoke), TransitionOutcome::Ignored);
        assert_eq!(job.state, JobState::Retrying);
    }

    #[test]
    fn test_succeed_from_pending_is_ignored() {
        let mut job = Job::new(input());
        let outcome = job.apply(JobTransition::Succeed {
            result: "skipped start".to_string(),
        });
        assert_eq!(outcome, TransitionOutcome::Ignored);
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.result, None);
    }
}
