//! JetStream work queue.

use crate::config::NatsConfig;
use async_nats::jetstream::{self, AckKind, consumer::pull, stream};
use async_trait::async_trait;
use condense_core::ids::JobId;
use condense_core::ports::{Acker, Delivery, JobQueue};
use condense_core::{Error, Result};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Work queue on a JetStream work-queue stream with a durable pull consumer.
///
/// Explicit acks give at-least-once delivery: a worker that crashes after
/// dequeue leaves its message unacked, and the server redelivers it after
/// `ack_wait`. Backoff between retries rides on nak-with-delay.
///
/// The message stream is opened on first `dequeue`, so a handle held only
/// for enqueueing (the API server's) never buffers deliveries away from the
/// worker pool.
pub struct NatsJobQueue {
    jetstream: jetstream::Context,
    subject: String,
    stream_name: String,
    consumer: jetstream::consumer::Consumer<pull::Config>,
    messages: Mutex<Option<pull::Stream>>,
}

impl NatsJobQueue {
    pub async fn create(jetstream: &jetstream::Context, config: &NatsConfig) -> Result<Self> {
        let stream = jetstream
            .get_or_create_stream(stream::Config {
                name: config.stream_name.clone(),
                subjects: vec![config.subject.clone()],
                retention: stream::RetentionPolicy::WorkQueue,
                storage: stream::StorageType::File,
                max_age: config.max_age,
                ..Default::default()
            })
            .await
            .map_err(|e| {
                Error::BackendDegraded(format!(
                    "Failed to create stream {}: {}",
                    config.stream_name, e
                ))
            })?;

        let consumer = stream
            .create_consumer(pull::Config {
                durable_name: Some(config.consumer_name.clone()),
                ack_policy: jetstream::consumer::AckPolicy::Explicit,
                ack_wait: config.ack_wait,
                ..Default::default()
            })
            .await
            .map_err(|e| {
                Error::BackendDegraded(format!(
                    "Failed to create consumer {}: {}",
                    config.consumer_name, e
                ))
            })?;

        info!(
            stream = %config.stream_name,
            consumer = %config.consumer_name,
            "Work queue ready"
        );

        Ok(Self {
            jetstream: jetstream.clone(),
            subject: config.subject.clone(),
            stream_name: config.stream_name.clone(),
            consumer,
            messages: Mutex::new(None),
        })
    }
}

#[async_trait]
impl JobQueue for NatsJobQueue {
    async fn enqueue(&self, job_id: JobId) -> Result<()> {
        let ack = self
            .jetstream
            .publish(self.subject.clone(), job_id.to_string().into())
            .await
            .map_err(|e| Error::BackendDegraded(format!("Failed to enqueue {}: {}", job_id, e)))?;

        ack.await
            .map_err(|e| Error::BackendDegraded(format!("Enqueue of {} unacked: {}", job_id, e)))?;

        Ok(())
    }

    async fn dequeue(&self) -> Result<Delivery> {
        let mut messages = self.messages.lock().await;

        if messages.is_none() {
            let stream = self.consumer.messages().await.map_err(|e| {
                Error::Queue(format!("Failed to open message stream: {}", e))
            })?;
            *messages = Some(stream);
        }

        loop {
            let next = messages
                .as_mut()
                .expect("message stream opened above")
                .next()
                .await;

            let message = match next {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    // Drop the broken stream; the next dequeue reopens it.
                    *messages = None;
                    return Err(Error::Queue(format!("Message stream error: {}", e)));
                }
                None => {
                    *messages = None;
                    return Err(Error::Queue("Message stream closed".to_string()));
                }
            };

            let payload = String::from_utf8_lossy(&message.payload);
            match payload.parse::<JobId>() {
                Ok(job_id) => {
                    return Ok(Delivery::new(job_id, Box::new(JsAcker { message })));
                }
                Err(_) => {
                    // A payload that is not a job id can never be processed;
                    // redelivering it forever would wedge the queue.
                    warn!(payload = %payload, "Discarding malformed queue message");
                    if let Err(e) = message.ack().await {
                        warn!(error = %e, "Failed to ack malformed message");
                    }
                }
            }
        }
    }

    async fn ping(&self) -> Result<()> {
        self.jetstream
            .get_stream(&self.stream_name)
            .await
            .map(|_| ())
            .map_err(|e| Error::BackendDegraded(format!("Queue stream unavailable: {}", e)))
    }
}

struct JsAcker {
    message: jetstream::Message,
}

#[async_trait]
impl Acker for JsAcker {
    async fn ack(self: Box<Self>) -> Result<()> {
        self.message
            .ack()
            .await
            .map_err(|e| Error::Queue(format!("Ack failed: {}", e)))
    }

    async fn nak(self: Box<Self>, delay: Duration) -> Result<()> {
        self.message
            .ack_with(AckKind::Nak(Some(delay)))
            .await
            .map_err(|e| Error::Queue(format!("Nak failed: {}", e)))
    }
}
