//! HTTP adapter for the summarization collaborator.
//!
//! The service treats summarization as an opaque remote call: text and
//! parameters go in, a summary string or a classified failure comes out.
//! Connection problems, timeouts, and server-side errors are transient
//! (the worker retries with backoff); input rejections are permanent.

use async_trait::async_trait;
use condense_core::error::SummarizeFailure;
use condense_core::job::SummaryInput;
use condense_core::ports::Summarizer;
use condense_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Configuration for the hosted summarization API.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Per-request timeout. Kept below the worker's task timeout so the
    /// client gives up before the job-level deadline fires.
    pub request_timeout: Duration,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cohere.ai".to_string(),
            api_key: String::new(),
            model: "summarize-xlarge".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Serialize)]
struct SummarizeBody<'a> {
    text: &'a str,
    length: &'a str,
    format: &'a str,
    extractiveness: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct SummarizeReply {
    summary: String,
}

/// reqwest-backed [`Summarizer`].
pub struct HttpSummarizer {
    client: reqwest::Client,
    config: SummarizerConfig,
}

impl HttpSummarizer {
    pub fn new(config: SummarizerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/summarize", self.config.base_url)
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(
        &self,
        input: &SummaryInput,
    ) -> std::result::Result<String, SummarizeFailure> {
        let body = SummarizeBody {
            text: &input.text,
            length: input.length.as_str(),
            format: input.format.as_str(),
            extractiveness: input.extractiveness.as_str(),
            model: &self.config.model,
        };

        debug!(chars = input.text.len(), "Requesting summary");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let message = format!("Summarization API returned {}: {}", status, detail);
            return if status.as_u16() == 408
                || status.as_u16() == 429
                || status.is_server_error()
            {
                Err(SummarizeFailure::Transient(message))
            } else {
                Err(SummarizeFailure::Permanent(message))
            };
        }

        let reply: SummarizeReply = response
            .json()
            .await
            .map_err(|e| SummarizeFailure::Permanent(format!("Malformed API response: {}", e)))?;

        Ok(reply.summary)
    }

    async fn ping(&self) -> Result<()> {
        if self.config.api_key.trim().is_empty() {
            return Err(Error::BackendDegraded(
                "Summarizer API key is not configured".to_string(),
            ));
        }
        Ok(())
    }
}

fn classify_request_error(e: reqwest::Error) -> SummarizeFailure {
    // The request never produced a response; nothing committed upstream,
    // safe to retry.
    SummarizeFailure::Transient(format!("Summarization request failed: {}", e))
}
