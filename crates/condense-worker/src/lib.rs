//! Background worker for Condense.
//!
//! Pulls jobs from the work queue, drives them through the state machine,
//! invokes the summarization collaborator with retry and backoff, and
//! writes results through to the content cache.

mod config;
mod observer;
mod worker;

pub use config::WorkerConfig;
pub use observer::LogObserver;
pub use worker::Worker;
