//! Condense Core
//!
//! Core domain types, traits, and error handling for Condense.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used across all other crates.

pub mod error;
pub mod events;
pub mod fingerprint;
pub mod ids;
pub mod job;
pub mod ports;

pub use error::{Error, Result};
pub use ids::*;
