//! Test harness for Condense.
//!
//! In-memory implementations of the store, queue, and collaborator ports,
//! plus helpers for standing up an API server on an ephemeral port. The
//! doubles live here rather than in the backend crates because only tests
//! use them; the production fallback cache lives in `condense-cache`.

pub mod fixtures;
pub mod helpers;
pub mod memory;
