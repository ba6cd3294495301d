//! Request fixtures.

use condense_core::job::SummaryInput;
use serde_json::{Value, json};

pub const SAMPLE_TEXT: &str = "The quick brown fox jumps over the lazy dog.";

/// A valid summarize request body with default parameters.
pub fn summarize_body(text: &str) -> Value {
    json!({ "text": text })
}

/// A summarize request body with explicit parameters.
pub fn summarize_body_with(
    text: &str,
    length: &str,
    format: &str,
    extractiveness: &str,
) -> Value {
    json!({
        "text": text,
        "length": length,
        "format": format,
        "extractiveness": extractiveness,
    })
}

/// A validated input with default parameters.
pub fn sample_input() -> SummaryInput {
    SummaryInput::parse(SAMPLE_TEXT.to_string(), None, None, None).unwrap()
}
