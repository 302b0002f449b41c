use crate::utils::error::{IngestError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

// Greedy and dot-matches-newline: spans from the first '[' to the last ']'.
static ARRAY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("array pattern is valid"));

/// Recover a JSON value from raw model output.
///
/// The whole text is parsed first. Failing that, the first bracketed region is
/// cut out and parsed on its own, which handles prose or markdown fences around
/// the array. When several arrays appear, the region spans all of them and
/// usually fails to parse; no attempt is made to pick one.
pub fn recover(text: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    let candidate = ARRAY_PATTERN
        .find(text)
        .ok_or_else(|| IngestError::recovery("no bracketed array in model output"))?;

    tracing::debug!(
        start = candidate.start(),
        end = candidate.end(),
        "Strict parse failed, retrying on embedded array"
    );

    serde_json::from_str(candidate.as_str())
        .map_err(|e| IngestError::recovery(format!("embedded array is not valid JSON: {}", e)))
}
