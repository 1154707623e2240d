//! Response parsing: recover a JSON record array from raw model output.
//!
//! ## Why not parse the response strictly?
//!
//! Vision models frequently wrap their JSON in prose ("Here is the table:")
//! or markdown fences despite the prompt saying not to. Bracket-scanning is
//! a defensive best-effort extraction boundary: strip any outer fence, take
//! the substring from the first `[` to the last `]`, and hand that to a
//! strict JSON deserializer. Everything past this module only ever sees a
//! clean record sequence or a typed failure.
//!
//! What this module deliberately does **not** do is repair malformed JSON
//! inside the brackets — a truncated or invalid array is a hard
//! [`ParseError::Json`], reported with the offending image's filename by the
//! caller and treated as zero rows for that image.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// One loosely-typed record as emitted by the model: an ordered mapping of
/// field name to JSON value. Field heterogeneity across records is expected.
pub type Record = Map<String, Value>;

/// Failure to locate or decode the JSON array in a model response.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The response contains no `[` or no `]` after it.
    #[error("no JSON array found in response")]
    NoArray,

    /// The bracketed candidate is not a valid JSON array of objects.
    #[error("invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload parsed, but is not an array of objects.
    #[error("JSON payload is not an array of objects")]
    NotObjectArray,
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*\n?(.*?)\n?```\s*$").unwrap());

/// Strip an outer triple-backtick fence (with or without a language tag).
///
/// Only a fence wrapping the *entire* trimmed response is removed; fences
/// embedded in surrounding prose are left for the bracket scan to skip past.
fn strip_fences(input: &str) -> &str {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => input,
    }
}

/// Extract the ordered record sequence from raw model response text.
///
/// Locates the first `[` and the last `]` in the fence-stripped text and
/// deserializes the inclusive substring as a JSON array of objects.
///
/// # Errors
/// [`ParseError::NoArray`] when no bracketed candidate exists,
/// [`ParseError::Json`] when the candidate is not valid JSON,
/// [`ParseError::NotObjectArray`] when array elements are not objects.
pub fn parse_records(raw: &str) -> Result<Vec<Record>, ParseError> {
    let text = strip_fences(raw);

    let start = text.find('[').ok_or(ParseError::NoArray)?;
    let end = text.rfind(']').ok_or(ParseError::NoArray)?;
    if end < start {
        return Err(ParseError::NoArray);
    }

    let candidate = &text[start..=end];
    let values: Vec<Value> = serde_json::from_str(candidate)?;

    values
        .into_iter()
        .map(|v| match v {
            Value::Object(map) => Ok(map),
            _ => Err(ParseError::NotObjectArray),
        })
        .collect()
}
