use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use flowsmith_core::{DiagramKind, GenerationResult};

use crate::repair::repair;

/// Code fences at the start of a line (with optional language tag) or at the end of one.
static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```[\w-]*|```$").expect("fence pattern compiles"));

/// A single quote that closes a key, i.e. one followed by optional whitespace and a colon.
static KEY_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'(\s*:)").expect("key quote pattern compiles"));

/// Why a completion could not be turned into diagram markup.
/// The display text is what the caller sees.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Could not find valid JSON in response:\n{cleaned}")]
    NoJson { cleaned: String },

    #[error("JSON Error: {source}\nExtracted JSON: {extracted}")]
    Json {
        source: serde_json::Error,
        extracted: String,
    },

    #[error("Invalid diagram syntax")]
    InvalidSyntax,

    #[error("Processing Error: {0}")]
    Processing(String),
}

/// Turn a raw completion into a [`GenerationResult`]. Never fails: every
/// problem becomes a [`GenerationResult::Failure`].
pub fn normalize(raw: &str) -> GenerationResult {
    match try_normalize(raw) {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, "completion rejected");
            GenerationResult::failure(err.to_string())
        }
    }
}

fn try_normalize(raw: &str) -> Result<GenerationResult, NormalizeError> {
    let cleaned = clean(raw);

    let span = extract_object(&cleaned).ok_or_else(|| NormalizeError::NoJson {
        cleaned: cleaned.clone(),
    })?;
    debug!(extracted = %span, "extracted JSON object");

    let data: Map<String, Value> =
        serde_json::from_str(span).map_err(|source| NormalizeError::Json {
            source,
            extracted: span.to_string(),
        })?;

    // No `code` key: hand the object back untouched.
    if !data.contains_key("code") {
        return Ok(GenerationResult::Passthrough(data));
    }

    let code = match &data["code"] {
        Value::String(code) => finish(code)?,
        other => {
            return Err(NormalizeError::Processing(format!(
                "`code` must be a string, got {}",
                json_type(other)
            )))
        }
    };
    Ok(GenerationResult::success(code))
}

/// Restore escaped newlines, apply the dialect repair and check the keyword gate.
pub fn finish(code: &str) -> Result<String, NormalizeError> {
    let code = code.replace("\\n", "\n");
    let code = repair(&code);
    if DiagramKind::detect(&code).is_none() {
        return Err(NormalizeError::InvalidSyntax);
    }
    Ok(code)
}

/// Strip code fences and coerce single-quoted keys into double-quoted ones.
pub fn clean(raw: &str) -> String {
    let without_fences = FENCE.replace_all(raw.trim(), "");
    KEY_QUOTE
        .replace_all(&without_fences, "\"$1")
        .into_owned()
}

/// Greedy span from the first `{` to the last `}`.
pub fn extract_object(cleaned: &str) -> Option<&str> {
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&cleaned[start..=end])
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
