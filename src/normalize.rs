//! Turns model text into typed lists.
//!
//! Models are asked for a JSON array but may fence it in a markdown code
//! block or wrap it in an object. Lookup order for the array:
//! 1. the top-level value itself,
//! 2. the value of a single-key object, when that value is an array,
//! 3. a `products` key holding an array.
//!
//! Step 2 accepts any key name, so an unrelated single-key object holding an
//! array is taken as the answer. Kept for compatibility with the prompts in
//! use today.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;

use crate::gemini::GeminiError;

pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest.trim();
    }
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.trim();
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest.trim();
    }
    body
}

fn unwrap_array(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            if map.len() == 1 {
                let (_, inner) = map.iter_mut().next()?;
                if inner.is_array() {
                    return match inner.take() {
                        Value::Array(items) => Some(items),
                        _ => None,
                    };
                }
            }
            match map.remove("products") {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Parses a model reply into a list of `T`, all-or-nothing.
pub fn parse_list<T: DeserializeOwned>(text: &str, what: &str) -> Result<Vec<T>, GeminiError> {
    let body = strip_code_fence(text);
    let value: Value = serde_json::from_str(body).map_err(|e| {
        error!("❌ Failed to parse JSON from AI response: {} ({})", body, e);
        GeminiError::Parse(format!("{what}: {e}"))
    })?;
    let items = unwrap_array(value).ok_or_else(|| {
        error!("❌ Parsed {} response is not an array", what);
        GeminiError::NotAnArray(what.to_string())
    })?;
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(|e| GeminiError::Parse(format!("{what}: {e}"))))
        .collect()
}
