/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Parsing of the script bridge's raw result strings. The renderer wraps
//! every evaluation in an envelope:
//! `{"success": bool, "type": str, "result": any, "stringResult"?: str,
//!   "error"?: {"message": str, "stack": str}}`.
//! Script values that are themselves JSON-encoded strings (an extraction
//! script returning `JSON.stringify(...)`) are re-decoded so clients get
//! structured data instead of a string of JSON.

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptOutcome {
    pub success: bool,
    pub kind: String,
    pub value: Value,
    pub string_value: Option<String>,
    pub error_message: Option<String>,
    pub error_stack: Option<String>,
}

/// Decode the bridge envelope. Distinguishes transport failures (empty or
/// non-object raw text, reported as `Err`) from script failures (`success:
/// false` inside a well-formed envelope).
pub fn parse_script_outcome(raw: &str) -> Result<ScriptOutcome, String> {
    if raw.is_empty() {
        return Err("Renderer returned empty JavaScript result".to_string());
    }
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|_| "Failed to parse JavaScript response".to_string())?;
    let Value::Object(envelope) = parsed else {
        return Err("Failed to parse JavaScript response".to_string());
    };

    let mut outcome = ScriptOutcome {
        success: envelope
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        kind: envelope
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        value: envelope.get("result").cloned().unwrap_or(Value::Null),
        string_value: envelope
            .get("stringResult")
            .and_then(Value::as_str)
            .map(str::to_string),
        error_message: None,
        error_stack: None,
    };
    if let Some(Value::Object(error)) = envelope.get("error") {
        outcome.error_message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        outcome.error_stack = error
            .get("stack")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    Ok(outcome)
}

/// True when the value is a string whose first character marks a JSON
/// object or array.
pub fn looks_like_encoded_json(value: &Value) -> bool {
    matches!(
        value.as_str().and_then(|s| s.chars().next()),
        Some('{') | Some('[')
    )
}

/// Re-decode a JSON-encoded string value; anything else (including a
/// string that fails to parse) passes through untouched.
pub fn decode_nested_json(value: Value) -> Value {
    if !looks_like_encoded_json(&value) {
        return value;
    }
    match value.as_str().and_then(|s| serde_json::from_str(s).ok()) {
        Some(decoded) => decoded,
        None => value,
    }
}
