/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Structured extraction handlers. Each injects a script from
//! [`crate::control::scripts`], decodes the stringified payload, and
//! shape-checks it before answering.

use log::warn;
use serde_json::{Value, json};

use super::{
    HandlerContext, HandlerResult, failure, optional_tab_index, require_str,
    switch_to_requested_tab,
};
use crate::control::script_result::{ScriptOutcome, looks_like_encoded_json, parse_script_outcome};
use crate::control::scripts;
use crate::engine::BrowserId;

/// Shared preamble: honor the requested tab, require a settled page, and
/// resolve the extraction target.
fn settled_target(ctx: &HandlerContext, body: &Value) -> Result<(usize, BrowserId), Value> {
    switch_to_requested_tab(&ctx.window, optional_tab_index(body))?;
    let index = ctx.window.active_tab_index().ok_or_else(|| failure("No active tab"))?;
    let id = ctx
        .window
        .registry()
        .browser_id_at(index)
        .ok_or_else(|| failure("No active tab"))?;
    if !ctx.window.wait_for_load(index, ctx.prefs.content_timeout) {
        return Err(failure("Page is still loading"));
    }
    Ok((index, id))
}

/// Run a script and unwrap the envelope, mapping failures to
/// handler-specific default messages.
fn run_script(
    ctx: &HandlerContext,
    id: BrowserId,
    script: &str,
    parse_fallback: &str,
    exec_fallback: &str,
) -> Result<ScriptOutcome, Value> {
    let raw = ctx
        .window
        .engine()
        .execute_script(id, script)
        .map_err(|e| failure(e.to_string()))?;
    let outcome = parse_script_outcome(&raw).map_err(|parse_error| {
        warn!("extraction parse failure: {parse_error}");
        failure(if parse_error.is_empty() {
            parse_fallback.to_string()
        } else {
            parse_error
        })
    })?;
    if !outcome.success {
        warn!("extraction script failed: {:?}", outcome.error_message);
        return Err(failure(
            outcome
                .error_message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| exec_fallback.to_string()),
        ));
    }
    Ok(outcome)
}

/// Decode a stringified payload; a string that looks like JSON but fails
/// to parse is an extraction error.
fn decode_payload(value: Value, decode_error: &str) -> Result<Value, Value> {
    if !looks_like_encoded_json(&value) {
        return Ok(value);
    }
    let Some(text) = value.as_str() else {
        return Ok(value);
    };
    serde_json::from_str(text).map_err(|_| failure(decode_error))
}

/// GET|POST /internal/get_page_summary
pub fn page_summary(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let (index, id) = match settled_target(ctx, body) {
        Ok(target) => target,
        Err(error) => return Ok(error),
    };
    let outcome = match run_script(
        ctx,
        id,
        scripts::PAGE_SUMMARY,
        "Failed to parse page summary response",
        "Failed to extract page summary",
    ) {
        Ok(outcome) => outcome,
        Err(error) => return Ok(error),
    };
    let summary = match decode_payload(outcome.value, "Failed to parse page summary") {
        Ok(summary) => summary,
        Err(error) => return Ok(error),
    };
    if !summary.is_object() {
        return Ok(failure("Invalid response format - expected object"));
    }
    Ok(json!({"success": true, "summary": summary, "tabIndex": index}))
}

/// GET|POST /internal/get_interactive_elements
pub fn interactive_elements(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let (index, id) = match settled_target(ctx, body) {
        Ok(target) => target,
        Err(error) => return Ok(error),
    };
    let outcome = match run_script(
        ctx,
        id,
        scripts::INTERACTIVE_ELEMENTS,
        "Failed to parse interactive elements response",
        "Failed to extract interactive elements",
    ) {
        Ok(outcome) => outcome,
        Err(error) => return Ok(error),
    };
    let elements = match decode_payload(outcome.value, "Failed to parse interactive elements") {
        Ok(elements) => elements,
        Err(error) => return Ok(error),
    };
    let Some(elements) = elements.as_array() else {
        return Ok(failure("Invalid response format - expected array"));
    };
    Ok(json!({
        "success": true,
        "elements": elements,
        "count": elements.len(),
        "tabIndex": index,
    }))
}

/// GET|POST /internal/get_accessibility_tree
pub fn accessibility_tree(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let (index, id) = match settled_target(ctx, body) {
        Ok(target) => target,
        Err(error) => return Ok(error),
    };
    let outcome = match run_script(
        ctx,
        id,
        scripts::ACCESSIBILITY_TREE,
        "Failed to parse accessibility tree response",
        "Failed to extract accessibility tree",
    ) {
        Ok(outcome) => outcome,
        Err(error) => return Ok(error),
    };
    let tree = match decode_payload(outcome.value, "Failed to parse accessibility tree") {
        Ok(tree) => tree,
        Err(error) => return Ok(error),
    };
    Ok(json!({"success": true, "tree": tree, "tabIndex": index}))
}

/// POST /internal/query_content
pub fn query_content(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let query_type = require_str(body, "queryType")?;
    let Some(script) = scripts::content_query(query_type) else {
        return Ok(failure(
            "Unknown query type. Available: forms, navigation, article, tables, media",
        ));
    };
    let (index, id) = match settled_target(ctx, body) {
        Ok(target) => target,
        Err(error) => return Ok(error),
    };
    let outcome = match run_script(
        ctx,
        id,
        &script,
        "Failed to parse query response",
        "Failed to execute query",
    ) {
        Ok(outcome) => outcome,
        Err(error) => return Ok(error),
    };
    let data = match decode_payload(outcome.value, "Failed to parse query result") {
        Ok(data) => data,
        Err(error) => return Ok(error),
    };
    Ok(json!({
        "success": true,
        "queryType": query_type,
        "data": data,
        "tabIndex": index,
    }))
}

/// GET|POST /internal/get_annotated_screenshot — screenshot plus element
/// geometry. Element extraction is best-effort: its failures degrade to an
/// empty array rather than failing the capture.
pub fn annotated_screenshot(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let (index, id) = match settled_target(ctx, body) {
        Ok(target) => target,
        Err(error) => return Ok(error),
    };
    let encoded = match ctx.window.engine().capture_screenshot(id) {
        Ok(encoded) => encoded,
        Err(e) => return Ok(failure(e.to_string())),
    };
    if encoded.is_empty() {
        return Ok(failure("Failed to capture screenshot"));
    }

    let elements = match run_script(
        ctx,
        id,
        scripts::ANNOTATED_SCREENSHOT_ELEMENTS,
        "Failed to parse annotated screenshot elements",
        "Failed to extract annotated screenshot elements",
    ) {
        Ok(outcome) => match decode_payload(outcome.value, "") {
            Ok(Value::Array(elements)) => Value::Array(elements),
            Ok(_) | Err(_) => {
                warn!("annotated screenshot elements unavailable; overlay omitted");
                json!([])
            }
        },
        Err(_) => json!([]),
    };

    Ok(json!({
        "success": true,
        "screenshot": encoded,
        "elements": elements,
        "tabIndex": index,
    }))
}
