/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Content handlers: current URL, page HTML, script execution, and
//! screenshots. HTML retrieval insists on a settled page; execute_js and
//! screenshot only wait briefly and then proceed, flagging the expired
//! wait in the response.

use log::warn;
use serde_json::{Value, json};

use super::{
    BEST_EFFORT_READY_WAIT, HandlerContext, HandlerResult, failure, optional_bool,
    optional_tab_index, require_str, switch_to_requested_tab,
};
use crate::control::script_result::{decode_nested_json, parse_script_outcome};
use crate::engine::BrowserId;

fn active_target(ctx: &HandlerContext) -> Result<(usize, BrowserId), Value> {
    let index = ctx.window.active_tab_index().ok_or_else(|| failure("No active tab"))?;
    let id = ctx
        .window
        .registry()
        .browser_id_at(index)
        .ok_or_else(|| failure("No active tab"))?;
    Ok((index, id))
}

/// GET|POST /internal/get_url
pub fn get_url(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    if let Err(error) = switch_to_requested_tab(&ctx.window, optional_tab_index(body)) {
        return Ok(error);
    }
    let (index, _) = match active_target(ctx) {
        Ok(target) => target,
        Err(error) => return Ok(error),
    };
    Ok(json!({
        "success": true,
        "url": ctx.window.url_of(index).unwrap_or_default(),
        "tabIndex": index,
    }))
}

/// GET|POST /internal/get_html — waits out the content timeout for a
/// settled page before serializing.
pub fn get_html(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    if let Err(error) = switch_to_requested_tab(&ctx.window, optional_tab_index(body)) {
        return Ok(error);
    }
    let (index, id) = match active_target(ctx) {
        Ok(target) => target,
        Err(error) => return Ok(error),
    };
    if !ctx.window.wait_for_load(index, ctx.prefs.content_timeout) {
        return Ok(json!({
            "success": false,
            "error": "Page is still loading",
            "tabIndex": index,
        }));
    }
    let html = match ctx.window.engine().page_source(id) {
        Ok(html) => html,
        Err(e) => return Ok(failure(e.to_string())),
    };
    if html.is_empty() {
        return Ok(failure("Failed to retrieve HTML"));
    }
    Ok(json!({"success": true, "html": html, "tabIndex": index}))
}

/// POST /internal/execute_js — run arbitrary script; a busy page only
/// delays execution by the short readiness wait.
pub fn execute_js(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let code = require_str(body, "code")?;
    if let Err(error) = switch_to_requested_tab(&ctx.window, optional_tab_index(body)) {
        return Ok(error);
    }
    let (index, id) = match active_target(ctx) {
        Ok(target) => target,
        Err(error) => return Ok(error),
    };

    let ready = ctx.window.wait_for_load(index, BEST_EFFORT_READY_WAIT);
    if !ready {
        warn!("execute_js: page still reporting loading state, executing anyway");
    }

    let raw = match ctx.window.engine().execute_script(id, code) {
        Ok(raw) => raw,
        Err(e) => return Ok(failure(e.to_string())),
    };
    let outcome = match parse_script_outcome(&raw) {
        Ok(outcome) => outcome,
        Err(parse_error) => return Ok(failure(parse_error)),
    };

    if !outcome.success {
        let mut response = json!({
            "success": false,
            "error": outcome
                .error_message
                .unwrap_or_else(|| "JavaScript execution failed".to_string()),
        });
        if let Some(stack) = outcome.error_stack {
            response["stack"] = json!(stack);
        }
        return Ok(response);
    }

    let mut response = json!({
        "success": true,
        "type": outcome.kind,
        "result": decode_nested_json(outcome.value),
        "tabIndex": index,
        "loadWaitTimedOut": !ready,
    });
    if let Some(string_value) = outcome.string_value.filter(|s| !s.is_empty()) {
        response["stringResult"] = json!(string_value);
    }
    Ok(response)
}

/// GET|POST /internal/screenshot — viewport capture as base64 PNG.
pub fn screenshot(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    if let Err(error) = switch_to_requested_tab(&ctx.window, optional_tab_index(body)) {
        return Ok(error);
    }
    let (index, id) = match active_target(ctx) {
        Ok(target) => target,
        Err(error) => return Ok(error),
    };

    let ready = ctx.window.wait_for_load(index, BEST_EFFORT_READY_WAIT);
    if !ready {
        warn!("screenshot: page still reporting loading state, capturing anyway");
    }
    if optional_bool(body, "fullPage").unwrap_or(false) {
        warn!("full page screenshot requested but not supported; capturing viewport only");
    }

    let encoded = match ctx.window.engine().capture_screenshot(id) {
        Ok(encoded) => encoded,
        Err(e) => return Ok(failure(e.to_string())),
    };
    if encoded.is_empty() {
        return Ok(failure("Failed to capture screenshot"));
    }
    Ok(json!({
        "success": true,
        "screenshot": encoded,
        "tabIndex": index,
        "loadWaitTimedOut": !ready,
    }))
}
