/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Tab management handlers: create, close, switch, count, info. Close and
//! switch validate against the live count; a stale index from the client
//! is an error, never a panic.

use std::time::Instant;

use serde_json::{Value, json};

use super::{HandlerContext, HandlerResult, failure, require_str, require_tab_index};

/// POST /internal/tab/create — new tab, loaded and activated.
pub fn create_tab(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let url = require_str(body, "url")?;
    let window = &ctx.window;

    let start = Instant::now();
    let index = match window.create_tab(url) {
        Ok(index) => index,
        Err(_) => return Ok(failure("Failed to create tab")),
    };

    let loaded = window.wait_for_load(index, ctx.prefs.navigation_timeout);
    let elapsed = start.elapsed().as_millis() as u64;
    if !loaded {
        return Ok(json!({
            "success": false,
            "error": "Tab creation timed out",
            "tabIndex": index,
            "loadTimeMs": elapsed,
        }));
    }

    let final_url = window.url_of(index).unwrap_or_default();
    Ok(json!({
        "success": true,
        "tabIndex": index,
        "url": url,
        "finalUrl": if final_url.is_empty() { url } else { &final_url },
        "loadTimeMs": elapsed,
    }))
}

/// POST /internal/tab/close
pub fn close_tab(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let index = require_tab_index(body)?;
    let window = &ctx.window;
    if index >= window.tab_count() {
        return Ok(failure("Invalid tab index"));
    }
    window.close_tab(index);
    Ok(json!({"success": true, "tabIndex": index}))
}

/// POST /internal/tab/switch
pub fn switch_tab(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let index = require_tab_index(body)?;
    let window = &ctx.window;
    if index >= window.tab_count() {
        return Ok(failure("Invalid tab index"));
    }
    window.switch_to_tab(index);
    Ok(json!({
        "success": true,
        "tabIndex": window.active_tab_index().unwrap_or(0),
    }))
}

/// GET /internal/tab_count
pub fn tab_count(ctx: &HandlerContext, _body: &Value) -> HandlerResult {
    Ok(json!({"success": true, "count": ctx.window.tab_count()}))
}

/// GET /internal/tab_info
pub fn tab_info(ctx: &HandlerContext, _body: &Value) -> HandlerResult {
    Ok(json!({
        "success": true,
        "count": ctx.window.tab_count(),
        "activeTabIndex": ctx.window.active_tab_index().unwrap_or(0),
    }))
}
