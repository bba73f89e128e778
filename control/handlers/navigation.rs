/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Navigation handlers: open_url, navigate, history, reload. Each one
//! initiates a load, then waits with the navigation timeout, reporting
//! elapsed load time either way.

use std::time::Instant;

use log::info;
use serde_json::{Value, json};

use super::{
    HandlerContext, HandlerResult, failure, optional_bool, optional_tab_index, require_str,
    switch_to_requested_tab,
};

/// POST /internal/open_url — navigate the active tab, creating the first
/// tab when none exist.
pub fn open_url(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let url = require_str(body, "url")?;
    info!("open_url: {url}");
    let window = &ctx.window;
    let start = Instant::now();

    let (target, created) = if window.tab_count() == 0 {
        match window.create_tab(url) {
            Ok(index) => (index, true),
            Err(_) => return Ok(failure("Failed to create tab")),
        }
    } else {
        let target = window.active_tab_index().unwrap_or(0);
        window.navigate_tab(target, url);
        (target, false)
    };

    let loaded = window.wait_for_load(target, ctx.prefs.navigation_timeout);
    let elapsed = start.elapsed().as_millis() as u64;
    if !loaded {
        return Ok(json!({
            "success": false,
            "error": "Navigation timed out",
            "tabIndex": target,
            "loadTimeMs": elapsed,
        }));
    }

    let final_url = window.url_of(target).unwrap_or_default();
    Ok(json!({
        "success": true,
        "tabIndex": target,
        "finalUrl": if final_url.is_empty() { url } else { &final_url },
        "createdTab": created,
        "loadTimeMs": elapsed,
    }))
}

/// POST /internal/navigate — like open_url but tab-addressable; with zero
/// tabs it degrades to open_url.
pub fn navigate(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let url = require_str(body, "url")?;
    let window = &ctx.window;
    if window.tab_count() == 0 {
        return open_url(ctx, body);
    }

    let tab_index = optional_tab_index(body);
    if let Err(error) = switch_to_requested_tab(window, tab_index) {
        return Ok(error);
    }
    let target = tab_index.or(window.active_tab_index()).unwrap_or(0);

    let start = Instant::now();
    window.navigate_tab(target, url);
    let loaded = window.wait_for_load(target, ctx.prefs.navigation_timeout);
    let elapsed = start.elapsed().as_millis() as u64;
    if !loaded {
        return Ok(json!({
            "success": false,
            "error": "Navigation timed out",
            "tabIndex": target,
            "loadTimeMs": elapsed,
        }));
    }

    let final_url = window.url_of(target).unwrap_or_default();
    Ok(json!({
        "success": true,
        "tabIndex": target,
        "finalUrl": if final_url.is_empty() { url } else { &final_url },
        "loadTimeMs": elapsed,
    }))
}

/// POST /internal/history — back/forward on a tab, case-insensitive.
pub fn history(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let action = require_str(body, "action")?;
    let window = &ctx.window;
    if let Err(error) = switch_to_requested_tab(window, optional_tab_index(body)) {
        return Ok(error);
    }

    let action = action.to_ascii_lowercase();
    let target = window.active_tab_index().unwrap_or(0);
    let start = Instant::now();
    match action.as_str() {
        "back" => {
            window.history_back(target);
        }
        "forward" => {
            window.history_forward(target);
        }
        _ => return Ok(failure("Invalid history action")),
    }

    let loaded = window.wait_for_load(target, ctx.prefs.navigation_timeout);
    let elapsed = start.elapsed().as_millis() as u64;
    if !loaded {
        return Ok(json!({
            "success": false,
            "error": "Navigation timed out",
            "action": action,
            "tabIndex": target,
            "loadTimeMs": elapsed,
        }));
    }

    Ok(json!({
        "success": true,
        "action": action,
        "tabIndex": target,
        "finalUrl": window.url_of(target).unwrap_or_default(),
        "loadTimeMs": elapsed,
    }))
}

/// POST /internal/reload — reload a tab, optionally bypassing caches.
pub fn reload(ctx: &HandlerContext, body: &Value) -> HandlerResult {
    let window = &ctx.window;
    if let Err(error) = switch_to_requested_tab(window, optional_tab_index(body)) {
        return Ok(error);
    }
    let ignore_cache = optional_bool(body, "ignoreCache").unwrap_or(false);
    let target = window.active_tab_index().unwrap_or(0);

    let start = Instant::now();
    window.reload_tab(target, ignore_cache);
    let loaded = window.wait_for_load(target, ctx.prefs.navigation_timeout);
    let elapsed = start.elapsed().as_millis() as u64;
    if !loaded {
        return Ok(json!({
            "success": false,
            "error": "Reload timed out",
            "tabIndex": target,
            "ignoreCache": ignore_cache,
            "loadTimeMs": elapsed,
        }));
    }

    Ok(json!({
        "success": true,
        "tabIndex": target,
        "ignoreCache": ignore_cache,
        "loadTimeMs": elapsed,
    }))
}
