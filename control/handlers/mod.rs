/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Request handlers for the control plane. Router-level problems (missing
//! or mistyped parameters) surface as HTTP 400; everything past that point
//! is reported inside a 200 body with `success: false`, matching what
//! automation clients expect to branch on.

pub mod content;
pub mod extraction;
pub mod navigation;
pub mod tabs;

use std::rc::Rc;
use std::time::Duration;

use serde_json::{Value, json};

use super::http::HttpResponse;
use crate::prefs::AppPreferences;
use crate::window::BrowserWindow;

/// Best-effort page readiness wait used by execute_js and screenshot:
/// short, and expiry does not abort the operation.
pub const BEST_EFFORT_READY_WAIT: Duration = Duration::from_millis(2000);

pub struct HandlerContext<'a> {
    pub window: Rc<BrowserWindow>,
    pub prefs: &'a AppPreferences,
}

/// A handler either produces a 200 body or fails validation with a full
/// HTTP error response.
pub type HandlerResult = Result<Value, HttpResponse>;

pub type HandlerFn = fn(&HandlerContext, &Value) -> HandlerResult;

pub(crate) fn failure(message: impl Into<String>) -> Value {
    json!({"success": false, "error": message.into()})
}

pub(crate) fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::json(400, &json!({"success": false, "error": message}))
}

pub(crate) fn require_str<'a>(body: &'a Value, key: &str) -> Result<&'a str, HttpResponse> {
    body.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request(&format!("Missing {key} parameter")))
}

/// `tabIndex` when present; non-unsigned values read as absent, matching
/// the tolerant reads everywhere a tab index is optional.
pub(crate) fn optional_tab_index(body: &Value) -> Option<usize> {
    body.get("tabIndex").and_then(Value::as_u64).map(|n| n as usize)
}

pub(crate) fn require_tab_index(body: &Value) -> Result<usize, HttpResponse> {
    optional_tab_index(body).ok_or_else(|| bad_request("Missing tabIndex parameter"))
}

pub(crate) fn optional_bool(body: &Value, key: &str) -> Option<bool> {
    body.get(key).and_then(Value::as_bool)
}

/// Switch to an explicitly requested tab; with no request, the active tab
/// stands. `Err` carries the handler-level failure body.
pub(crate) fn switch_to_requested_tab(
    window: &BrowserWindow,
    tab_index: Option<usize>,
) -> Result<(), Value> {
    let Some(index) = tab_index else {
        return Ok(());
    };
    if index >= window.tab_count() {
        return Err(failure("Invalid tab index"));
    }
    if window.active_tab_index() != Some(index) {
        window.switch_to_tab(index);
    }
    Ok(())
}
