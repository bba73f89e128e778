/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! (method, path) dispatch over the control routes. Framing errors were
//! handled upstream; here the taxonomy is 404 for unknown routes, 400 for
//! undecodable JSON or missing parameters, and a successful HTTP exchange
//! with `success: false` for everything the handlers reject.

use std::rc::Weak;

use log::{debug, warn};
use serde_json::{Value, json};

use super::handlers::{self, HandlerContext, HandlerFn};
use super::http::{HttpResponse, ParsedRequest};
use crate::prefs::AppPreferences;
use crate::window::BrowserWindow;

struct Route {
    methods: &'static [&'static str],
    path: &'static str,
    handler: HandlerFn,
}

const GET_OR_POST: &[&str] = &["GET", "POST"];
const POST: &[&str] = &["POST"];

const ROUTES: &[Route] = &[
    Route {
        methods: POST,
        path: "/internal/open_url",
        handler: handlers::navigation::open_url,
    },
    Route {
        methods: POST,
        path: "/internal/navigate",
        handler: handlers::navigation::navigate,
    },
    Route {
        methods: POST,
        path: "/internal/history",
        handler: handlers::navigation::history,
    },
    Route {
        methods: POST,
        path: "/internal/reload",
        handler: handlers::navigation::reload,
    },
    Route {
        methods: POST,
        path: "/internal/tab/create",
        handler: handlers::tabs::create_tab,
    },
    Route {
        methods: POST,
        path: "/internal/tab/close",
        handler: handlers::tabs::close_tab,
    },
    Route {
        methods: POST,
        path: "/internal/tab/switch",
        handler: handlers::tabs::switch_tab,
    },
    Route {
        methods: GET_OR_POST,
        path: "/internal/tab_count",
        handler: handlers::tabs::tab_count,
    },
    Route {
        methods: GET_OR_POST,
        path: "/internal/tab_info",
        handler: handlers::tabs::tab_info,
    },
    Route {
        methods: GET_OR_POST,
        path: "/internal/get_url",
        handler: handlers::content::get_url,
    },
    Route {
        methods: GET_OR_POST,
        path: "/internal/get_html",
        handler: handlers::content::get_html,
    },
    Route {
        methods: POST,
        path: "/internal/execute_js",
        handler: handlers::content::execute_js,
    },
    Route {
        methods: GET_OR_POST,
        path: "/internal/screenshot",
        handler: handlers::content::screenshot,
    },
    Route {
        methods: GET_OR_POST,
        path: "/internal/get_page_summary",
        handler: handlers::extraction::page_summary,
    },
    Route {
        methods: GET_OR_POST,
        path: "/internal/get_interactive_elements",
        handler: handlers::extraction::interactive_elements,
    },
    Route {
        methods: GET_OR_POST,
        path: "/internal/get_accessibility_tree",
        handler: handlers::extraction::accessibility_tree,
    },
    Route {
        methods: POST,
        path: "/internal/query_content",
        handler: handlers::extraction::query_content,
    },
    Route {
        methods: GET_OR_POST,
        path: "/internal/get_annotated_screenshot",
        handler: handlers::extraction::annotated_screenshot,
    },
];

fn not_found() -> HttpResponse {
    HttpResponse::json(404, &json!({"success": false, "error": "Endpoint not found"}))
}

/// Decode a request body. GET requests carry no body worth reading; empty
/// POST bodies read as an empty object.
fn decode_body(request: &ParsedRequest) -> Result<Value, HttpResponse> {
    if request.method == "GET" || request.body.is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_slice(&request.body).map_err(|e| {
        debug!("request body is not valid JSON: {e}");
        HttpResponse::json(400, &json!({"success": false, "error": "Invalid JSON"}))
    })
}

/// Route one framed request. A dead window reference means the window is
/// tearing down while the socket still lives; every route answers the
/// same way in that state.
pub fn dispatch(
    request: &ParsedRequest,
    window: &Weak<BrowserWindow>,
    prefs: &AppPreferences,
) -> HttpResponse {
    debug!("control request: {} {}", request.method, request.path);
    let Some(route) = ROUTES.iter().find(|route| route.path == request.path) else {
        warn!("unknown endpoint: {}", request.path);
        return not_found();
    };
    if !route.methods.contains(&request.method.as_str()) {
        warn!(
            "method {} not allowed for {}",
            request.method, request.path
        );
        return not_found();
    }

    let body = match decode_body(request) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let Some(window) = window.upgrade() else {
        return HttpResponse::ok(&json!({
            "success": false,
            "error": "Server is shutting down",
        }));
    };

    let ctx = HandlerContext { window, prefs };
    match (route.handler)(&ctx, &body) {
        Ok(body) => HttpResponse::ok(&body),
        Err(response) => response,
    }
}
