/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::time::Duration;

use serde_json::{Value, json};

use crate::harness::Shell;

#[test]
fn open_url_creates_the_first_tab_then_navigates_in_place() {
    let shell = Shell::start();

    let body = shell.open("https://first.test/");
    assert_eq!(body["createdTab"], json!(true));
    assert_eq!(body["tabIndex"], json!(0));
    assert_eq!(body["finalUrl"], json!("https://first.test/"));
    assert!(body["loadTimeMs"].is_u64());

    let body = shell.open("https://second.test/");
    assert_eq!(body["createdTab"], json!(false));
    assert_eq!(body["tabIndex"], json!(0));

    let (_, count) = shell.request("GET", "/internal/tab_count", None);
    assert_eq!(count["count"], json!(1));
    let (_, url) = shell.request("GET", "/internal/get_url", None);
    assert_eq!(url["url"], json!("https://second.test/"));
}

#[test]
fn navigate_with_zero_tabs_degrades_to_open_url() {
    let shell = Shell::start();
    let (status, body) = shell.request(
        "POST",
        "/internal/navigate",
        Some(r#"{"url":"https://fresh.test/"}"#),
    );
    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["createdTab"], json!(true));
}

#[test]
fn navigation_timeout_reports_elapsed_time() {
    let shell = Shell::start_with(|prefs| {
        prefs.navigation_timeout = Duration::from_millis(150);
        prefs.content_timeout = Duration::from_millis(50);
    });
    shell.open("https://ok.test/");
    shell.engine.set_hang_loads(true);

    let (status, body) = shell.request(
        "POST",
        "/internal/navigate",
        Some(r#"{"url":"https://stuck.test/"}"#),
    );
    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Navigation timed out"));
    assert_eq!(body["tabIndex"], json!(0));
    assert!(body["loadTimeMs"].as_u64().expect("loadTimeMs") >= 100);
}

#[test]
fn history_traverses_back_and_forward() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    shell.open("https://b.test/");

    let (_, body) = shell.request("POST", "/internal/history", Some(r#"{"action":"BACK"}"#));
    assert_eq!(body["success"], json!(true), "back failed: {body}");
    assert_eq!(body["action"], json!("back"));
    assert_eq!(body["finalUrl"], json!("https://a.test/"));

    let (_, body) = shell.request("POST", "/internal/history", Some(r#"{"action":"forward"}"#));
    assert_eq!(body["success"], json!(true), "forward failed: {body}");
    assert_eq!(body["finalUrl"], json!("https://b.test/"));
}

#[test]
fn unknown_history_action_is_rejected() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    let (status, body) = shell.request("POST", "/internal/history", Some(r#"{"action":"sideways"}"#));
    assert_eq!(status, 200);
    assert_eq!(body["error"], json!("Invalid history action"));
}

#[test]
fn reload_echoes_ignore_cache() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    let (_, body) = shell.request("POST", "/internal/reload", Some(r#"{"ignoreCache":true}"#));
    assert_eq!(body["success"], json!(true), "reload failed: {body}");
    assert_eq!(body["ignoreCache"], json!(true));
    let (_, body) = shell.request("POST", "/internal/reload", Some("{}"));
    assert_eq!(body["ignoreCache"], json!(false));
}

#[test]
fn requests_against_an_invalid_tab_index_fail_cleanly() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    let (status, body) = shell.request(
        "POST",
        "/internal/navigate",
        Some(r#"{"url":"https://b.test/","tabIndex":7}"#),
    );
    assert_eq!(status, 200);
    assert_eq!(body["error"], json!("Invalid tab index"));
    let (_, body) = shell.request("POST", "/internal/get_url", Some(r#"{"tabIndex":7}"#));
    assert_eq!(body["error"], json!("Invalid tab index"));
    // A negative index is not an unsigned tabIndex; it reads as absent.
    let (_, body) = shell.request("POST", "/internal/get_url", Some(r#"{"tabIndex":-1}"#));
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["url"], Value::String("https://a.test/".into()));
}
