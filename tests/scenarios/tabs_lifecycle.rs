/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::os::unix::net::UnixStream;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;

use crate::harness::Shell;

#[test]
fn created_tabs_are_ordered_and_the_newest_is_active() {
    let shell = Shell::start();
    for (i, url) in ["https://a.test/", "https://b.test/", "https://c.test/"]
        .iter()
        .enumerate()
    {
        let (_, body) = shell.request(
            "POST",
            "/internal/tab/create",
            Some(&format!(r#"{{"url":"{url}"}}"#)),
        );
        assert_eq!(body["success"], json!(true), "create failed: {body}");
        assert_eq!(body["tabIndex"], json!(i));
        assert_eq!(body["finalUrl"], json!(*url));
    }

    let (_, info) = shell.request("GET", "/internal/tab_info", None);
    assert_eq!(info["count"], json!(3));
    assert_eq!(info["activeTabIndex"], json!(2));
}

#[test]
fn switching_changes_which_tab_answers() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    let (_, body) = shell.request(
        "POST",
        "/internal/tab/create",
        Some(r#"{"url":"https://b.test/"}"#),
    );
    assert_eq!(body["success"], json!(true));

    let (_, body) = shell.request("POST", "/internal/tab/switch", Some(r#"{"tabIndex":0}"#));
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["tabIndex"], json!(0));
    let (_, url) = shell.request("GET", "/internal/get_url", None);
    assert_eq!(url["url"], json!("https://a.test/"));
}

#[test]
fn closing_below_the_active_tab_keeps_the_same_page_active() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    for url in ["https://b.test/", "https://c.test/"] {
        let (_, body) = shell.request(
            "POST",
            "/internal/tab/create",
            Some(&format!(r#"{{"url":"{url}"}}"#)),
        );
        assert_eq!(body["success"], json!(true));
    }

    // c.test is active at index 2; removing index 0 shifts it to index 1.
    let (_, body) = shell.request("POST", "/internal/tab/close", Some(r#"{"tabIndex":0}"#));
    assert_eq!(body["success"], json!(true));
    let (_, info) = shell.request("GET", "/internal/tab_info", None);
    assert_eq!(info["count"], json!(2));
    assert_eq!(info["activeTabIndex"], json!(1));
    let (_, url) = shell.request("GET", "/internal/get_url", None);
    assert_eq!(url["url"], json!("https://c.test/"));
}

#[test]
fn closing_the_active_tab_activates_a_neighbor() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    let (_, body) = shell.request(
        "POST",
        "/internal/tab/create",
        Some(r#"{"url":"https://b.test/"}"#),
    );
    assert_eq!(body["success"], json!(true));

    // b.test is active at index 1; closing it clamps activation to index 0.
    let (_, body) = shell.request("POST", "/internal/tab/close", Some(r#"{"tabIndex":1}"#));
    assert_eq!(body["success"], json!(true));
    let (_, info) = shell.request("GET", "/internal/tab_info", None);
    assert_eq!(info["count"], json!(1));
    assert_eq!(info["activeTabIndex"], json!(0));
    let (_, url) = shell.request("GET", "/internal/get_url", None);
    assert_eq!(url["url"], json!("https://a.test/"));
}

#[test]
fn stale_indices_fail_without_disturbing_the_registry() {
    let shell = Shell::start();
    shell.open("https://a.test/");

    let (status, body) = shell.request("POST", "/internal/tab/close", Some(r#"{"tabIndex":5}"#));
    assert_eq!(status, 200);
    assert_eq!(body["error"], json!("Invalid tab index"));
    let (_, body) = shell.request("POST", "/internal/tab/switch", Some(r#"{"tabIndex":5}"#));
    assert_eq!(body["error"], json!("Invalid tab index"));

    let (status, body) = shell.request("POST", "/internal/tab/close", Some("{}"));
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!("Missing tabIndex parameter"));

    let (_, count) = shell.request("GET", "/internal/tab_count", None);
    assert_eq!(count["count"], json!(1));
}

#[test]
fn closing_the_last_tab_shuts_the_whole_shell_down() {
    let shell = Shell::start();
    shell.open("https://only.test/");

    let (_, body) = shell.request("POST", "/internal/tab/close", Some(r#"{"tabIndex":0}"#));
    assert_eq!(body["success"], json!(true));

    // The UI loop notices the close request, tears down the server, and
    // removes the socket file; connects start failing shortly after.
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if UnixStream::connect(shell.socket_path()).is_err() {
            break;
        }
        assert!(Instant::now() < deadline, "socket stayed connectable");
        thread::sleep(Duration::from_millis(10));
    }
    assert!(!shell.socket_path().exists());
}
