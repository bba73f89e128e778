/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use serde_json::json;

use crate::harness::{Shell, decode_response};

#[test]
fn a_trickled_request_frames_the_same_as_a_single_write() {
    let shell = Shell::start();
    shell.open("https://a.test/");

    let bytes = shell.encode_request("GET", "/internal/tab_count", None);
    let (status, body) = decode_response(&shell.trickled_request(&bytes));
    assert_eq!(status, 200);
    assert_eq!(body["count"], json!(1));

    let bytes = shell.encode_request(
        "POST",
        "/internal/get_url",
        Some(r#"{"tabIndex":0}"#),
    );
    let (status, body) = decode_response(&shell.trickled_request(&bytes));
    assert_eq!(status, 200);
    assert_eq!(body["url"], json!("https://a.test/"));
}

#[test]
fn unknown_endpoints_and_wrong_methods_are_404() {
    let shell = Shell::start();
    let (status, body) = shell.request("GET", "/internal/unknown", None);
    assert_eq!(status, 404);
    assert_eq!(body["error"], json!("Endpoint not found"));

    // open_url only accepts POST.
    let (status, body) = shell.request("GET", "/internal/open_url", None);
    assert_eq!(status, 404);
    assert_eq!(body["error"], json!("Endpoint not found"));
}

#[test]
fn an_undecodable_body_is_a_400() {
    let shell = Shell::start();
    let (status, body) = shell.request("POST", "/internal/reload", Some("{not json"));
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!("Invalid JSON"));
}

#[test]
fn a_declared_oversized_body_is_rejected_at_the_headers() {
    let shell = Shell::start();
    // 2 MiB declared; the rejection lands before any body arrives.
    let raw = shell.raw_request(
        b"POST /internal/execute_js HTTP/1.1\r\nContent-Length: 2097152\r\n\r\n",
    );
    let (status, body) = decode_response(&raw);
    assert_eq!(status, 413);
    assert_eq!(body["error"], json!("Request too large"));
}

#[test]
fn each_connection_serves_exactly_one_exchange() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    // Connection: close is part of every response; a fresh connect per
    // request keeps working indefinitely.
    for _ in 0..20 {
        let (status, body) = shell.request("GET", "/internal/tab_count", None);
        assert_eq!(status, 200);
        assert_eq!(body["count"], json!(1));
    }
}
