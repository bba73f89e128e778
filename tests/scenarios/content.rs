/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use serde_json::json;

use crate::harness::Shell;

#[test]
fn execute_js_redecodes_json_string_results() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    shell.engine.enqueue_script_result(
        r#"{"success":true,"type":"string","result":"{\"a\":1}","stringResult":"{\"a\":1}"}"#,
    );

    let (status, body) = shell.request(
        "POST",
        "/internal/execute_js",
        Some(r#"{"code":"JSON.stringify({a: 1})"}"#),
    );
    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true), "execute_js failed: {body}");
    assert_eq!(body["type"], json!("string"));
    // The stringified payload comes back as structured data, with the raw
    // text preserved alongside it.
    assert_eq!(body["result"], json!({"a": 1}));
    assert_eq!(body["stringResult"], json!("{\"a\":1}"));
    assert_eq!(body["loadWaitTimedOut"], json!(false));
}

#[test]
fn execute_js_passes_plain_values_through() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    shell
        .engine
        .enqueue_script_result(r#"{"success":true,"type":"number","result":42}"#);

    let (_, body) = shell.request("POST", "/internal/execute_js", Some(r#"{"code":"6*7"}"#));
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["result"], json!(42));
    assert!(body.get("stringResult").is_none());
}

#[test]
fn execute_js_surfaces_script_errors_with_stack() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    shell.engine.enqueue_script_result(
        r#"{"success":false,"type":"error","error":{"message":"boom","stack":"at <anonymous>:1:1"}}"#,
    );

    let (_, body) = shell.request(
        "POST",
        "/internal/execute_js",
        Some(r#"{"code":"throw new Error('boom')"}"#),
    );
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("boom"));
    assert_eq!(body["stack"], json!("at <anonymous>:1:1"));
}

#[test]
fn execute_js_reports_unparseable_bridge_output() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    shell.engine.enqueue_script_result("not json");

    let (_, body) = shell.request("POST", "/internal/execute_js", Some(r#"{"code":"1"}"#));
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Failed to parse JavaScript response"));
}

#[test]
fn execute_js_without_code_is_a_bad_request() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    let (status, body) = shell.request("POST", "/internal/execute_js", Some("{}"));
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!("Missing code parameter"));
}

#[test]
fn get_html_returns_the_settled_page() {
    let shell = Shell::start();
    shell.open("https://page.test/article");
    let (_, body) = shell.request("GET", "/internal/get_html", None);
    assert_eq!(body["success"], json!(true), "get_html failed: {body}");
    let html = body["html"].as_str().expect("html");
    assert!(html.contains("https://page.test/article"));
    assert_eq!(body["tabIndex"], json!(0));
}

#[test]
fn screenshot_returns_base64_png() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    let (_, body) = shell.request("GET", "/internal/screenshot", None);
    assert_eq!(body["success"], json!(true), "screenshot failed: {body}");
    // Base64 of the PNG signature always starts this way.
    let encoded = body["screenshot"].as_str().expect("screenshot");
    assert!(encoded.starts_with("iVBOR"), "not a PNG: {encoded}");
    assert_eq!(body["loadWaitTimedOut"], json!(false));
}

#[test]
fn content_routes_with_no_tabs_report_no_active_tab() {
    let shell = Shell::start();
    for path in [
        "/internal/get_url",
        "/internal/get_html",
        "/internal/screenshot",
        "/internal/get_page_summary",
    ] {
        let (status, body) = shell.request("GET", path, None);
        assert_eq!(status, 200);
        assert_eq!(body["error"], json!("No active tab"), "for {path}: {body}");
    }
}

#[test]
fn page_summary_decodes_the_stringified_payload() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    shell.engine.enqueue_script_result(
        r#"{"success":true,"type":"string","result":"{\"title\":\"A\",\"headings\":[]}"}"#,
    );

    let (_, body) = shell.request("GET", "/internal/get_page_summary", None);
    assert_eq!(body["success"], json!(true), "summary failed: {body}");
    assert_eq!(body["summary"], json!({"title": "A", "headings": []}));
}

#[test]
fn page_summary_rejects_a_non_object_payload() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    // The queue is empty, so the bridge answers with an undefined result.
    let (_, body) = shell.request("GET", "/internal/get_page_summary", None);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Invalid response format - expected object"));
}

#[test]
fn interactive_elements_counts_the_decoded_array() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    shell.engine.enqueue_script_result(
        r#"{"success":true,"type":"string","result":"[{\"tag\":\"a\"},{\"tag\":\"button\"}]"}"#,
    );

    let (_, body) = shell.request("GET", "/internal/get_interactive_elements", None);
    assert_eq!(body["success"], json!(true), "elements failed: {body}");
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["elements"][1]["tag"], json!("button"));
}

#[test]
fn query_content_rejects_unknown_types_and_answers_known_ones() {
    let shell = Shell::start();
    shell.open("https://a.test/");

    let (_, body) = shell.request(
        "POST",
        "/internal/query_content",
        Some(r#"{"queryType":"cookies"}"#),
    );
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["error"],
        json!("Unknown query type. Available: forms, navigation, article, tables, media")
    );

    shell
        .engine
        .enqueue_script_result(r#"{"success":true,"type":"string","result":"[]"}"#);
    let (_, body) = shell.request(
        "POST",
        "/internal/query_content",
        Some(r#"{"queryType":"forms"}"#),
    );
    assert_eq!(body["success"], json!(true), "query failed: {body}");
    assert_eq!(body["queryType"], json!("forms"));
    assert_eq!(body["data"], json!([]));
}

#[test]
fn annotated_screenshot_degrades_to_an_empty_overlay() {
    let shell = Shell::start();
    shell.open("https://a.test/");
    shell.engine.enqueue_script_result(
        r#"{"success":false,"type":"error","error":{"message":"selector blew up"}}"#,
    );

    let (_, body) = shell.request("GET", "/internal/get_annotated_screenshot", None);
    assert_eq!(body["success"], json!(true), "annotated failed: {body}");
    assert!(body["screenshot"].as_str().expect("screenshot").starts_with("iVBOR"));
    assert_eq!(body["elements"], json!([]));
}
