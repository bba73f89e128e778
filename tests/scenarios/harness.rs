/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Scenario harness: the whole shell (engine, window, control server)
//! running its UI loop on a dedicated thread, with a socket-level HTTP
//! client for the tests.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pilotshell::control::ControlServer;
use pilotshell::engine::ScriptedEngine;
use pilotshell::marshal::ui_marshaler;
use pilotshell::prefs::AppPreferences;
use pilotshell::window::{BrowserWindow, HeadlessUi};
use serde_json::Value;

pub struct Shell {
    pub engine: Arc<ScriptedEngine>,
    socket: PathBuf,
    stop: Arc<AtomicBool>,
    ui_thread: Option<JoinHandle<()>>,
    _dir: tempfile::TempDir,
}

impl Shell {
    pub fn start() -> Self {
        Self::start_with(|_| {})
    }

    pub fn start_with(configure: impl FnOnce(&mut AppPreferences)) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket = dir.path().join("control.sock");
        let mut prefs = AppPreferences {
            socket_path: socket.clone(),
            ..AppPreferences::default()
        };
        configure(&mut prefs);

        let engine = Arc::new(ScriptedEngine::new());
        engine.set_load_latency(Duration::from_millis(5));
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let ui_thread = {
            let engine = Arc::clone(&engine);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let (marshaler, calls) = ui_marshaler();
                let window =
                    BrowserWindow::new(Rc::new(engine), Rc::new(HeadlessUi::new()), marshaler, calls);
                let mut server = ControlServer::new(Rc::downgrade(&window), prefs);
                server.initialize().expect("initialize control server");
                ready_tx.send(()).expect("ready signal");
                while !stop.load(Ordering::SeqCst) && !window.should_close() {
                    window.pump_once();
                    server.poll();
                    thread::sleep(Duration::from_millis(2));
                }
                server.shutdown();
            })
        };
        ready_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("shell came up");

        Self {
            engine,
            socket,
            stop,
            ui_thread: Some(ui_thread),
            _dir: dir,
        }
    }

    pub fn socket_path(&self) -> &PathBuf {
        &self.socket
    }

    /// One HTTP exchange; returns the status code and decoded JSON body.
    pub fn request(&self, method: &str, path: &str, body: Option<&str>) -> (u16, Value) {
        let raw = self.raw_request(&self.encode_request(method, path, body));
        decode_response(&raw)
    }

    pub fn encode_request(&self, method: &str, path: &str, body: Option<&str>) -> Vec<u8> {
        let body = body.unwrap_or("");
        format!(
            "{method} {path} HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
        .into_bytes()
    }

    /// Send raw bytes in one write and read the full response.
    pub fn raw_request(&self, bytes: &[u8]) -> String {
        let mut client = UnixStream::connect(&self.socket).expect("connect");
        client.write_all(bytes).expect("write request");
        read_response(&mut client)
    }

    /// Send the request one byte per write, with a pause between bytes,
    /// to force maximally split reads on the server side.
    pub fn trickled_request(&self, bytes: &[u8]) -> String {
        let mut client = UnixStream::connect(&self.socket).expect("connect");
        for byte in bytes {
            client.write_all(std::slice::from_ref(byte)).expect("write byte");
            thread::sleep(Duration::from_millis(1));
        }
        read_response(&mut client)
    }

    /// Convenience: open a tab and wait for its load to settle.
    pub fn open(&self, url: &str) -> Value {
        let (status, body) = self.request(
            "POST",
            "/internal/open_url",
            Some(&format!("{{\"url\":\"{url}\"}}")),
        );
        assert_eq!(status, 200, "open_url transport failed: {body}");
        assert_eq!(body["success"], Value::Bool(true), "open_url failed: {body}");
        body
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.ui_thread.take() {
            let _ = handle.join();
        }
    }
}

fn read_response(client: &mut UnixStream) -> String {
    client
        .set_read_timeout(Some(Duration::from_secs(30)))
        .expect("read timeout");
    let mut response = String::new();
    client.read_to_string(&mut response).expect("read response");
    response
}

pub fn decode_response(raw: &str) -> (u16, Value) {
    let status: u16 = raw
        .strip_prefix("HTTP/1.1 ")
        .and_then(|rest| rest.split(' ').next())
        .and_then(|code| code.parse().ok())
        .unwrap_or_else(|| panic!("unparsable status line in {raw:?}"));
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .unwrap_or_default();
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).expect("JSON body")
    };
    (status, body)
}
