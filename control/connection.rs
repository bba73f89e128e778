/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Incremental framing of a single HTTP request off a non-blocking socket.
//! The accumulator is pure state so split reads, coalesced reads, and the
//! size cap can be tested without a socket; [`Connection`] wires it to a
//! `UnixStream`.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde_json::json;

use super::http::{self, HttpResponse, ParsedRequest};

const READ_CHUNK: usize = 4096;
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameProgress {
    /// More bytes needed; keep waiting for readiness.
    Incomplete,
    /// A full request (headers plus declared body) has arrived.
    Complete,
    /// The cumulative size cap was exceeded. Nothing gets parsed or
    /// dispatched; the caller answers 413 and closes.
    TooLarge,
}

pub struct RequestAccumulator {
    buf: Vec<u8>,
    headers_complete: bool,
    /// Byte offset one past the header terminator, valid once
    /// `headers_complete` is set. Cached so later body bytes never trigger
    /// a rescan of the header block.
    header_end: usize,
    content_length: usize,
    max_bytes: usize,
}

impl RequestAccumulator {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buf: Vec::new(),
            headers_complete: false,
            header_end: 0,
            content_length: 0,
            max_bytes,
        }
    }

    /// Feed bytes as they arrive. Progress is monotonic: once `Complete`
    /// or `TooLarge` is returned the accumulator is done.
    pub fn push(&mut self, bytes: &[u8]) -> FrameProgress {
        // Resume the terminator scan slightly before the old tail in case
        // the "\r\n\r\n" was split across reads.
        let scan_from = self.buf.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        self.buf.extend_from_slice(bytes);
        if self.buf.len() > self.max_bytes {
            return FrameProgress::TooLarge;
        }
        if !self.headers_complete {
            let Some(pos) = find_subslice(&self.buf[scan_from..], HEADER_TERMINATOR) else {
                return FrameProgress::Incomplete;
            };
            self.header_end = scan_from + pos + HEADER_TERMINATOR.len();
            self.content_length = http::content_length(&self.buf[..self.header_end]);
            self.headers_complete = true;
            // Compared without adding so a hostile declared length near
            // usize::MAX cannot wrap past the cap.
            if self.content_length > self.max_bytes.saturating_sub(self.header_end) {
                return FrameProgress::TooLarge;
            }
        }
        if self.buf.len() - self.header_end >= self.content_length {
            FrameProgress::Complete
        } else {
            FrameProgress::Incomplete
        }
    }

    /// The framed request, once `push` has returned `Complete`. `None` if
    /// the request line is malformed.
    pub fn request(&self) -> Option<ParsedRequest> {
        if !self.headers_complete {
            return None;
        }
        let (method, path) = http::parse_request_line(&self.buf[..self.header_end])?;
        let body_end = self.header_end + self.content_length;
        Some(ParsedRequest {
            method,
            path,
            body: self.buf[self.header_end..body_end].to_vec(),
        })
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

pub struct Connection {
    stream: UnixStream,
    accumulator: RequestAccumulator,
}

impl Connection {
    /// Takes ownership of an accepted (already non-blocking) stream.
    pub fn new(stream: UnixStream, max_request_bytes: usize) -> Self {
        Self {
            stream,
            accumulator: RequestAccumulator::new(max_request_bytes),
        }
    }

    /// Drain whatever is readable right now. When a request completes it
    /// is dispatched, the response written, and the connection is done.
    pub fn poll(&mut self, dispatch: impl FnOnce(&ParsedRequest) -> HttpResponse) -> ConnectionState {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    debug!("control client closed before completing a request");
                    return ConnectionState::Closed;
                }
                Ok(n) => match self.accumulator.push(&chunk[..n]) {
                    FrameProgress::Incomplete => continue,
                    FrameProgress::TooLarge => {
                        warn!("control request exceeded size cap; answering 413");
                        self.write_response(&HttpResponse::json(
                            413,
                            &json!({"success": false, "error": "Request too large"}),
                        ));
                        return ConnectionState::Closed;
                    }
                    FrameProgress::Complete => {
                        let Some(request) = self.accumulator.request() else {
                            debug!("malformed request line; closing connection");
                            return ConnectionState::Closed;
                        };
                        let response = dispatch(&request);
                        self.write_response(&response);
                        return ConnectionState::Closed;
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return ConnectionState::Open,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("control connection read error: {e}");
                    return ConnectionState::Closed;
                }
            }
        }
    }

    /// Best-effort write of the full response; the connection closes either
    /// way, so failures are only logged.
    fn write_response(&mut self, response: &HttpResponse) {
        if let Err(e) = write_fully(&mut self.stream, &response.to_bytes()) {
            debug!("control connection write error: {e}");
            return;
        }
        let _ = self.stream.flush();
    }
}

/// Write every byte. The socket is non-blocking; responses are small, so
/// transient `WouldBlock` gets a short retry. A zero-length write means the
/// peer can accept nothing more; bail out rather than spin.
fn write_fully(writer: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    let mut written = 0;
    let mut stalls = 0;
    while written < bytes.len() {
        match writer.write(&bytes[written..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection accepted no bytes",
                ));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock && stalls < 100 => {
                stalls += 1;
                thread::sleep(Duration::from_millis(1));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
