/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Control server lifecycle: bind the Unix socket, accept and advance
//! connections from the UI run loop, and tear the socket down again. The
//! server holds the window weakly; the window owning the server does not
//! keep itself alive through it.

use std::fs;
use std::io;
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::rc::Weak;

use log::{debug, info, warn};

use super::connection::{Connection, ConnectionState};
use super::router;
use crate::prefs::AppPreferences;
use crate::window::BrowserWindow;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("control server is already running")]
    AlreadyRunning,
    #[error("failed to prepare socket path {path}: {source}")]
    Prepare { path: PathBuf, source: io::Error },
    #[error("failed to bind control socket {path}: {source}")]
    Bind { path: PathBuf, source: io::Error },
}

pub struct ControlServer {
    window: Weak<BrowserWindow>,
    prefs: AppPreferences,
    listener: Option<UnixListener>,
    connections: Vec<Connection>,
}

impl ControlServer {
    pub fn new(window: Weak<BrowserWindow>, prefs: AppPreferences) -> Self {
        Self {
            window,
            prefs,
            listener: None,
            connections: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    /// Bind and listen. Called once; a second call while running is an
    /// error. A stale socket file from an unclean exit is removed first.
    pub fn initialize(&mut self) -> Result<(), ServerError> {
        if self.listener.is_some() {
            return Err(ServerError::AlreadyRunning);
        }
        let path = self.prefs.socket_path.clone();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ServerError::Prepare {
                path: path.clone(),
                source,
            })?;
        }
        match fs::remove_file(&path) {
            Ok(()) => debug!("removed stale control socket {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(ServerError::Prepare { path, source }),
        }
        let listener = UnixListener::bind(&path).map_err(|source| ServerError::Bind {
            path: path.clone(),
            source,
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| ServerError::Bind { path: path.clone(), source })?;
        info!("control server listening on {}", path.display());
        self.listener = Some(listener);
        Ok(())
    }

    /// One readiness pass from the run loop: accept whoever is waiting,
    /// then advance every open connection. Completed requests dispatch
    /// through the router right here, on the UI thread.
    pub fn poll(&mut self) {
        let Some(listener) = &self.listener else {
            return;
        };
        loop {
            match listener.accept() {
                Ok((stream, _)) => {
                    if let Err(e) = stream.set_nonblocking(true) {
                        warn!("failed to make control connection non-blocking: {e}");
                        continue;
                    }
                    debug!("accepted control connection");
                    self.connections
                        .push(Connection::new(stream, self.prefs.max_request_bytes));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("control accept failed: {e}");
                    break;
                }
            }
        }

        let window = self.window.clone();
        let prefs = self.prefs.clone();
        self.connections.retain_mut(|connection| {
            matches!(
                connection.poll(|request| router::dispatch(request, &window, &prefs)),
                ConnectionState::Open
            )
        });
    }

    /// Stop listening and remove the socket file. Idempotent.
    pub fn shutdown(&mut self) {
        if self.listener.take().is_none() {
            return;
        }
        self.connections.clear();
        match fs::remove_file(&self.prefs.socket_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "failed to remove control socket {}: {e}",
                self.prefs.socket_path.display()
            ),
        }
        info!("control server shut down");
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
