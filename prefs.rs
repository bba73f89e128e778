/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Application preferences: socket path, homepage, control-plane limits and
//! timeouts. Values come from compiled defaults, an optional TOML file, and
//! command-line overrides, in that order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bpaf::Bpaf;
use log::warn;
use serde::Deserialize;

pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_CONTENT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024 * 1024;
pub const DEFAULT_HOMEPAGE: &str = "about:blank";
pub const DEFAULT_WINDOW_WIDTH: u32 = 1280;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 800;

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("failed to read preferences file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse preferences file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Command-line options. Everything here overrides the TOML file.
#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
pub struct CliOptions {
    /// Path to a preferences TOML file.
    #[bpaf(long("config"), argument("FILE"))]
    pub config: Option<PathBuf>,
    /// Path for the control socket.
    #[bpaf(long("socket"), argument("PATH"))]
    pub socket_path: Option<PathBuf>,
    /// URL loaded into the first tab.
    #[bpaf(long("homepage"), argument("URL"))]
    pub homepage: Option<String>,
    /// Navigation wait timeout in milliseconds.
    #[bpaf(long("navigation-timeout-ms"), argument("MS"))]
    pub navigation_timeout_ms: Option<u64>,
    /// Content readiness timeout in milliseconds.
    #[bpaf(long("content-timeout-ms"), argument("MS"))]
    pub content_timeout_ms: Option<u64>,
}

/// On-disk preferences shape. All fields optional so a partial file works.
#[derive(Debug, Default, Deserialize)]
struct PrefsFile {
    socket_path: Option<PathBuf>,
    homepage: Option<String>,
    navigation_timeout_ms: Option<u64>,
    content_timeout_ms: Option<u64>,
    max_request_bytes: Option<usize>,
    window_width: Option<u32>,
    window_height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct AppPreferences {
    pub socket_path: PathBuf,
    pub homepage: String,
    pub navigation_timeout: Duration,
    pub content_timeout: Duration,
    pub max_request_bytes: usize,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            homepage: DEFAULT_HOMEPAGE.to_string(),
            navigation_timeout: Duration::from_millis(DEFAULT_NAVIGATION_TIMEOUT_MS),
            content_timeout: Duration::from_millis(DEFAULT_CONTENT_TIMEOUT_MS),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

impl AppPreferences {
    /// Load preferences from an optional TOML file, then apply CLI
    /// overrides and validate.
    pub fn load(options: &CliOptions) -> Result<Self, PrefsError> {
        let mut prefs = match &options.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(path) = &options.socket_path {
            prefs.socket_path = path.clone();
        }
        if let Some(homepage) = &options.homepage {
            prefs.homepage = homepage.clone();
        }
        if let Some(ms) = options.navigation_timeout_ms {
            prefs.navigation_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = options.content_timeout_ms {
            prefs.content_timeout = Duration::from_millis(ms);
        }
        prefs.enforce_timeout_order();
        Ok(prefs)
    }

    pub fn from_file(path: &Path) -> Result<Self, PrefsError> {
        let text = fs::read_to_string(path).map_err(|source| PrefsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: PrefsFile = toml::from_str(&text).map_err(|source| PrefsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let defaults = Self::default();
        Ok(Self {
            socket_path: file.socket_path.unwrap_or(defaults.socket_path),
            homepage: file.homepage.unwrap_or(defaults.homepage),
            navigation_timeout: file
                .navigation_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.navigation_timeout),
            content_timeout: file
                .content_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.content_timeout),
            max_request_bytes: file.max_request_bytes.unwrap_or(defaults.max_request_bytes),
            window_width: file.window_width.unwrap_or(defaults.window_width),
            window_height: file.window_height.unwrap_or(defaults.window_height),
        })
    }

    /// Navigation waits must outlast content waits; a misconfigured pair is
    /// clamped rather than rejected.
    fn enforce_timeout_order(&mut self) {
        if self.navigation_timeout <= self.content_timeout {
            let bumped = self.content_timeout + Duration::from_secs(1);
            warn!(
                "navigation timeout {:?} does not exceed content timeout {:?}; clamping to {:?}",
                self.navigation_timeout, self.content_timeout, bumped
            );
            self.navigation_timeout = bumped;
        }
    }
}

fn default_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pilotshell.sock")
}
