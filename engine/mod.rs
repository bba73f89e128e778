/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Rendering engine seam. The shell never assumes a concrete engine; it
//! talks to this trait, which a real embedding (CEF, WebKit, ...) or the
//! deterministic scripted engine implements. Engine calls are made from the
//! UI thread only. Engine *events* arrive through [`EngineHooks`] on
//! whatever thread the engine uses internally; hook implementations must
//! marshal back to the UI thread themselves.

pub mod scripted;

use std::fmt;

pub use scripted::ScriptedEngine;

/// Stable identifier the engine assigns to each browser instance.
/// Monotonic, never reused for the lifetime of the process. Zero is never
/// a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrowserId(u64);

impl BrowserId {
    pub fn from_raw(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BrowserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Initial parameters for a browser instance.
#[derive(Debug, Clone)]
pub struct BrowserSpec {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f32,
}

/// Callbacks the engine invokes as a page changes state. These run on
/// engine-internal threads.
pub struct EngineHooks {
    pub on_url_changed: Box<dyn Fn(BrowserId, String) + Send + Sync>,
    pub on_title_changed: Box<dyn Fn(BrowserId, String) + Send + Sync>,
    pub on_loading_state_changed: Box<dyn Fn(BrowserId, LoadingState) + Send + Sync>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingState {
    pub is_loading: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown browser id {0}")]
    UnknownBrowser(BrowserId),
    #[error("browser creation failed: {0}")]
    CreationFailed(String),
    #[error("script bridge failure: {0}")]
    ScriptBridge(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
}

/// The engine surface the shell drives. Every method is called on the UI
/// thread.
pub trait RenderingEngine {
    /// Create a browser instance and return its stable id. `hooks` will be
    /// invoked for this instance until [`close_browser`](Self::close_browser).
    fn create_browser(&self, spec: BrowserSpec, hooks: EngineHooks)
    -> Result<BrowserId, EngineError>;

    /// Tear down a browser instance. Idempotent; unknown ids are ignored.
    fn close_browser(&self, id: BrowserId);

    fn has_browser(&self, id: BrowserId) -> bool;

    fn load_url(&self, id: BrowserId, url: &str);
    fn go_back(&self, id: BrowserId);
    fn go_forward(&self, id: BrowserId);
    fn reload(&self, id: BrowserId, ignore_cache: bool);
    fn set_focus(&self, id: BrowserId, focused: bool);

    fn current_url(&self, id: BrowserId) -> Option<String>;

    /// Serialized page source for the browser's main frame.
    fn page_source(&self, id: BrowserId) -> Result<String, EngineError>;

    /// Execute script in the page and return the bridge's raw JSON result
    /// string (see `control::script_result` for the shape).
    fn execute_script(&self, id: BrowserId, code: &str) -> Result<String, EngineError>;

    /// Capture the current viewport as a base64-encoded PNG.
    fn capture_screenshot(&self, id: BrowserId) -> Result<String, EngineError>;

    /// One slice of the engine's internal message loop. Called every UI
    /// pump iteration and from bounded wait loops.
    fn do_message_loop_work(&self);
}

/// Engines are often shared (the shell holds one handle, a harness or
/// supervisor another); forwarding through `Arc` keeps the trait object
/// usable either way.
impl<E: RenderingEngine + ?Sized> RenderingEngine for std::sync::Arc<E> {
    fn create_browser(
        &self,
        spec: BrowserSpec,
        hooks: EngineHooks,
    ) -> Result<BrowserId, EngineError> {
        (**self).create_browser(spec, hooks)
    }

    fn close_browser(&self, id: BrowserId) {
        (**self).close_browser(id)
    }

    fn has_browser(&self, id: BrowserId) -> bool {
        (**self).has_browser(id)
    }

    fn load_url(&self, id: BrowserId, url: &str) {
        (**self).load_url(id, url)
    }

    fn go_back(&self, id: BrowserId) {
        (**self).go_back(id)
    }

    fn go_forward(&self, id: BrowserId) {
        (**self).go_forward(id)
    }

    fn reload(&self, id: BrowserId, ignore_cache: bool) {
        (**self).reload(id, ignore_cache)
    }

    fn set_focus(&self, id: BrowserId, focused: bool) {
        (**self).set_focus(id, focused)
    }

    fn current_url(&self, id: BrowserId) -> Option<String> {
        (**self).current_url(id)
    }

    fn page_source(&self, id: BrowserId) -> Result<String, EngineError> {
        (**self).page_source(id)
    }

    fn execute_script(&self, id: BrowserId, code: &str) -> Result<String, EngineError> {
        (**self).execute_script(id, code)
    }

    fn capture_screenshot(&self, id: BrowserId) -> Result<String, EngineError> {
        (**self).capture_screenshot(id)
    }

    fn do_message_loop_work(&self) {
        (**self).do_message_loop_work()
    }
}
