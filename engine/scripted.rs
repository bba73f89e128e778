/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Deterministic in-process engine. Page loads "commit" from a worker
//! thread after a configurable latency, so the event path through
//! [`EngineHooks`] and the marshaler is exercised exactly as a real
//! embedding would exercise it. Script execution returns canned bridge
//! results, which tests queue up ahead of time.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::debug;
use parking_lot::Mutex;
use url::Url;

use super::{BrowserId, BrowserSpec, EngineError, EngineHooks, LoadingState, RenderingEngine};

/// Placeholder viewport capture; enough bytes to be recognizably PNG.
const PNG_STUB: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00,
];

struct BrowserState {
    url: String,
    title: String,
    loading: bool,
    can_go_back: bool,
    can_go_forward: bool,
    history: Vec<String>,
    history_pos: usize,
    page_source: String,
    /// Incremented per navigation so a slow completion for a superseded or
    /// closed navigation is ignored.
    nav_epoch: u64,
    hooks: Arc<EngineHooks>,
}

struct EngineInner {
    next_id: AtomicU64,
    browsers: Mutex<HashMap<BrowserId, BrowserState>>,
    load_latency: Mutex<Duration>,
    hang_loads: AtomicBool,
    queued_script_results: Mutex<VecDeque<String>>,
    executed_scripts: Mutex<Vec<(BrowserId, String)>>,
}

pub struct ScriptedEngine {
    inner: Arc<EngineInner>,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EngineInner {
                next_id: AtomicU64::new(1),
                browsers: Mutex::new(HashMap::new()),
                load_latency: Mutex::new(Duration::from_millis(20)),
                hang_loads: AtomicBool::new(false),
                queued_script_results: Mutex::new(VecDeque::new()),
                executed_scripts: Mutex::new(Vec::new()),
            }),
        }
    }

    /// How long a simulated load stays in flight before committing.
    pub fn set_load_latency(&self, latency: Duration) {
        *self.inner.load_latency.lock() = latency;
    }

    /// When set, started loads never commit. Used to drive wait timeouts.
    pub fn set_hang_loads(&self, hang: bool) {
        self.inner.hang_loads.store(hang, Ordering::SeqCst);
    }

    /// Queue a raw bridge result string; each `execute_script` call pops
    /// one. With the queue empty a benign `undefined` result is returned.
    pub fn enqueue_script_result(&self, raw: impl Into<String>) {
        self.inner.queued_script_results.lock().push_back(raw.into());
    }

    /// Scripts executed so far, in order. Test observability.
    pub fn executed_scripts(&self) -> Vec<(BrowserId, String)> {
        self.inner.executed_scripts.lock().clone()
    }

    pub fn browser_count(&self) -> usize {
        self.inner.browsers.lock().len()
    }

    fn begin_navigation(&self, id: BrowserId, url: String) {
        let (hooks, epoch) = {
            let mut browsers = self.inner.browsers.lock();
            let Some(state) = browsers.get_mut(&id) else {
                return;
            };
            state.loading = true;
            state.nav_epoch += 1;
            (Arc::clone(&state.hooks), state.nav_epoch)
        };
        (hooks.on_loading_state_changed)(
            id,
            LoadingState {
                is_loading: true,
                can_go_back: false,
                can_go_forward: false,
            },
        );
        if self.inner.hang_loads.load(Ordering::SeqCst) {
            debug!("scripted engine: load of {url} held in flight");
            return;
        }
        let latency = *self.inner.load_latency.lock();
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            thread::sleep(latency);
            complete_navigation(&inner, id, epoch, url);
        });
    }
}

/// Commit a navigation, unless the browser is gone or a newer navigation
/// superseded this one. Hooks fire outside the state lock, on this worker
/// thread.
fn complete_navigation(inner: &Arc<EngineInner>, id: BrowserId, epoch: u64, url: String) {
    let title = title_for(&url);
    let (hooks, state_snapshot) = {
        let mut browsers = inner.browsers.lock();
        let Some(state) = browsers.get_mut(&id) else {
            return;
        };
        if state.nav_epoch != epoch {
            return;
        }
        state.url = url.clone();
        state.title = title.clone();
        state.loading = false;
        // History traversals and reloads land on an existing entry; only a
        // fresh navigation extends the list (discarding forward entries).
        if state.history.get(state.history_pos) != Some(&url) {
            state.history.truncate(state.history_pos + 1);
            state.history.push(url.clone());
            state.history_pos = state.history.len() - 1;
        }
        state.can_go_back = state.history_pos > 0;
        state.can_go_forward = state.history_pos + 1 < state.history.len();
        state.page_source = format!(
            "<html><head><title>{title}</title></head><body><p>{url}</p></body></html>"
        );
        (
            Arc::clone(&state.hooks),
            LoadingState {
                is_loading: false,
                can_go_back: state.can_go_back,
                can_go_forward: state.can_go_forward,
            },
        )
    };
    (hooks.on_url_changed)(id, url);
    (hooks.on_title_changed)(id, title);
    (hooks.on_loading_state_changed)(id, state_snapshot);
}

fn title_for(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

impl RenderingEngine for ScriptedEngine {
    fn create_browser(
        &self,
        spec: BrowserSpec,
        hooks: EngineHooks,
    ) -> Result<BrowserId, EngineError> {
        let raw = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let id = BrowserId::from_raw(raw)
            .ok_or_else(|| EngineError::CreationFailed("id space exhausted".into()))?;
        debug!(
            "scripted engine: creating browser {id} at {}x{} for {}",
            spec.width, spec.height, spec.url
        );
        self.inner.browsers.lock().insert(
            id,
            BrowserState {
                url: String::new(),
                title: String::new(),
                loading: false,
                can_go_back: false,
                can_go_forward: false,
                history: Vec::new(),
                history_pos: 0,
                page_source: String::new(),
                nav_epoch: 0,
                hooks: Arc::new(hooks),
            },
        );
        self.begin_navigation(id, spec.url);
        Ok(id)
    }

    fn close_browser(&self, id: BrowserId) {
        if self.inner.browsers.lock().remove(&id).is_some() {
            debug!("scripted engine: closed browser {id}");
        }
    }

    fn has_browser(&self, id: BrowserId) -> bool {
        self.inner.browsers.lock().contains_key(&id)
    }

    fn load_url(&self, id: BrowserId, url: &str) {
        self.begin_navigation(id, url.to_string());
    }

    fn go_back(&self, id: BrowserId) {
        let target = {
            let mut browsers = self.inner.browsers.lock();
            let Some(state) = browsers.get_mut(&id) else {
                return;
            };
            if state.history_pos == 0 {
                return;
            }
            state.history_pos -= 1;
            state.history[state.history_pos].clone()
        };
        self.begin_navigation(id, target);
    }

    fn go_forward(&self, id: BrowserId) {
        let target = {
            let mut browsers = self.inner.browsers.lock();
            let Some(state) = browsers.get_mut(&id) else {
                return;
            };
            if state.history_pos + 1 >= state.history.len() {
                return;
            }
            state.history_pos += 1;
            state.history[state.history_pos].clone()
        };
        self.begin_navigation(id, target);
    }

    fn reload(&self, id: BrowserId, ignore_cache: bool) {
        let current = {
            let browsers = self.inner.browsers.lock();
            browsers.get(&id).map(|state| state.url.clone())
        };
        if let Some(url) = current {
            debug!("scripted engine: reloading {id} (ignore_cache={ignore_cache})");
            self.begin_navigation(id, url);
        }
    }

    fn set_focus(&self, id: BrowserId, focused: bool) {
        debug!("scripted engine: focus({focused}) on {id}");
    }

    fn current_url(&self, id: BrowserId) -> Option<String> {
        self.inner.browsers.lock().get(&id).map(|s| s.url.clone())
    }

    fn page_source(&self, id: BrowserId) -> Result<String, EngineError> {
        self.inner
            .browsers
            .lock()
            .get(&id)
            .map(|s| s.page_source.clone())
            .ok_or(EngineError::UnknownBrowser(id))
    }

    fn execute_script(&self, id: BrowserId, code: &str) -> Result<String, EngineError> {
        if !self.has_browser(id) {
            return Err(EngineError::UnknownBrowser(id));
        }
        self.inner
            .executed_scripts
            .lock()
            .push((id, code.to_string()));
        let raw = self
            .inner
            .queued_script_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| r#"{"success":true,"type":"undefined","result":null}"#.to_string());
        Ok(raw)
    }

    fn capture_screenshot(&self, id: BrowserId) -> Result<String, EngineError> {
        if !self.has_browser(id) {
            return Err(EngineError::UnknownBrowser(id));
        }
        Ok(BASE64.encode(PNG_STUB))
    }

    fn do_message_loop_work(&self) {
        // Loads commit from worker threads; nothing to pump here.
    }
}
