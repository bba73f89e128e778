/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The browser window: one engine, one tab registry, one toolkit surface.
//! Lives on the UI thread behind an `Rc`; everything that crosses a thread
//! boundary goes through the marshaler and the registry's refresh queue.

pub mod tabs;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::engine::{BrowserId, BrowserSpec, EngineError, EngineHooks, RenderingEngine};
use crate::marshal::{UiCallQueue, UiMarshaler};
use tabs::{Tab, TabEvent, TabRegistry, UiRefresh};

/// Interval between pump iterations inside bounded waits.
const WAIT_PUMP_INTERVAL: Duration = Duration::from_millis(10);

/// Toolkit surface the window drives. Tab-strip entries are keyed by
/// [`BrowserId`] so close affordances survive index shifts.
pub trait WindowUi {
    fn add_tab_entry(&self, id: BrowserId, title: &str);
    fn remove_tab_entry(&self, id: BrowserId);
    fn set_tab_title(&self, id: BrowserId, title: &str);
    fn set_active_tab(&self, index: usize);
    fn set_address_bar(&self, url: &str);
    fn set_nav_buttons(&self, is_loading: bool, can_go_back: bool, can_go_forward: bool);
    fn request_repaint(&self) {}
    fn close_window(&self);
    fn close_requested(&self) -> bool;
    fn content_size(&self) -> (u32, u32) {
        (1280, 800)
    }
    fn scale_factor(&self) -> f32 {
        1.0
    }
}

/// Recording surface for headless operation and tests.
pub struct HeadlessUi {
    entries: RefCell<Vec<(BrowserId, String)>>,
    active_tab: Cell<usize>,
    address_bar: RefCell<String>,
    nav_buttons: Cell<(bool, bool, bool)>,
    close_requested: Cell<bool>,
    repaints: Cell<usize>,
    content_size: (u32, u32),
}

impl Default for HeadlessUi {
    fn default() -> Self {
        Self::with_size(1280, 800)
    }
}

impl HeadlessUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            active_tab: Cell::new(0),
            address_bar: RefCell::new(String::new()),
            nav_buttons: Cell::new((false, false, false)),
            close_requested: Cell::new(false),
            repaints: Cell::new(0),
            content_size: (width, height),
        }
    }

    pub fn entries(&self) -> Vec<(BrowserId, String)> {
        self.entries.borrow().clone()
    }

    pub fn address_bar(&self) -> String {
        self.address_bar.borrow().clone()
    }

    pub fn active_tab(&self) -> usize {
        self.active_tab.get()
    }

    pub fn repaints(&self) -> usize {
        self.repaints.get()
    }
}

impl WindowUi for HeadlessUi {
    fn add_tab_entry(&self, id: BrowserId, title: &str) {
        self.entries.borrow_mut().push((id, title.to_string()));
    }

    fn remove_tab_entry(&self, id: BrowserId) {
        self.entries.borrow_mut().retain(|(entry, _)| *entry != id);
    }

    fn set_tab_title(&self, id: BrowserId, title: &str) {
        let mut entries = self.entries.borrow_mut();
        if let Some(entry) = entries.iter_mut().find(|(entry, _)| *entry == id) {
            entry.1 = title.to_string();
        }
    }

    fn set_active_tab(&self, index: usize) {
        self.active_tab.set(index);
    }

    fn set_address_bar(&self, url: &str) {
        *self.address_bar.borrow_mut() = url.to_string();
    }

    fn set_nav_buttons(&self, is_loading: bool, can_go_back: bool, can_go_forward: bool) {
        self.nav_buttons.set((is_loading, can_go_back, can_go_forward));
    }

    fn request_repaint(&self) {
        self.repaints.set(self.repaints.get() + 1);
    }

    fn close_window(&self) {
        self.close_requested.set(true);
    }

    fn close_requested(&self) -> bool {
        self.close_requested.get()
    }

    fn content_size(&self) -> (u32, u32) {
        self.content_size
    }
}

pub struct BrowserWindow {
    engine: Rc<dyn RenderingEngine>,
    ui: Rc<dyn WindowUi>,
    registry: Arc<TabRegistry>,
    marshaler: UiMarshaler,
    calls: UiCallQueue,
}

impl BrowserWindow {
    pub fn new(
        engine: Rc<dyn RenderingEngine>,
        ui: Rc<dyn WindowUi>,
        marshaler: UiMarshaler,
        calls: UiCallQueue,
    ) -> Rc<Self> {
        Rc::new(Self {
            engine,
            ui,
            registry: Arc::new(TabRegistry::new()),
            marshaler,
            calls,
        })
    }

    pub fn engine(&self) -> &dyn RenderingEngine {
        &*self.engine
    }

    pub fn registry(&self) -> &Arc<TabRegistry> {
        &self.registry
    }

    pub fn ui(&self) -> &dyn WindowUi {
        &*self.ui
    }

    pub fn tab_count(&self) -> usize {
        self.registry.len()
    }

    pub fn active_tab_index(&self) -> Option<usize> {
        self.registry.active_index()
    }

    pub fn active_browser_id(&self) -> Option<BrowserId> {
        self.registry.active_snapshot().map(|tab| tab.browser_id)
    }

    pub fn should_close(&self) -> bool {
        self.ui.close_requested()
    }

    /// One UI-thread frame: run marshaled calls, give the engine a message
    /// loop slice, then flush queued chrome updates.
    pub fn pump_once(&self) {
        self.calls.drain();
        self.engine.do_message_loop_work();
        let refreshes = self.registry.take_refreshes();
        let dirty = !refreshes.is_empty();
        for refresh in refreshes {
            match refresh {
                UiRefresh::AddressBar(url) => self.ui.set_address_bar(&url),
                UiRefresh::NavButtons {
                    is_loading,
                    can_go_back,
                    can_go_forward,
                } => self.ui.set_nav_buttons(is_loading, can_go_back, can_go_forward),
                UiRefresh::TabTitle { id, title } => self.ui.set_tab_title(id, &title),
            }
        }
        if dirty {
            self.ui.request_repaint();
        }
    }

    /// Create a tab loading `url`, make it active, and return its index.
    pub fn create_tab(&self, url: &str) -> Result<usize, EngineError> {
        let (width, height) = self.ui.content_size();
        let spec = BrowserSpec {
            url: url.to_string(),
            width,
            height,
            device_scale_factor: self.ui.scale_factor(),
        };
        let hooks = self.event_hooks();
        let id = self.engine.create_browser(spec, hooks)?;
        let index = self.registry.insert(Tab::new(id, url.to_string()));
        self.ui.add_tab_entry(id, url);
        self.switch_to_tab(index);
        debug!("created tab {index} (browser {id}) for {url}");
        Ok(index)
    }

    /// Engine event callbacks for a new browser. They run on engine
    /// threads and only ever touch the registry, via the marshaler.
    fn event_hooks(&self) -> EngineHooks {
        let url_marshaler = self.marshaler.clone();
        let url_registry = Arc::downgrade(&self.registry);
        let title_marshaler = self.marshaler.clone();
        let title_registry = Arc::downgrade(&self.registry);
        let load_marshaler = self.marshaler.clone();
        let load_registry = Arc::downgrade(&self.registry);
        EngineHooks {
            on_url_changed: Box::new(move |id, url| {
                url_marshaler.post(url_registry.clone(), move |registry| {
                    registry.apply_event(TabEvent::UrlChanged { id, url });
                });
            }),
            on_title_changed: Box::new(move |id, title| {
                title_marshaler.post(title_registry.clone(), move |registry| {
                    registry.apply_event(TabEvent::TitleChanged { id, title });
                });
            }),
            on_loading_state_changed: Box::new(move |id, state| {
                load_marshaler.post(load_registry.clone(), move |registry| {
                    registry.apply_event(TabEvent::LoadingStateChanged { id, state });
                });
            }),
        }
    }

    /// Start loading `url` in the tab at `index`. Marks the tab loading
    /// up front so an immediately following wait observes the navigation.
    pub fn navigate_tab(&self, index: usize, url: &str) -> bool {
        let Some(id) = self.registry.browser_id_at(index) else {
            return false;
        };
        self.registry.mark_loading(id);
        self.engine.load_url(id, url);
        true
    }

    /// History traversal; returns whether a navigation was initiated.
    pub fn history_back(&self, index: usize) -> bool {
        let Some(snapshot) = self.registry.snapshot_at(index) else {
            return false;
        };
        if !snapshot.can_go_back {
            return false;
        }
        self.registry.mark_loading(snapshot.browser_id);
        self.engine.go_back(snapshot.browser_id);
        true
    }

    pub fn history_forward(&self, index: usize) -> bool {
        let Some(snapshot) = self.registry.snapshot_at(index) else {
            return false;
        };
        if !snapshot.can_go_forward {
            return false;
        }
        self.registry.mark_loading(snapshot.browser_id);
        self.engine.go_forward(snapshot.browser_id);
        true
    }

    pub fn reload_tab(&self, index: usize, ignore_cache: bool) -> bool {
        let Some(id) = self.registry.browser_id_at(index) else {
            return false;
        };
        self.registry.mark_loading(id);
        self.engine.reload(id, ignore_cache);
        true
    }

    /// Committed URL of the tab at `index`, per the registry.
    pub fn url_of(&self, index: usize) -> Option<String> {
        self.registry.snapshot_at(index).map(|tab| tab.url)
    }

    pub fn switch_to_tab(&self, index: usize) -> bool {
        let Some(snapshot) = self.registry.switch_to(index) else {
            return false;
        };
        self.ui.set_active_tab(index);
        self.ui.set_address_bar(&snapshot.url);
        self.ui.set_nav_buttons(
            snapshot.is_loading,
            snapshot.can_go_back,
            snapshot.can_go_forward,
        );
        self.engine.set_focus(snapshot.browser_id, true);
        self.ui.request_repaint();
        true
    }

    pub fn close_tab(&self, index: usize) -> bool {
        let Some(removed) = self.registry.remove_at(index) else {
            return false;
        };
        self.finish_close(removed);
        true
    }

    /// Close a tab by its stable engine id. The id-keyed removal means an
    /// index shift between the capture of the id and this call cannot
    /// close the wrong tab.
    pub fn close_tab_by_browser_id(&self, id: BrowserId) -> bool {
        let Some(removed) = self.registry.remove_by_id(id) else {
            return false;
        };
        self.finish_close(removed);
        true
    }

    fn finish_close(&self, removed: tabs::RemovedTab) {
        // Engine teardown happens after the registry lock is released;
        // teardown can re-enter through events.
        self.engine.close_browser(removed.browser_id);
        self.ui.remove_tab_entry(removed.browser_id);
        match removed.new_active {
            Some(index) if removed.was_active => {
                self.switch_to_tab(index);
            }
            Some(index) => {
                self.ui.set_active_tab(index);
                self.ui.request_repaint();
            }
            None => {
                debug!("last tab closed; closing window");
                self.ui.close_window();
            }
        }
    }

    /// Wait until the tab at `index` finishes loading, pumping the UI
    /// queue the whole time so engine events can land. Returns `false` on
    /// timeout, window close, or the tab disappearing mid-wait.
    pub fn wait_for_load(&self, index: usize, timeout: Duration) -> bool {
        let Some(id) = self.registry.browser_id_at(index) else {
            return false;
        };
        self.wait_for_load_by_id(id, timeout)
    }

    pub fn wait_for_load_by_id(&self, id: BrowserId, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            match self.registry.loading_state_of(id) {
                None => {
                    warn!("tab for browser {id} closed while waiting for load");
                    return false;
                }
                Some(false) => return true,
                Some(true) => {}
            }
            if self.ui.close_requested() {
                return false;
            }
            if start.elapsed() >= timeout {
                warn!("load wait for browser {id} timed out after {timeout:?}");
                return false;
            }
            self.pump_once();
            thread::sleep(WAIT_PUMP_INTERVAL);
        }
    }
}
