/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The tab registry: an ordered collection of tab records guarded by one
//! mutex. Indices shift as tabs close; the engine-assigned [`BrowserId`] is
//! the stable key, and every engine event re-locates its tab by id. UI
//! side effects never happen under the lock — mutations queue
//! [`UiRefresh`] records that the UI thread drains afterwards.

use log::debug;
use parking_lot::Mutex;

use crate::engine::{BrowserId, LoadingState};

#[derive(Debug, Clone)]
pub struct Tab {
    pub browser_id: BrowserId,
    pub url: String,
    pub title: String,
    pub is_loading: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

impl Tab {
    pub fn new(browser_id: BrowserId, url: String) -> Self {
        Self {
            browser_id,
            url,
            title: String::new(),
            is_loading: true,
            can_go_back: false,
            can_go_forward: false,
        }
    }
}

/// An engine event re-targeted at whichever index the tab currently
/// occupies.
#[derive(Debug, Clone)]
pub enum TabEvent {
    UrlChanged { id: BrowserId, url: String },
    TitleChanged { id: BrowserId, title: String },
    LoadingStateChanged { id: BrowserId, state: LoadingState },
}

/// UI work produced by registry mutations, applied later on the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum UiRefresh {
    AddressBar(String),
    NavButtons {
        is_loading: bool,
        can_go_back: bool,
        can_go_forward: bool,
    },
    TabTitle { id: BrowserId, title: String },
}

/// Outcome of removing a tab. The caller owns engine teardown and UI
/// updates; the registry only does the bookkeeping.
#[derive(Debug, Clone, Copy)]
pub struct RemovedTab {
    pub browser_id: BrowserId,
    pub was_active: bool,
    /// Index to activate next; `None` means the registry is now empty and
    /// the window should close.
    pub new_active: Option<usize>,
}

struct TabTable {
    tabs: Vec<Tab>,
    active: usize,
}

pub struct TabRegistry {
    inner: Mutex<TabTable>,
    refreshes: Mutex<Vec<UiRefresh>>,
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TabRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TabTable {
                tabs: Vec::new(),
                active: 0,
            }),
            refreshes: Mutex::new(Vec::new()),
        }
    }

    /// Append a tab and return its index. Does not change the active tab.
    pub fn insert(&self, tab: Tab) -> usize {
        let mut table = self.inner.lock();
        table.tabs.push(tab);
        table.tabs.len() - 1
    }

    pub fn len(&self) -> usize {
        self.inner.lock().tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().tabs.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        let table = self.inner.lock();
        (!table.tabs.is_empty()).then_some(table.active)
    }

    pub fn browser_id_at(&self, index: usize) -> Option<BrowserId> {
        self.inner.lock().tabs.get(index).map(|tab| tab.browser_id)
    }

    pub fn index_of(&self, id: BrowserId) -> Option<usize> {
        self.inner
            .lock()
            .tabs
            .iter()
            .position(|tab| tab.browser_id == id)
    }

    pub fn snapshot_at(&self, index: usize) -> Option<Tab> {
        self.inner.lock().tabs.get(index).cloned()
    }

    pub fn active_snapshot(&self) -> Option<Tab> {
        let table = self.inner.lock();
        table.tabs.get(table.active).cloned()
    }

    /// Loading flag for a tab looked up by id. `None` once the tab is gone,
    /// which lets a pending wait distinguish "closed" from "finished".
    pub fn loading_state_of(&self, id: BrowserId) -> Option<bool> {
        self.inner
            .lock()
            .tabs
            .iter()
            .find(|tab| tab.browser_id == id)
            .map(|tab| tab.is_loading)
    }

    /// Flag a tab as loading at navigation-initiation time, before the
    /// engine's own loading event makes it back around the marshal queue.
    /// Wait loops that start right after the initiation would otherwise
    /// observe the stale "not loading" flag and return early.
    pub fn mark_loading(&self, id: BrowserId) {
        let mut table = self.inner.lock();
        if let Some(tab) = table.tabs.iter_mut().find(|tab| tab.browser_id == id) {
            tab.is_loading = true;
        }
    }

    /// Make `index` the active tab and return its snapshot for the UI.
    pub fn switch_to(&self, index: usize) -> Option<Tab> {
        let mut table = self.inner.lock();
        if index >= table.tabs.len() {
            return None;
        }
        table.active = index;
        table.tabs.get(index).cloned()
    }

    pub fn remove_at(&self, index: usize) -> Option<RemovedTab> {
        let mut table = self.inner.lock();
        if index >= table.tabs.len() {
            return None;
        }
        Some(Self::remove_locked(&mut table, index))
    }

    /// Remove whichever index currently holds `id`. Close affordances and
    /// long-lived waits hold ids, not indices, so intervening closes that
    /// shift the vector cannot retarget this removal.
    pub fn remove_by_id(&self, id: BrowserId) -> Option<RemovedTab> {
        let mut table = self.inner.lock();
        let index = table.tabs.iter().position(|tab| tab.browser_id == id)?;
        Some(Self::remove_locked(&mut table, index))
    }

    fn remove_locked(table: &mut TabTable, index: usize) -> RemovedTab {
        let tab = table.tabs.remove(index);
        let was_active = index == table.active;
        if table.tabs.is_empty() {
            table.active = 0;
            return RemovedTab {
                browser_id: tab.browser_id,
                was_active,
                new_active: None,
            };
        }
        if index < table.active {
            table.active -= 1;
        } else {
            table.active = table.active.min(table.tabs.len() - 1);
        }
        RemovedTab {
            browser_id: tab.browser_id,
            was_active,
            new_active: Some(table.active),
        }
    }

    /// Apply an engine event on the UI thread. Events for tabs that closed
    /// while the event was in flight are dropped.
    pub fn apply_event(&self, event: TabEvent) {
        let mut refreshes = Vec::new();
        {
            let mut table = self.inner.lock();
            let active = table.active;
            match event {
                TabEvent::UrlChanged { id, url } => {
                    let Some(index) = table.tabs.iter().position(|t| t.browser_id == id) else {
                        debug!("url change for closed browser {id}");
                        return;
                    };
                    table.tabs[index].url = url.clone();
                    if index == active {
                        refreshes.push(UiRefresh::AddressBar(url));
                    }
                }
                TabEvent::TitleChanged { id, title } => {
                    let Some(index) = table.tabs.iter().position(|t| t.browser_id == id) else {
                        debug!("title change for closed browser {id}");
                        return;
                    };
                    table.tabs[index].title = title.clone();
                    refreshes.push(UiRefresh::TabTitle { id, title });
                }
                TabEvent::LoadingStateChanged { id, state } => {
                    let Some(index) = table.tabs.iter().position(|t| t.browser_id == id) else {
                        debug!("loading state change for closed browser {id}");
                        return;
                    };
                    let tab = &mut table.tabs[index];
                    tab.is_loading = state.is_loading;
                    tab.can_go_back = state.can_go_back;
                    tab.can_go_forward = state.can_go_forward;
                    if index == active {
                        refreshes.push(UiRefresh::NavButtons {
                            is_loading: state.is_loading,
                            can_go_back: state.can_go_back,
                            can_go_forward: state.can_go_forward,
                        });
                    }
                }
            }
        }
        if !refreshes.is_empty() {
            self.refreshes.lock().append(&mut refreshes);
        }
    }

    /// Drain queued UI work. Called from the UI pump, never under the
    /// table lock.
    pub fn take_refreshes(&self) -> Vec<UiRefresh> {
        std::mem::take(&mut self.refreshes.lock())
    }
}
