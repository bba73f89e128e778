/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Cross-thread callback marshaling. Engine worker threads never touch
//! application state directly; they hand a callback plus a weak target
//! reference to the marshaler, and the UI thread runs it on its next pump.
//! If the target has been dropped by the time the call is dequeued, the
//! callback is discarded.

use std::sync::Weak;
use std::thread::{self, ThreadId};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, error};

/// A deferred call ready to run on the UI thread. Target liveness is
/// checked inside the box, at execution time.
type UiCall = Box<dyn FnOnce() + Send + 'static>;

/// Sender half, cloneable into any thread.
#[derive(Clone)]
pub struct UiMarshaler {
    tx: Sender<UiCall>,
    ui_thread: ThreadId,
}

/// Receiver half, owned by the UI thread's pump.
pub struct UiCallQueue {
    rx: Receiver<UiCall>,
}

/// Create the marshaler pair. Must be called on the UI thread: the calling
/// thread's id is recorded so the blocking variant can refuse to deadlock.
pub fn ui_marshaler() -> (UiMarshaler, UiCallQueue) {
    let (tx, rx) = unbounded();
    (
        UiMarshaler {
            tx,
            ui_thread: thread::current().id(),
        },
        UiCallQueue { rx },
    )
}

impl UiMarshaler {
    /// Fire-and-forget delivery. If `target` is already dead when the call
    /// is posted, or dies before the UI thread dequeues it, the callback is
    /// dropped without running.
    pub fn post<T, F>(&self, target: Weak<T>, callback: F)
    where
        T: Send + Sync + 'static,
        F: FnOnce(&T) + Send + 'static,
    {
        let call: UiCall = Box::new(move || {
            if let Some(target) = target.upgrade() {
                callback(&target);
            } else {
                debug!("dropping marshaled call: target no longer alive");
            }
        });
        if self.tx.send(call).is_err() {
            debug!("dropping marshaled call: UI queue closed");
        }
    }

    /// Blocking delivery: waits until the UI thread has executed the
    /// callback (or found the target dead) and reports whether it ran.
    /// Must never be called from the UI thread itself; the UI thread is the
    /// only consumer of the queue, so waiting on it from there can never
    /// complete. Such calls fail fast and return `false`.
    pub fn post_blocking<T, F>(&self, target: Weak<T>, callback: F) -> bool
    where
        T: Send + Sync + 'static,
        F: FnOnce(&T) + Send + 'static,
    {
        if thread::current().id() == self.ui_thread {
            error!("post_blocking invoked on the UI thread; refusing to wait on ourselves");
            debug_assert!(false, "post_blocking on the UI thread");
            return false;
        }
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let call: UiCall = Box::new(move || {
            let ran = match target.upgrade() {
                Some(target) => {
                    callback(&target);
                    true
                }
                None => false,
            };
            let _ = done_tx.send(ran);
        });
        if self.tx.send(call).is_err() {
            return false;
        }
        done_rx.recv().unwrap_or(false)
    }
}

impl UiCallQueue {
    /// Run every queued call. Called once per UI pump iteration.
    pub fn drain(&self) -> usize {
        let mut executed = 0;
        while let Ok(call) = self.rx.try_recv() {
            call();
            executed += 1;
        }
        executed
    }
}
