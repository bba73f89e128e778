/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Pilotshell: a single-window browser shell with a Unix-socket control
//! plane. An automation client drives the embedded rendering engine over
//! HTTP/1.1 on a local socket; every browser operation is executed on the
//! UI thread, with engine worker threads reaching application state only
//! through the callback marshaler.

pub mod control;
pub mod engine;
pub mod marshal;
pub mod prefs;
pub mod runloop;
pub mod window;

pub use engine::BrowserId;
pub use prefs::AppPreferences;
pub use window::BrowserWindow;
