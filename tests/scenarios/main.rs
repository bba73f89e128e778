/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! End-to-end scenarios: a headless shell on its own UI thread, driven
//! through the real control socket exactly as an automation client would.

mod harness;

mod content;
mod framing;
mod navigation;
mod tabs_lifecycle;
