/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The UI thread's main loop. Each iteration pumps the window (marshaled
//! calls, engine work, chrome refreshes) and polls the control server.
//! Handler waits that run inside a dispatch pump only the window, never
//! the server, so a wait can never re-enter request dispatch.

use std::rc::Rc;
use std::thread;
use std::time::Duration;

use log::info;

use crate::control::ControlServer;
use crate::window::BrowserWindow;

const IDLE_SLEEP: Duration = Duration::from_millis(5);

/// Drive the window and server until the window closes, then shut the
/// server down before returning.
pub fn run(window: &Rc<BrowserWindow>, server: &mut ControlServer) {
    info!("entering UI run loop");
    loop {
        window.pump_once();
        server.poll();
        if window.should_close() {
            break;
        }
        thread::sleep(IDLE_SLEEP);
    }
    info!("window closed; leaving UI run loop");
    server.shutdown();
}
