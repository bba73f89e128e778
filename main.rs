/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Pilotshell entry point: parse options, wire the engine and window
//! together on this thread, bring up the control socket, and run.

use std::process;
use std::rc::Rc;

use log::error;

use pilotshell::control::ControlServer;
use pilotshell::engine::ScriptedEngine;
use pilotshell::marshal::ui_marshaler;
use pilotshell::prefs::{AppPreferences, cli_options};
use pilotshell::runloop;
use pilotshell::window::{BrowserWindow, HeadlessUi};

fn main() {
    env_logger::init();
    let options = cli_options().run();
    let prefs = match AppPreferences::load(&options) {
        Ok(prefs) => prefs,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let engine = Rc::new(ScriptedEngine::new());
    let ui = Rc::new(HeadlessUi::with_size(prefs.window_width, prefs.window_height));
    let (marshaler, calls) = ui_marshaler();
    let window = BrowserWindow::new(engine, ui, marshaler, calls);

    let mut server = ControlServer::new(Rc::downgrade(&window), prefs.clone());
    if let Err(e) = server.initialize() {
        error!("{e}");
        process::exit(1);
    }

    if let Err(e) = window.create_tab(&prefs.homepage) {
        error!("failed to open homepage: {e}");
        process::exit(1);
    }

    runloop::run(&window, &mut server);
}
