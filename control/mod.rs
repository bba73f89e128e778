/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The control plane: a Unix-domain socket speaking one HTTP/1.1 request
//! per connection, routed to handlers that drive the browser window. All
//! of it runs on the UI thread, polled from the run loop.

pub mod connection;
pub mod handlers;
pub mod http;
pub mod router;
pub mod script_result;
pub mod scripts;
pub mod server;

pub use server::ControlServer;
