// Copyright (C) 2022-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of syslog-udp-backend.
//
// syslog-udp-backend is free software: you can redistribute it and/or modify it under the terms of
// the GNU General Public License as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// syslog-udp-backend is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with syslog-udp-backend.
// If not, see <http://www.gnu.org/licenses/>.

//! Test writing to a syslog collector via UDP.
//!
//! With no arguments, sends to port 514 on the local host. Given a path, reads persisted settings
//! from that TOML file first, e.g.
//!
//! ```text
//! host = "127.0.0.1"
//! port = 5514
//! facility = "local1"
//! format = "$level$levelpad $metadata$message"
//! metadata = ["attempt"]
//!
//! [[structured_data]]
//! id = "tracing-meta@64700"
//! keys = ["file", "line", "module"]
//! ```

use syslog_udp_backend::{config::Options, layer::Layer};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

pub fn main() {
    let options = match std::env::args().nth(1) {
        Some(path) => Options::from_toml(&std::fs::read_to_string(path).unwrap()).unwrap(),
        None => Options::default(),
    };
    let layer = Layer::with_options(options).unwrap();
    let handle = layer.handle();
    // Setup the real subsriber...
    let subscriber = Registry::default().with(layer);
    // and install it.
    let _guard = tracing::subscriber::set_default(subscriber);

    trace!("Hello, 世界!");
    debug!("Hello, 世界!");
    info!(attempt = 1, "Hello, 世界!");
    warn!(attempt = 2, "Hello, 世界!");
    error!(attempt = 3, "Hello, 世界!");

    handle.shutdown();
}
