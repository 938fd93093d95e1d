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
//! Encode log events as RFC [5424] [`syslog`] datagrams & send them over UDP.
//!
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424
//! [`syslog`]: https://en.wikipedia.org/wiki/Syslog
//!
//! # Introduction
//!
//! This crate is a logging backend: it takes structured log records, one at a time, and turns
//! each into a single RFC 5424 packet, fired off via UDP to a syslog collector. There's no
//! acknowledgement, no retry, no batching; if the collector isn't listening, the packet is lost &
//! the application carries on.
//!
//! The translation from log record to packet proceeds as follows:
//!
//! 1. the record's severity is checked against the configured minimum ([`backend`])
//! 2. the record's metadata is intersected with the configured structured data elements, each
//!    value coerced to text ([`value`], [`structured_data`])
//! 3. the message is rendered from the configured template ([`formatter`])
//! 4. the PRI is computed ([`facility`]), the timestamp rendered ([`timestamp`]) & the whole
//!    packet assembled behind a cached identity block ([`rfc5424`])
//! 5. the packet is handed to the [`transport`]
//!
//! Records may be built directly (as [`event::LogEvent`]s) & handed to a [`backend::Backend`],
//! but most applications will use the [`tracing`] integration: [`layer::Layer`] is a
//! [`tracing-subscriber`] [`Layer`] that does all of the above for each [`Event`].
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//!
//! # Usage
//!
//! ```rust
//! use syslog_udp_backend::{config::Options, facility::Facility, layer::Layer};
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//! use tracing_subscriber::registry::Registry;
//!
//! let layer = Layer::with_options(
//!     Options::default()
//!         .host("127.0.0.1")
//!         .port(5514)
//!         .facility(Facility::LOG_LOCAL1)
//!         .app_name("svc"),
//! )
//! .unwrap();
//! let handle = layer.handle();
//! let subscriber = Registry::default().with(layer);
//! let _guard = tracing::subscriber::set_default(subscriber);
//!
//! tracing::error!("boom");
//!
//! // Later: only warnings & worse, please
//! handle
//!     .configure(Options::default().level(syslog_udp_backend::facility::Level::LOG_WARNING))
//!     .unwrap();
//! ```
//!
//! The `error!` above produces a datagram like:
//!
//! ```text
//! <139>1 2024-01-02T03:04:05.006Z hostname svc 1234 - boom
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod facility;
pub mod formatter;
pub mod layer;
pub mod rfc5424;
pub mod structured_data;
pub mod timestamp;
pub mod tracing;
pub mod transport;
pub mod value;
