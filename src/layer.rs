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

//! [syslog-udp-backend](crate) [`Layer`] implementation.
//!
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! [`Layer`] plugs a [`Backend`] into a [`tracing`] subscriber. The backend lives behind a mutex,
//! making it a single, serialized actor: events are encoded & sent one at a time, and a
//! reconfiguration (made through a [`LayerHandle`]) runs to completion between two events, never
//! during one.
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html

use crate::{
    backend::Backend,
    config::{Config, Options},
    error::Result,
    facility::Level,
    tracing::{default_level_mapping, to_log_event},
    transport::{Transport, UdpTransport},
};

use tracing::Event;
use tracing_subscriber::layer::Context;

use std::{
    cell::Cell,
    sync::{Arc, Mutex, MutexGuard},
};

// When the tracing-log feature is enabled, use NormalizeEvent to extract file/line metadata
// from events that originated from the `log` crate. This follows the same pattern used by
// tracing-subscriber's fmt layer.
// See: https://github.com/tokio-rs/tracing/blob/master/tracing-subscriber/src/fmt/fmt_layer.rs
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

thread_local! {
    // Set while this thread is inside the backend. The backend logs its own failures through
    // `tracing`, & those events would otherwise come right back to us while we hold the lock.
    static IN_BACKEND: Cell<bool> = Cell::new(false);
}

struct Reentrancy;

impl Reentrancy {
    fn enter() -> Option<Reentrancy> {
        IN_BACKEND.with(|flag| {
            if flag.replace(true) {
                None
            } else {
                Some(Reentrancy)
            }
        })
    }
}

impl Drop for Reentrancy {
    fn drop(&mut self) {
        IN_BACKEND.with(|flag| flag.set(false));
    }
}

fn lock<T: Transport>(backend: &Mutex<Backend<T>>) -> MutexGuard<'_, Backend<T>> {
    // A panic while we held the lock can't leave the backend half-updated (reconfiguration swaps
    // in a whole new snapshot), so carry on.
    backend.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Layer                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that will send [`Event`]s to a
/// syslog collector.
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
pub struct Layer<T: Transport> {
    backend: Arc<Mutex<Backend<T>>>,
    map_level: Box<dyn Fn(&tracing::Level) -> Level + Send + Sync>,
}

impl Layer<UdpTransport> {
    /// Attempt to construct a [`Layer`] that will send RFC5424-compliant syslog messages via UDP to
    /// port 514 on localhost
    pub fn try_default() -> Result<Self> {
        Ok(Layer::new(Backend::try_default()?))
    }
    /// Attempt to construct a [`Layer`] sending via UDP, configured with `options` layered over
    /// the defaults.
    pub fn with_options(options: Options) -> Result<Self> {
        Ok(Layer::new(Backend::with_persisted(
            options,
            UdpTransport::new()?,
        )?))
    }
}

impl<T: Transport> Layer<T> {
    pub fn new(backend: Backend<T>) -> Self {
        Layer {
            backend: Arc::new(Mutex::new(backend)),
            map_level: Box::new(default_level_mapping),
        }
    }
    /// Replace the mapping from [`tracing::Level`] to syslog severity.
    pub fn with_level_mapping<F>(mut self, map_level: F) -> Self
    where
        F: Fn(&tracing::Level) -> Level + Send + Sync + 'static,
    {
        self.map_level = Box::new(map_level);
        self
    }
    /// Get a handle through which this layer's backend may be reconfigured, or shut down, after
    /// the layer's been handed off to a subscriber.
    pub fn handle(&self) -> LayerHandle<T> {
        LayerHandle {
            backend: Arc::clone(&self.backend),
        }
    }
}

/// Reconfigure or shut down the backend behind a [`Layer`].
pub struct LayerHandle<T: Transport> {
    backend: Arc<Mutex<Backend<T>>>,
}

impl<T: Transport> Clone for LayerHandle<T> {
    fn clone(&self) -> Self {
        LayerHandle {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<T: Transport> LayerHandle<T> {
    /// Apply `overrides`; see [`Backend::configure`]. Blocks while the collector's name is
    /// resolved, and no events are sent in the meantime.
    pub fn configure(&self, overrides: Options) -> Result<()> {
        let _guard = Reentrancy::enter();
        lock(&self.backend).configure(overrides)
    }
    /// The current configuration snapshot
    pub fn config(&self) -> Arc<Config> {
        lock(&self.backend).config()
    }
    /// Close the transport; any events arriving later are discarded.
    pub fn shutdown(&self) {
        let _guard = Reentrancy::enter();
        lock(&self.backend).shutdown()
    }
}

/// This is the Big Tuna-- the [`Layer`] implementation.
///
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
impl<S, T> tracing_subscriber::layer::Layer<S> for Layer<T>
where
    S: tracing::Subscriber,
    T: Transport + Send + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let _guard = match Reentrancy::enter() {
            Some(guard) => guard,
            None => return,
        };

        // When the tracing-log feature is enabled, use normalized_metadata() to get
        // file/line info for events that originated from the `log` crate.
        // For native tracing events, normalized_metadata() returns None and we use
        // the event's own metadata.
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        let log_event = to_log_event(event, meta, &*self.map_level);
        lock(&self.backend).handle_event(&log_event);
    }
}

#[cfg(test)]
mod smoke {

    use super::*;

    use crate::{facility::Facility, structured_data::SdSpec};

    use std::{net::UdpSocket, time::Duration};

    use tracing_subscriber::{
        layer::SubscriberExt, // Needed to get `with()`
        registry::Registry,
    };

    fn collector() -> UdpSocket {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        sock
    }

    fn recv(sock: &UdpSocket) -> Option<String> {
        let mut buf = [0u8; 4096];
        sock.recv(&mut buf)
            .ok()
            .map(|n| String::from_utf8(buf[..n].to_vec()).unwrap())
    }

    #[test]
    fn test_tracing_via_udp() {
        // Exercise `try_default()`, just to be sure it compiles.
        let _layer = Layer::try_default().unwrap();

        let sock = collector();
        let layer = Layer::with_options(
            Options::default()
                .port(sock.local_addr().unwrap().port())
                .facility(Facility::LOG_LOCAL4)
                .app_name("smoke")
                .level(Level::LOG_INFO)
                .structured_data(vec![SdSpec::new("tracing-meta@64700", ["target", "attempt"])]),
        )
        .unwrap();
        let handle = layer.handle();
        let subscriber = Registry::default().with(layer);
        let _guard = tracing::subscriber::set_default(subscriber);

        tracing::debug!("filtered out");
        tracing::info!(target: "smoke", attempt = 2, "Hello, 世界!");
        let packet = recv(&sock).unwrap();
        assert!(packet.starts_with("<166>1 "), "{}", packet);
        assert!(
            packet.ends_with(&format!(
                " smoke {} - [tracing-meta@64700 target=\"smoke\" attempt=\"2\"] Hello, 世界!\n",
                std::process::id()
            )),
            "{}",
            packet
        );

        handle
            .configure(Options::default().level(Level::LOG_DEBUG).structured_data(vec![]))
            .unwrap();
        assert_eq!(handle.config().level(), Level::LOG_DEBUG);
        tracing::debug!("let through");
        let packet = recv(&sock).unwrap();
        assert!(packet.starts_with("<167>1 "), "{}", packet);
        assert!(packet.ends_with(" - let through\n"), "{}", packet);

        handle.shutdown();
        tracing::error!("nobody listening");
        assert!(recv(&sock).is_none());
    }

    #[test]
    fn level_mapping() {
        let sock = collector();
        let layer = Layer::with_options(
            Options::default()
                .port(sock.local_addr().unwrap().port())
                .facility(Facility::LOG_LOCAL0),
        )
        .unwrap()
        .with_level_mapping(|_| Level::LOG_CRIT);
        let _guard = tracing::subscriber::set_default(Registry::default().with(layer));

        tracing::trace!("escalated");
        let packet = recv(&sock).unwrap();
        assert!(packet.starts_with("<130>1 "), "{}", packet);
    }
}
