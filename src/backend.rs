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

//! The backend: filtering, encoding & dispatch of log events.
//!
//! A [`Backend`] owns a configuration snapshot & a transport. Each event handed to it is checked
//! against the configured minimum severity, encoded as an RFC 5424 packet & sent. Nothing in that
//! path can fail from the caller's point of view: logging must never take the application down,
//! so encoding anomalies are papered-over where they occur & transport errors are logged &
//! dropped.
//!
//! [`Backend`] methods that change state take `&mut self`, so reconfiguration & event handling
//! are naturally serialized; [`crate::layer::Layer`] wraps one in a mutex to get the same
//! guarantee across threads.

use crate::{
    config::{Config, Options},
    error::Result,
    event::LogEvent,
    facility::{severity_code, Level},
    rfc5424::assemble,
    structured_data,
    transport::{Transport, UdpTransport},
};

use std::sync::Arc;

/// Should an event at `level` be sent, given a minimum severity of `minimum`?
///
/// Lower codes are more urgent, so anything numerically at or below the minimum passes.
pub fn should_emit(level: Level, minimum: Level) -> bool {
    severity_code(level) <= severity_code(minimum)
}

/// Encode `event` under `config`: structured data, then the message, then the whole packet.
pub fn encode(config: &Config, event: &LogEvent) -> Vec<u8> {
    let sd = structured_data::format_elements(&structured_data::encode(
        config.structured_data(),
        &event.metadata,
    ));
    let body = config.template().render(event, config.metadata());
    assemble(
        event.level,
        config.facility(),
        &event.timestamp,
        config.identity(),
        &sd,
        &body,
    )
}

/// A syslog backend sending over transport `T`.
pub struct Backend<T: Transport> {
    config: Arc<Config>,
    // Settings accumulated over every reconfiguration; later calls are layered on top.
    persisted: Options,
    // `None` once we've been shut down
    transport: Option<T>,
}

impl Backend<UdpTransport> {
    /// Attempt to construct a [`Backend`] with the default configuration, sending over UDP to port
    /// 514 on localhost.
    pub fn try_default() -> Result<Self> {
        Ok(Backend::new(Config::default(), UdpTransport::new()?))
    }
}

impl<T: Transport> Backend<T> {
    pub fn new(config: Config, transport: T) -> Self {
        Backend {
            config: Arc::new(config),
            persisted: Options::default(),
            transport: Some(transport),
        }
    }
    /// Construct a [`Backend`] whose configuration starts from the defaults, with `persisted`
    /// layered on top.
    pub fn with_persisted(persisted: Options, transport: T) -> Result<Self> {
        let config = Config::default().configure(&persisted)?;
        Ok(Backend {
            config: Arc::new(config),
            persisted,
            transport: Some(transport),
        })
    }
    /// The current configuration snapshot.
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
    /// Every setting applied so far.
    pub fn persisted(&self) -> &Options {
        &self.persisted
    }
    /// Reconfigure: `overrides` are layered over the persisted settings, and the result over the
    /// current snapshot.
    ///
    /// If the new configuration can't be built (the collector can't be resolved, say) the error
    /// is returned & the backend carries on with its current configuration.
    pub fn configure(&mut self, overrides: Options) -> Result<()> {
        let merged = self.persisted.clone().merge(overrides);
        let next = self.config.configure(&merged).map_err(|err| {
            tracing::warn!("syslog reconfiguration refused: {}", err);
            err
        })?;
        self.persisted = merged;
        self.config = Arc::new(next);
        Ok(())
    }
    /// Filter, encode & send `event`. Returns true if a packet was handed to the transport.
    pub fn handle_event(&self, event: &LogEvent) -> bool {
        let config = &*self.config;
        if !should_emit(event.level, config.level()) {
            return false;
        }
        let transport = match &self.transport {
            Some(transport) => transport,
            None => return false,
        };
        match transport.send(&encode(config, event), config.destination()) {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(
                    "failed to send syslog packet to {}: {}",
                    config.destination(),
                    err
                );
                false
            }
        }
    }
    /// Release the transport; events handled after this are silently discarded.
    pub fn shutdown(&mut self) {
        if self.transport.take().is_some() {
            tracing::debug!("syslog backend shut down");
        }
    }
    pub fn is_shut_down(&self) -> bool {
        self.transport.is_none()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::{
        error::Error,
        facility::Facility,
        structured_data::SdSpec,
        timestamp::Timestamp,
        value::Value,
    };

    use backtrace::Backtrace;

    use std::{cell::RefCell, net::SocketAddr, rc::Rc};

    type Sent = Rc<RefCell<Vec<(Vec<u8>, SocketAddr)>>>;

    struct Recorder(Sent);

    impl Transport for Recorder {
        fn send(&self, buf: &[u8], dest: SocketAddr) -> Result<usize> {
            self.0.borrow_mut().push((buf.to_vec(), dest));
            Ok(buf.len())
        }
    }

    struct Broken;

    impl Transport for Broken {
        fn send(&self, _buf: &[u8], _dest: SocketAddr) -> Result<usize> {
            Err(Error::Transport {
                source: Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)),
                back: Backtrace::new(),
            })
        }
    }

    fn backend() -> (Backend<Recorder>, Sent) {
        let sent = Sent::default();
        let backend = Backend::with_persisted(
            Options::default()
                .host("127.0.0.1")
                .port(9999)
                .facility(Facility::LOG_LOCAL1)
                .app_name("svc"),
            Recorder(sent.clone()),
        )
        .unwrap();
        (backend, sent)
    }

    fn ts() -> Timestamp {
        Timestamp::new(2024, 1, 2, 3, 4, 5, 6)
    }

    #[test]
    fn severity_filter() {
        assert!(!should_emit(Level::LOG_INFO, Level::LOG_WARNING));
        assert!(should_emit(Level::LOG_WARNING, Level::LOG_WARNING));
        assert!(should_emit(Level::LOG_ERR, Level::LOG_WARNING));
        assert!(should_emit(Level::LOG_DEBUG, Level::LOG_DEBUG));

        let (mut backend, sent) = backend();
        backend
            .configure(Options::default().level(Level::LOG_WARNING))
            .unwrap();
        assert!(!backend.handle_event(&LogEvent::new(Level::LOG_INFO, "chatty")));
        assert!(backend.handle_event(&LogEvent::new(Level::LOG_ERR, "boom")));
        assert_eq!(sent.borrow().len(), 1);
    }

    #[test]
    fn packets() {
        let (mut backend, sent) = backend();
        let identity = String::from_utf8(backend.config().identity().as_bytes().to_vec()).unwrap();
        assert!(identity.starts_with("Z "));
        assert!(identity.ends_with(&format!(" svc {} - ", std::process::id())));

        assert!(backend.handle_event(&LogEvent::new(Level::LOG_ERR, "boom").at(ts())));
        {
            let sent = sent.borrow();
            assert_eq!(sent[0].1, "127.0.0.1:9999".parse::<SocketAddr>().unwrap());
            assert_eq!(
                std::str::from_utf8(&sent[0].0).unwrap(),
                format!("<139>1 2024-01-02T03:04:05.006{}boom\n", identity)
            );
        }

        backend
            .configure(
                Options::default()
                    .structured_data(vec![
                        SdSpec::new("meta@32473", ["module", "line"]),
                        SdSpec::new("empty", ["absent"]),
                    ])
                    .format("$metadata$message")
                    .metadata(["other"]),
            )
            .unwrap();
        let event = LogEvent::new(Level::LOG_NOTICE, "hi")
            .at(ts())
            .with("module", Value::Symbol("mymod".into()))
            .with("line", 42i64)
            .with("other", "x");
        assert!(backend.handle_event(&event));
        assert_eq!(
            std::str::from_utf8(&sent.borrow()[1].0).unwrap(),
            format!(
                "<141>1 2024-01-02T03:04:05.006{}[meta@32473 module=\"mymod\" line=\"42\"][empty] other=x hi",
                identity
            )
        );
    }

    #[test]
    fn failed_reconfiguration_keeps_the_old_one() {
        let (mut backend, sent) = backend();
        assert!(backend
            .configure(Options::default().host("no-such-host.invalid").level(Level::LOG_EMERG))
            .is_err());
        assert_eq!(backend.config().level(), Level::LOG_DEBUG);
        assert_eq!(backend.persisted().level, None);
        assert!(backend.handle_event(&LogEvent::new(Level::LOG_DEBUG, "still here")));
        assert_eq!(sent.borrow()[0].1, "127.0.0.1:9999".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn reconfiguration_is_cumulative() {
        let (mut backend, _sent) = backend();
        backend.configure(Options::default().port(10514)).unwrap();
        backend
            .configure(Options::default().level(Level::LOG_NOTICE))
            .unwrap();
        let cfg = backend.config();
        assert_eq!(cfg.destination(), "127.0.0.1:10514".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.facility(), Facility::LOG_LOCAL1);
        assert_eq!(cfg.level(), Level::LOG_NOTICE);
        assert_eq!(cfg.app_name().to_string(), "svc");
    }

    #[test]
    fn transport_errors_are_swallowed() {
        let backend = Backend::new(Config::default(), Broken);
        assert!(!backend.handle_event(&LogEvent::new(Level::LOG_EMERG, "nobody home")));
    }

    #[test]
    fn shutdown() {
        let (mut backend, sent) = backend();
        backend.shutdown();
        assert!(backend.is_shut_down());
        assert!(!backend.handle_event(&LogEvent::new(Level::LOG_EMERG, "too late")));
        backend.shutdown(); // idempotent
        assert!(sent.borrow().is_empty());
    }
}
