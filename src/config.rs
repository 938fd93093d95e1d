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

//! Backend configuration.
//!
//! Configuration comes in two flavors: [`Options`] is a sparse set of settings (as read from a
//! file, or passed to a reconfiguration call), and [`Config`] is the complete, validated,
//! immutable snapshot the backend actually encodes with. [`Config::configure`] layers a set of
//! [`Options`] over an existing snapshot to produce the next one; anything not mentioned in the
//! [`Options`] carries over unchanged.
//!
//! Producing a [`Config`] is also when the expensive work happens: the collector's name is
//! resolved (a blocking call) & the identity block is computed. Nothing in the per-event path
//! touches DNS.
//!
//! # Examples
//!
//! Persisted settings may be kept in TOML; unknown keys are ignored:
//!
//! ```rust
//! use syslog_udp_backend::config::Options;
//! let opts = Options::from_toml(r#"
//! host = "127.0.0.1"
//! port = 5514
//! facility = "local1"
//! level = "warning"
//! format = "$level $message\n"
//!
//! [[structured_data]]
//! id = "meta@32473"
//! keys = ["module", "line"]
//! "#).unwrap();
//! assert_eq!(opts.port, Some(5514));
//! ```

use crate::{
    error::{Error, Result},
    facility::{Facility, Level},
    formatter::Template,
    rfc5424::{AppName, Identity},
    structured_data::SdSpec,
};

use backtrace::Backtrace;
use serde::Deserialize;

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};

/// The default collector port
pub const DEFAULT_PORT: u16 = 514;

/// The collector's host: either an address, which is used as-is, or a name, which is resolved
/// each time the backend is configured.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Host {
    Addr(IpAddr),
    Name(String),
}

impl std::default::Default for Host {
    fn default() -> Self {
        Host::Addr(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

impl std::convert::From<String> for Host {
    fn from(s: String) -> Self {
        match s.parse::<IpAddr>() {
            Ok(addr) => Host::Addr(addr),
            Err(_) => Host::Name(s),
        }
    }
}

impl std::convert::From<&str> for Host {
    fn from(s: &str) -> Self {
        Host::from(s.to_string())
    }
}

impl std::convert::From<IpAddr> for Host {
    fn from(addr: IpAddr) -> Self {
        Host::Addr(addr)
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Host::Addr(addr) => write!(f, "{}", addr),
            Host::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Resolve `host`:`port` to a socket address; addresses pass through untouched, names get the
/// first address the resolver returns.
pub fn resolve(host: &Host, port: u16) -> Result<SocketAddr> {
    match host {
        Host::Addr(addr) => Ok(SocketAddr::new(*addr, port)),
        Host::Name(name) => (name.as_str(), port)
            .to_socket_addrs()
            .map_err(|err| Error::Resolve {
                host: name.clone(),
                source: err,
                back: Backtrace::new(),
            })?
            .next()
            .ok_or_else(|| Error::NoAddress {
                host: name.clone(),
                back: Backtrace::new(),
            }),
    }
}

/// A sparse set of configuration settings; `None` means "leave this alone".
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Minimum severity; less urgent events are dropped
    pub level: Option<Level>,
    /// Metadata keys to be rendered by `$metadata` in the message template
    pub metadata: Option<Vec<String>>,
    /// Message template; see [`crate::formatter`]
    pub format: Option<String>,
    /// Structured data elements & the metadata keys each may carry
    pub structured_data: Option<Vec<SdSpec>>,
    pub host: Option<Host>,
    pub port: Option<u16>,
    pub facility: Option<Facility>,
    pub app_name: Option<String>,
}

impl Options {
    /// Read [`Options`] from TOML text; unrecognized keys are ignored.
    pub fn from_toml(text: &str) -> Result<Options> {
        toml::from_str(text).map_err(|err| Error::Config {
            source: Box::new(err),
            back: Backtrace::new(),
        })
    }
    /// Layer `overrides` on top of `self`: every setting present in `overrides` wins.
    pub fn merge(self, overrides: Options) -> Options {
        Options {
            level: overrides.level.or(self.level),
            metadata: overrides.metadata.or(self.metadata),
            format: overrides.format.or(self.format),
            structured_data: overrides.structured_data.or(self.structured_data),
            host: overrides.host.or(self.host),
            port: overrides.port.or(self.port),
            facility: overrides.facility.or(self.facility),
            app_name: overrides.app_name.or(self.app_name),
        }
    }
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }
    pub fn metadata<I: IntoIterator<Item = K>, K: Into<String>>(mut self, keys: I) -> Self {
        self.metadata = Some(keys.into_iter().map(Into::into).collect());
        self
    }
    pub fn format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = Some(format.into());
        self
    }
    pub fn structured_data(mut self, spec: Vec<SdSpec>) -> Self {
        self.structured_data = Some(spec);
        self
    }
    pub fn host<H: Into<Host>>(mut self, host: H) -> Self {
        self.host = Some(host.into());
        self
    }
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
    pub fn facility(mut self, facility: Facility) -> Self {
        self.facility = Some(facility);
        self
    }
    pub fn app_name<S: Into<String>>(mut self, app_name: S) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

/// A complete, validated configuration snapshot.
#[derive(Clone, Debug)]
pub struct Config {
    host: Host,
    port: u16,
    destination: SocketAddr,
    facility: Facility,
    level: Level,
    template: Template,
    metadata: Vec<String>,
    structured_data: Vec<SdSpec>,
    app_name: AppName,
    identity: Identity,
}

impl std::default::Default for Config {
    /// `127.0.0.1:514`, `LOG_LOCAL2`, every severity, `"$message\n"`, no metadata & no structured
    /// data.
    fn default() -> Self {
        let app_name = AppName::default();
        Config {
            host: Host::default(),
            port: DEFAULT_PORT,
            destination: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            facility: Facility::default(),
            level: Level::LOG_DEBUG,
            template: Template::default(),
            metadata: Vec::new(),
            structured_data: Vec::new(),
            identity: Identity::discover(&app_name),
            app_name,
        }
    }
}

impl Config {
    /// Produce the snapshot that results from applying `overrides` to this one.
    ///
    /// The collector's host is re-resolved & the identity re-computed (hostname & PID are looked
    /// up afresh), whether or not they were mentioned in `overrides`. On error `self` is, of
    /// course, untouched.
    pub fn configure(&self, overrides: &Options) -> Result<Config> {
        let host = overrides.host.clone().unwrap_or_else(|| self.host.clone());
        let port = overrides.port.unwrap_or(self.port);
        let destination = resolve(&host, port)?;

        let app_name = match &overrides.app_name {
            Some(name) => AppName::try_from(name.clone())?,
            None => self.app_name.clone(),
        };

        let structured_data = match &overrides.structured_data {
            Some(spec) => {
                spec.iter().try_for_each(SdSpec::validate)?;
                spec.clone()
            }
            None => self.structured_data.clone(),
        };

        let template = overrides
            .format
            .as_deref()
            .map(Template::parse)
            .unwrap_or_else(|| self.template.clone());

        let identity = Identity::discover(&app_name);

        tracing::debug!(
            "syslog backend configured: {} ({}:{}), {}, minimum {}",
            destination,
            host,
            port,
            overrides.facility.unwrap_or(self.facility),
            overrides.level.unwrap_or(self.level)
        );

        Ok(Config {
            host,
            port,
            destination,
            facility: overrides.facility.unwrap_or(self.facility),
            level: overrides.level.unwrap_or(self.level),
            template,
            metadata: overrides
                .metadata
                .clone()
                .unwrap_or_else(|| self.metadata.clone()),
            structured_data,
            app_name,
            identity,
        })
    }
    pub fn host(&self) -> &Host {
        &self.host
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    /// The resolved collector address
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
    pub fn facility(&self) -> Facility {
        self.facility
    }
    /// The minimum severity
    pub fn level(&self) -> Level {
        self.level
    }
    pub fn template(&self) -> &Template {
        &self.template
    }
    pub fn metadata(&self) -> &[String] {
        &self.metadata
    }
    pub fn structured_data(&self) -> &[SdSpec] {
        &self.structured_data
    }
    pub fn app_name(&self) -> &AppName {
        &self.app_name
    }
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.destination(), "127.0.0.1:514".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.facility(), Facility::LOG_LOCAL2);
        assert_eq!(cfg.level(), Level::LOG_DEBUG);
        assert_eq!(cfg.template().to_string(), "$message\n");
        assert!(cfg.metadata().is_empty());
        assert!(cfg.structured_data().is_empty());
    }

    #[test]
    fn partial_reconfiguration() {
        let first = Config::default()
            .configure(
                &Options::default()
                    .host("10.1.2.3")
                    .port(9999)
                    .facility(Facility::LOG_LOCAL1)
                    .level(Level::LOG_WARNING)
                    .format("$level: $message")
                    .metadata(["request_id"])
                    .structured_data(vec![SdSpec::new("meta", ["line"])])
                    .app_name("svc"),
            )
            .unwrap();
        assert_eq!(first.destination(), "10.1.2.3:9999".parse::<SocketAddr>().unwrap());

        let second = first
            .configure(&Options::default().level(Level::LOG_ERR))
            .unwrap();
        assert_eq!(second.level(), Level::LOG_ERR);
        assert_eq!(second.host(), first.host());
        assert_eq!(second.port(), 9999);
        assert_eq!(second.destination(), first.destination());
        assert_eq!(second.facility(), Facility::LOG_LOCAL1);
        assert_eq!(second.template(), first.template());
        assert_eq!(second.metadata(), &["request_id".to_string()]);
        assert_eq!(second.structured_data(), first.structured_data());
        assert_eq!(second.app_name().to_string(), "svc");
        assert_eq!(second.identity(), first.identity());
    }

    #[test]
    fn bad_configurations_are_refused() {
        let cfg = Config::default();
        assert!(cfg
            .configure(&Options::default().host("no-such-host.invalid"))
            .is_err());
        assert!(cfg
            .configure(&Options::default().app_name("has spaces"))
            .is_err());
        assert!(cfg
            .configure(&Options::default().structured_data(vec![SdSpec::new("bad id", ["k"])]))
            .is_err());
    }

    #[test]
    fn names_are_resolved() {
        let cfg = Config::default()
            .configure(&Options::default().host("localhost").port(5514))
            .unwrap();
        assert!(cfg.destination().ip().is_loopback());
        assert_eq!(cfg.destination().port(), 5514);
        assert_eq!(cfg.host(), &Host::Name("localhost".to_string()));
    }

    #[test]
    fn options() {
        let persisted = Options::from_toml(
            r#"
host = "collector.example.com"
port = 5514
level = 4
facility = "LOG_LOCAL3"
no_such_option = true

[[structured_data]]
id = "meta@32473"
keys = ["module", "line"]
"#,
        )
        .unwrap();
        assert_eq!(
            persisted,
            Options {
                level: Some(Level::LOG_WARNING),
                metadata: None,
                format: None,
                structured_data: Some(vec![SdSpec::new("meta@32473", ["module", "line"])]),
                host: Some(Host::Name("collector.example.com".to_string())),
                port: Some(5514),
                facility: Some(Facility::LOG_LOCAL3),
                app_name: None,
            }
        );

        let merged = persisted.merge(Options::default().host("127.0.0.1").level(Level::LOG_INFO));
        assert_eq!(merged.host, Some(Host::Addr(IpAddr::V4(Ipv4Addr::LOCALHOST))));
        assert_eq!(merged.level, Some(Level::LOG_INFO));
        assert_eq!(merged.port, Some(5514));

        assert!(Options::from_toml("port = \"not a port\"").is_err());
    }

    #[test]
    fn numeric_facilities() {
        let opts = Options::from_toml("facility = 17").unwrap();
        assert_eq!(opts.facility, Some(Facility::LOG_LOCAL1));
        let opts = Options::from_toml("facility = 184").unwrap();
        assert_eq!(opts.facility, Some(Facility::LOG_LOCAL7));
        // Not a local facility: fall back rather than refuse the file
        let opts = Options::from_toml("facility = 3\nport = 5514").unwrap();
        assert_eq!(opts.facility, Some(Facility::LOG_LOCAL2));
        assert_eq!(opts.port, Some(5514));
    }
}
