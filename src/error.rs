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

//! [syslog-udp-backend](crate) errors

use backtrace::Backtrace;

/// [syslog-udp-backend](crate) error type
///
/// Like its sibling syslog crates, [syslog-udp-backend](crate) eschews libraries like [thiserror],
/// [anyhow] & [Snafu] in favor of a straightforward enumeration with a few match arms chosen on
/// the basis what the caller will need to repond.
///
/// Note that none of these ever reach code that merely _emits_ log events; they're returned from
/// construction & reconfiguration only.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// The application name is not RFC 5424-compliant
    BadAppName { name: Vec<u8>, back: Backtrace },
    /// The provided or discovered hostname is not RFC 5424-compliant
    BadHostname { name: Vec<u8>, back: Backtrace },
    /// The process identifier is not RFC 5424-compliant
    BadProcId { name: Vec<u8>, back: Backtrace },
    /// An SD-ID or PARAM-NAME is not RFC 5424-compliant
    BadSdName { name: String, back: Backtrace },
    /// Failed to parse persisted configuration
    Config {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Failed to fetch the current executable (via std::env)
    NoExecutable {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Failed to fetch hostname
    NoHostname {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Name resolution for the collector failed outright
    Resolve {
        host: String,
        source: std::io::Error,
        back: Backtrace,
    },
    /// Name resolution for the collector succeeded, but returned no addresses
    NoAddress { host: String, back: Backtrace },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadAppName { name, .. } => write!(
                f,
                "{:?} is not an RFC 5424-compliant application name",
                String::from_utf8_lossy(name)
            ),
            Error::BadHostname { name, .. } => write!(
                f,
                "{:?} is not an RFC 5424-compliant hostname",
                String::from_utf8_lossy(name)
            ),
            Error::BadProcId { name, .. } => write!(
                f,
                "{:?} is not an RFC 5424-compliant process ID",
                String::from_utf8_lossy(name)
            ),
            Error::BadSdName { name, .. } => {
                write!(f, "{:?} is not an RFC 5424-compliant SD-NAME", name)
            }
            Error::Config { source, .. } => write!(f, "Bad configuration: {}", source),
            Error::NoExecutable { source, .. } => {
                write!(f, "While looking up the current executable, got {}", source)
            }
            Error::NoHostname { source, .. } => {
                write!(f, "While looking up this host's name, got {}", source)
            }
            Error::Resolve { host, source, .. } => {
                write!(f, "While resolving {}, got {}", host, source)
            }
            Error::NoAddress { host, .. } => write!(f, "{} resolved to no addresses", host),
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            _ => write!(f, "Other syslog-udp-backend error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadAppName { name: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::BadHostname { name: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::BadProcId { name: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::BadSdName { name: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::Config { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::Resolve { back, .. } => write!(f, "{}\n{:#?}", self, back),
            Error::NoAddress { host: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::Transport { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            err => write!(f, "syslog-udp-backend error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config { source, .. }
            | Error::NoExecutable { source, .. }
            | Error::NoHostname { source, .. }
            | Error::Transport { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            Error::Resolve { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
