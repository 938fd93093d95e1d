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

//! The syslog transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, as well
//! as the UDP implementation.
//!
//! Unlike a connected socket, the destination is supplied with each send: the backend may be
//! reconfigured to point at a different collector at any time, but the sockets (one per address
//! family) are opened once, at startup, & kept until shutdown.
//!
//! # Examples
//!
//! ```rust
//! use syslog_udp_backend::transport::{Transport, UdpTransport};
//! let transpo = UdpTransport::new().unwrap();
//! // UDP is fire-and-forget: this succeeds whether or not anyone is listening
//! transpo.send(b"<134>1 hello", "127.0.0.1:514".parse().unwrap()).unwrap();
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Send a slice of bytes to `dest` as a single datagram.
    ///
    /// There's no acknowledgement, and implementations shall not retry: success means only that
    /// the datagram was handed to the OS.
    fn send(&self, buf: &[u8], dest: SocketAddr) -> Result<usize>;
}

/// Sending syslog messages via UDP datagrams.
///
/// A socket can only reach destinations of its own address family, so we keep one per family:
/// the collector may be reconfigured from an IPv4 address to an IPv6 one (or a name that resolves
/// to either) without reopening anything.
#[derive(Debug)]
pub struct UdpTransport {
    v4: Option<UdpSocket>,
    v6: Option<UdpSocket>,
}

fn bind_socket(addr: SocketAddr) -> Result<UdpSocket> {
    UdpSocket::bind(addr).map_err(|err| Error::Transport {
        source: Box::new(err),
        back: Backtrace::new(),
    })
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation bound to any available port on both `0.0.0.0` &
    /// `[::]`.
    ///
    /// Hosts without IPv6 (or IPv4) support get a transport for the family they have; this fails
    /// only if neither can be bound.
    pub fn new() -> Result<UdpTransport> {
        let v4 = bind_socket(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)));
        let v6 = bind_socket(SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)));
        match (v4, v6) {
            (Err(err), Err(_)) => Err(err),
            (v4, v6) => Ok(UdpTransport {
                v4: v4.ok(),
                v6: v6.ok(),
            }),
        }
    }
    /// Construct a [`Transport`] implementation bound to `addr`; it can only reach collectors of
    /// the same address family.
    pub fn bind(addr: SocketAddr) -> Result<UdpTransport> {
        let socket = Some(bind_socket(addr)?);
        Ok(if addr.is_ipv4() {
            UdpTransport {
                v4: socket,
                v6: None,
            }
        } else {
            UdpTransport {
                v4: None,
                v6: socket,
            }
        })
    }
    /// The address from which datagrams to `dest` will be sent.
    pub fn local_addr(&self, dest: SocketAddr) -> Result<SocketAddr> {
        self.socket_for(dest)?
            .local_addr()
            .map_err(|err| Error::Transport {
                source: Box::new(err),
                back: Backtrace::new(),
            })
    }
    fn socket_for(&self, dest: SocketAddr) -> Result<&UdpSocket> {
        let socket = if dest.is_ipv4() { &self.v4 } else { &self.v6 };
        socket.as_ref().ok_or_else(|| Error::Transport {
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                format!("no socket for the address family of {}", dest),
            )),
            back: Backtrace::new(),
        })
    }
}

impl Transport for UdpTransport {
    fn send(&self, buf: &[u8], dest: SocketAddr) -> Result<usize> {
        self.socket_for(dest)?
            .send_to(buf, dest)
            .map_err(|err| Error::Transport {
                source: Box::new(err),
                back: Backtrace::new(),
            })
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn datagrams() {
        let collector = UdpSocket::bind("127.0.0.1:0").unwrap();
        collector
            .set_read_timeout(Some(std::time::Duration::from_secs(5)))
            .unwrap();
        let transpo = UdpTransport::new().unwrap();
        assert_eq!(
            transpo
                .send(b"<134>1 Hello", collector.local_addr().unwrap())
                .unwrap(),
            12
        );
        let mut buf = [0u8; 64];
        let (n, _) = collector.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"<134>1 Hello");
    }

    #[test]
    fn both_address_families() {
        let transpo = UdpTransport::new().unwrap();
        for local in ["127.0.0.1:0", "[::1]:0"] {
            // Skip whichever family this host doesn't support
            let collector = match UdpSocket::bind(local) {
                Ok(collector) => collector,
                Err(_) => continue,
            };
            collector
                .set_read_timeout(Some(std::time::Duration::from_secs(5)))
                .unwrap();
            let dest = collector.local_addr().unwrap();
            assert_eq!(transpo.send(b"<134>1 Hello", dest).unwrap(), 12);
            assert_eq!(transpo.local_addr(dest).unwrap().is_ipv4(), dest.is_ipv4());
            let mut buf = [0u8; 64];
            let (n, _) = collector.recv_from(&mut buf).unwrap();
            assert_eq!(&buf[..n], b"<134>1 Hello");
        }
    }

    #[test]
    fn wrong_address_family() {
        let transpo = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        assert!(transpo.send(b"<134>1 Hello", "[::1]:514".parse().unwrap()).is_err());
    }
}
