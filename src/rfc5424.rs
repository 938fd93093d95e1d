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

//! RFC [5424]-compliant syslog packet assembly
//!
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424
//!
//! A packet looks like this:
//!
//! ```text
//! <PRI>1 TIMESTAMP Z HOSTNAME APP-NAME PROCID - [SD-ELEMENT...] MSG
//! ```
//!
//! Everything from the `Z` through the `- ` following PROCID is the same for every packet sent
//! under a given configuration, so it's computed once (as an [`Identity`]) and re-used. The `-`
//! is the nil MSGID; when the event carries no structured data, the message follows it directly.

use crate::{
    error::{Error, Result},
    facility::{pri, Facility, Level},
    timestamp::Timestamp,
};

use backtrace::Backtrace;
use bytes::BufMut;

type StdResult<T, E> = std::result::Result<T, E>;

/// Produce a [`Vec`] of bytes from an [`OsString`](std::ffi::OsString).
#[cfg(unix)]
fn bytes_from_os_str(s: std::ffi::OsString) -> Vec<u8> {
    use std::os::unix::ffi::OsStringExt;
    s.into_vec()
}

#[cfg(not(unix))]
fn bytes_from_os_str(s: std::ffi::OsString) -> Vec<u8> {
    s.to_string_lossy().as_bytes().to_vec()
}

// RFC 5424 header fields are `1*n PRINTUSASCII`: no spaces, no control characters.
fn is_printusascii(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| (33..=126).contains(b))
}

/// A [`Vec<u8>`] instance with the additional constraint that it must be at most 255 bytes of
/// printable ASCII.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hostname(Vec<u8>);

impl Hostname {
    /// An RFC 5424-compliant hostname is at most 255 bytes of printable ASCII
    pub fn new(bytes: Vec<u8>) -> Result<Hostname> {
        if !bytes.is_empty() && bytes.len() < 256 && is_printusascii(&bytes) {
            Ok(Hostname(bytes))
        } else {
            Err(Error::BadHostname {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
    /// Attempt to figure-out an RFC [5424]-compliant hostname.
    ///
    /// The order of preference for the contents of the HOSTNAME field is as follows:
    ///
    /// 1.  FQDN
    /// 2.  Static IP address
    /// 3.  hostname
    /// 4.  Dynamic IP address
    /// 5.  the NILVALUE
    ///
    /// This implementation doesn't quite do that; for reasons of expedience, it will first simply
    /// try [gethostname()], then look for a local IP address, then settle for the NILVALUE. It
    /// can't fail.
    ///
    /// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
    /// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
    pub fn discover() -> Hostname {
        hostname::get()
            .map_err(|err| Error::NoHostname {
                source: Box::new(err),
                back: Backtrace::new(),
            })
            // vvv :=> StdResult<Hostname, Error>
            .and_then(|hn| Hostname::new(bytes_from_os_str(hn)))
            // vvv will return the Ok(Hostname), or call the closure :=> StdResult<Hostname, Error>
            .or_else(|err| {
                tracing::debug!("falling back to an IP address for HOSTNAME: {}", err);
                local_ip_address::local_ip()
                    .map_err(|err| Error::NoHostname {
                        source: Box::new(err),
                        back: Backtrace::new(),
                    })
                    .and_then(|ip| Hostname::new(ip.to_string().into_bytes()))
            })
            .unwrap_or_else(|_| Hostname(b"-".to_vec()))
    }
}

impl std::fmt::Display for Hostname {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl std::convert::TryFrom<String> for Hostname {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        Hostname::new(x.into_bytes())
    }
}

/// A string with the additional constraint that it is one to forty-eight bytes of printable
/// ASCII.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppName(Vec<u8>);

impl std::fmt::Display for AppName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl AppName {
    pub fn new(bytes: Vec<u8>) -> Result<AppName> {
        if !bytes.is_empty() && bytes.len() < 49 && is_printusascii(&bytes) {
            Ok(AppName(bytes))
        } else {
            Err(Error::BadAppName {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
}

impl std::convert::TryFrom<String> for AppName {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        AppName::new(x.into_bytes())
    }
}

impl std::default::Default for AppName {
    /// Attempt to figure-out an RFC [5424] Application Name.
    ///
    /// The APP-NAME field SHOULD identify the device or application that originated the message.
    /// It is a string without further semantics. It is intended for filtering messages on a relay
    /// or collector.
    ///
    /// This implementation relies on [`std::env::current_exe`]. It cannot fail; if for any reason
    /// that value cannot be retrieved, or is not compliant, it simply returns "-".
    ///
    /// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
    fn default() -> Self {
        std::env::current_exe() // :=> StdResult<PathBuf, std::io::Error>
            .map_err(|err| Error::NoExecutable {
                source: Box::new(err),
                back: Backtrace::new(),
            })
            .and_then(|pbuf| {
                AppName::new(match pbuf.file_name() {
                    Some(os_str) => bytes_from_os_str(os_str.to_os_string()),
                    None => b"-".to_vec(),
                })
            })
            .unwrap_or_else(|_| AppName(b"-".to_vec()))
    }
}

/// A string with the additional constraint that it is at most 128 bytes of printable ASCII.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcId(Vec<u8>);

impl std::fmt::Display for ProcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl ProcId {
    pub fn new(bytes: Vec<u8>) -> Result<ProcId> {
        if !bytes.is_empty() && bytes.len() < 129 && is_printusascii(&bytes) {
            Ok(ProcId(bytes))
        } else {
            Err(Error::BadProcId {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
}

impl std::convert::TryFrom<String> for ProcId {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        ProcId::new(x.into_bytes())
    }
}

impl std::default::Default for ProcId {
    /// Attempt to figure-out an RFC [5424] Process ID.
    ///
    /// While generally this field has been the OS process identifier, "PROCID is a value that is
    /// included in the message, having no interoperable meaning, except that a change in the value
    /// indicates there has been a discontinuity in syslog reporting."
    ///
    /// This implementation relies on [`std::process::id`]. It cannot fail.
    ///
    /// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
    fn default() -> Self {
        // Decimal digits are always printable ASCII
        ProcId(std::process::id().to_string().into_bytes())
    }
}

/// The identity block: `Z HOSTNAME APP-NAME PROCID - `, pre-rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity(Vec<u8>);

impl Identity {
    pub fn new(hostname: &Hostname, appname: &AppName, pid: &ProcId) -> Identity {
        let mut buf = Vec::with_capacity(hostname.0.len() + appname.0.len() + pid.0.len() + 8);
        buf.put_slice(b"Z ");
        buf.put_slice(&hostname.0);
        buf.put_u8(b' ');
        buf.put_slice(&appname.0);
        buf.put_u8(b' ');
        buf.put_slice(&pid.0);
        buf.put_slice(b" - ");
        Identity(buf)
    }
    /// Compute the identity for `appname` from this host's name & this process' ID, as they are
    /// right now.
    pub fn discover(appname: &AppName) -> Identity {
        Identity::new(&Hostname::discover(), appname, &ProcId::default())
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Assemble a complete syslog packet.
///
/// `sd` is the already-formatted structured data (possibly empty) & `body` the already-formatted
/// message. The result is sent as-is: no length prefix, no framing.
pub fn assemble(
    level: Level,
    facility: Facility,
    timestamp: &Timestamp,
    identity: &Identity,
    sd: &str,
    body: &str,
) -> Vec<u8> {
    let mut buf =
        Vec::with_capacity(8 + 24 + identity.0.len() + sd.len() + 1 + body.len());
    buf.put_slice(format!("<{}>1 {}", pri(level, facility), timestamp).as_bytes());
    buf.put_slice(&identity.0);
    if !sd.is_empty() {
        buf.put_slice(sd.as_bytes());
        buf.put_u8(b' ');
    }
    buf.put_slice(body.as_bytes());
    buf
}

#[cfg(test)]
mod test {

    use super::*;

    fn identity() -> Identity {
        Identity::new(
            &Hostname::try_from("bree.local".to_string()).unwrap(),
            &AppName::try_from("prototyping".to_string()).unwrap(),
            &ProcId::try_from("123".to_string()).unwrap(),
        )
    }

    #[test]
    fn app_name() {
        let _x = AppName::default(); // At least _exercise_ `Default`

        let x: &[u8] = b"0123456789012345678901234567890123456789012345678";
        assert!(AppName::new(x.into()).is_err());
        assert!(AppName::new(b"udp test".to_vec()).is_err());
        assert!(AppName::new(Vec::new()).is_err());
        assert!(AppName::new(b"udp-test".to_vec()).is_ok());
    }

    #[test]
    fn hostname_and_procid() {
        let _h = Hostname::discover(); // can't fail
        assert!(Hostname::new(b"bree.local".to_vec()).is_ok());
        assert!(Hostname::new(vec![b'a'; 256]).is_err());
        assert!(Hostname::new("h\u{f6}st".as_bytes().to_vec()).is_err());
        assert_eq!(
            ProcId::default().to_string(),
            std::process::id().to_string()
        );
        assert!(ProcId::new(vec![b'1'; 129]).is_err());
    }

    #[test]
    fn identity_block() {
        assert_eq!(identity().as_bytes(), b"Z bree.local prototyping 123 - ");
    }

    #[test]
    fn packets() {
        let ts = Timestamp::new(2024, 1, 2, 3, 4, 5, 6);
        let rsp = assemble(
            Level::LOG_ERR,
            Facility::LOG_LOCAL1,
            &ts,
            &identity(),
            "",
            "boom\n",
        );
        assert_eq!(
            std::str::from_utf8(&rsp).unwrap(),
            "<139>1 2024-01-02T03:04:05.006Z bree.local prototyping 123 - boom\n"
        );

        let rsp = assemble(
            Level::LOG_INFO,
            Facility::LOG_LOCAL0,
            &ts,
            &identity(),
            "[meta line=\"42\"]",
            "Hello, 世界!",
        );
        assert_eq!(
            std::str::from_utf8(&rsp).unwrap(),
            "<134>1 2024-01-02T03:04:05.006Z bree.local prototyping 123 - [meta line=\"42\"] Hello, 世界!"
        );
    }

    #[test]
    fn packets_parse() {
        let rsp = assemble(
            Level::LOG_WARNING,
            Facility::LOG_LOCAL7,
            &Timestamp::new(2024, 6, 1, 12, 30, 0, 42),
            &identity(),
            "[meta@32473 module=\"mymod\" line=\"42\"]",
            "disk almost full",
        );
        let msg = syslog_rfc5424::parse_message(std::str::from_utf8(&rsp).unwrap()).unwrap();
        assert_eq!(msg.severity, syslog_rfc5424::SyslogSeverity::SEV_WARNING);
        assert_eq!(msg.facility, syslog_rfc5424::SyslogFacility::LOG_LOCAL7);
        assert_eq!(msg.hostname.as_deref(), Some("bree.local"));
        assert_eq!(msg.appname.as_deref(), Some("prototyping"));
        assert_eq!(msg.msgid, None);
        assert_eq!(
            msg.sd.find_tuple("meta@32473", "module").map(|s| s.as_str()),
            Some("mymod")
        );
        assert_eq!(msg.msg, "disk almost full");
    }
}
