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

//! syslog facility & level defintions.
//!
//! [`Facility`] and [`Level`] replicate the names used in `<syslog.h>`. This module is the
//! severity/facility lookup table: every function here is total. A malformed severity or facility
//! must never block delivery of a log event, so anything we don't recognize resolves to a safe
//! default rather than an error.

use serde::Deserialize;

type StdResult<T, E> = std::result::Result<T, E>;

/// RFC [5424] defines twenty-four "facilities" for messages, of which this crate speaks only the
/// eight reserved for local use. The enumeration values duplicate the constants defined in
/// `<syslog.h>`, multiplied by 8 for convenience in forming the PRI field (which again mirrors the
/// `#define`s in `<syslog.h>`). That means every discriminant is a multiple of eight in [128,184].
///
/// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "FacilityRepr")]
pub enum Facility {
    /// reserved for local use
    LOG_LOCAL0 = 16 << 3,
    /// reserved for local use
    LOG_LOCAL1 = 17 << 3,
    /// reserved for local use
    LOG_LOCAL2 = 18 << 3,
    /// reserved for local use
    LOG_LOCAL3 = 19 << 3,
    /// reserved for local use
    LOG_LOCAL4 = 20 << 3,
    /// reserved for local use
    LOG_LOCAL5 = 21 << 3,
    /// reserved for local use
    LOG_LOCAL6 = 22 << 3,
    /// reserved for local use
    LOG_LOCAL7 = 23 << 3,
}

impl std::default::Default for Facility {
    /// The default facility is `LOG_LOCAL2`.
    fn default() -> Self {
        Facility::LOG_LOCAL2
    }
}

impl Facility {
    /// Map a raw facility code to a [`Facility`]. Both the `<syslog.h>` facility number (16-23)
    /// and its pre-shifted form (128-184) are understood; anything else resolves to
    /// [`Facility::default`].
    pub fn from_code(code: i64) -> Facility {
        let n = if (128..=184).contains(&code) && code % 8 == 0 {
            code >> 3
        } else {
            code
        };
        match n {
            16 => Facility::LOG_LOCAL0,
            17 => Facility::LOG_LOCAL1,
            18 => Facility::LOG_LOCAL2,
            19 => Facility::LOG_LOCAL3,
            20 => Facility::LOG_LOCAL4,
            21 => Facility::LOG_LOCAL5,
            22 => Facility::LOG_LOCAL6,
            23 => Facility::LOG_LOCAL7,
            _ => {
                tracing::warn!(
                    "unknown syslog facility code {}; using {}",
                    code,
                    Facility::default()
                );
                Facility::default()
            }
        }
    }
    /// Look a facility up by name; accepts both `local3` and `LOG_LOCAL3` (in any case).
    ///
    /// Unknown names resolve to [`Facility::default`].
    pub fn from_name(name: &str) -> Facility {
        let lower = name.trim().to_ascii_lowercase();
        match lower.strip_prefix("log_").unwrap_or(&lower) {
            "local0" => Facility::LOG_LOCAL0,
            "local1" => Facility::LOG_LOCAL1,
            "local2" => Facility::LOG_LOCAL2,
            "local3" => Facility::LOG_LOCAL3,
            "local4" => Facility::LOG_LOCAL4,
            "local5" => Facility::LOG_LOCAL5,
            "local6" => Facility::LOG_LOCAL6,
            "local7" => Facility::LOG_LOCAL7,
            other => match other.parse::<i64>() {
                Ok(code) => Facility::from_code(code),
                Err(_) => {
                    tracing::warn!(
                        "unknown syslog facility {:?}; using {}",
                        name,
                        Facility::default()
                    );
                    Facility::default()
                }
            },
        }
    }
}

impl std::convert::From<&str> for Facility {
    fn from(name: &str) -> Self {
        Facility::from_name(name)
    }
}

impl std::convert::From<String> for Facility {
    fn from(name: String) -> Self {
        Facility::from_name(&name)
    }
}

impl std::fmt::Display for Facility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Facility::LOG_LOCAL0 => "LOG_LOCAL0",
                Facility::LOG_LOCAL1 => "LOG_LOCAL1",
                Facility::LOG_LOCAL2 => "LOG_LOCAL2",
                Facility::LOG_LOCAL3 => "LOG_LOCAL3",
                Facility::LOG_LOCAL4 => "LOG_LOCAL4",
                Facility::LOG_LOCAL5 => "LOG_LOCAL5",
                Facility::LOG_LOCAL6 => "LOG_LOCAL6",
                Facility::LOG_LOCAL7 => "LOG_LOCAL7",
            }
        )
    }
}

/// RFC [5424] defines eight severity levels for messages. The enumeration values duplicate the
/// constants documented as per the `syslog()` manual [page] & defined in `<syslog.h>`; lower is
/// more urgent.
///
/// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
/// [page]: https://man7.org/linux/man-pages/man3/syslog.3.html
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "LevelRepr")]
pub enum Level {
    /// system is unusable
    LOG_EMERG,
    /// action must be take immediately
    LOG_ALERT,
    /// critical conditions
    LOG_CRIT,
    /// error conditions
    LOG_ERR,
    /// warning conditions
    LOG_WARNING,
    /// normal, but significant condition
    LOG_NOTICE,
    /// informational message
    LOG_INFO,
    /// debug-level message
    LOG_DEBUG,
}

impl Level {
    /// Map a raw severity code to a [`Level`]; anything outside [0,7] becomes `LOG_ERR`.
    pub fn from_code(code: i64) -> Level {
        match code {
            0 => Level::LOG_EMERG,
            1 => Level::LOG_ALERT,
            2 => Level::LOG_CRIT,
            3 => Level::LOG_ERR,
            4 => Level::LOG_WARNING,
            5 => Level::LOG_NOTICE,
            6 => Level::LOG_INFO,
            7 => Level::LOG_DEBUG,
            _ => Level::LOG_ERR,
        }
    }
    /// Look a severity up by name.
    ///
    /// Understands the names most logging frameworks use (`warn`/`warning`, `crit`/`critical`,
    /// &c), the `<syslog.h>` spellings (`LOG_WARNING`) and decimal codes. Anything else becomes
    /// `LOG_ERR`.
    pub fn from_name(name: &str) -> Level {
        let lower = name.trim().to_ascii_lowercase();
        match lower.strip_prefix("log_").unwrap_or(&lower) {
            "emergency" | "emerg" => Level::LOG_EMERG,
            "alert" => Level::LOG_ALERT,
            "critical" | "crit" => Level::LOG_CRIT,
            "error" | "err" => Level::LOG_ERR,
            "warning" | "warn" => Level::LOG_WARNING,
            "notice" => Level::LOG_NOTICE,
            "info" => Level::LOG_INFO,
            "debug" => Level::LOG_DEBUG,
            other => match other.parse::<i64>() {
                Ok(code) => Level::from_code(code),
                Err(_) => Level::LOG_ERR,
            },
        }
    }
    /// The lower-case name used when rendering messages (`$level`).
    pub fn name(&self) -> &'static str {
        match self {
            Level::LOG_EMERG => "emergency",
            Level::LOG_ALERT => "alert",
            Level::LOG_CRIT => "critical",
            Level::LOG_ERR => "error",
            Level::LOG_WARNING => "warning",
            Level::LOG_NOTICE => "notice",
            Level::LOG_INFO => "info",
            Level::LOG_DEBUG => "debug",
        }
    }
}

impl std::default::Default for Level {
    fn default() -> Self {
        Level::LOG_DEBUG
    }
}

impl std::convert::From<&str> for Level {
    fn from(name: &str) -> Self {
        Level::from_name(name)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Level::LOG_EMERG => "LOG_EMERG",
                Level::LOG_ALERT => "LOG_ALERT",
                Level::LOG_CRIT => "LOG_CRIT",
                Level::LOG_ERR => "LOG_ERR",
                Level::LOG_WARNING => "LOG_WARNING",
                Level::LOG_NOTICE => "LOG_NOTICE",
                Level::LOG_INFO => "LOG_INFO",
                Level::LOG_DEBUG => "LOG_DEBUG",
            }
        )
    }
}

// Likewise `facility = "local1"` or `facility = 17`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FacilityRepr {
    Code(i64),
    Name(String),
}

impl std::convert::From<FacilityRepr> for Facility {
    fn from(repr: FacilityRepr) -> Self {
        match repr {
            FacilityRepr::Code(code) => Facility::from_code(code),
            FacilityRepr::Name(name) => Facility::from_name(&name),
        }
    }
}

// Persisted configuration may spell the level either way: `level = "warning"` or `level = 4`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Code(i64),
    Name(String),
}

impl std::convert::From<LevelRepr> for Level {
    fn from(repr: LevelRepr) -> Self {
        match repr {
            LevelRepr::Code(code) => Level::from_code(code),
            LevelRepr::Name(name) => Level::from_name(&name),
        }
    }
}

/// The numeric severity, in [0,7].
pub fn severity_code(level: Level) -> u8 {
    level as u8
}

/// The numeric facility, already shifted into place (a multiple of 8).
pub fn facility_code(facility: Facility) -> u8 {
    facility as u8
}

/// Compute the PRI value. Severity occupies the low three bits & the facility the rest, so OR-ing
/// them is the same as adding them.
pub fn pri(level: Level, facility: Facility) -> u8 {
    severity_code(level) | facility_code(facility)
}
