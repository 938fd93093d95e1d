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

//! RFC [5424] timestamps, to the millisecond.
//!
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424
//!
//! [`Timestamp`] renders as `YYYY-MM-DDTHH:MM:SS.mmm`, with no zone offset: the identity block
//! that follows it on the wire begins with `Z`, so the packet as a whole carries a UTC timestamp.

use chrono::prelude::*;

/// A broken-down calendar time with millisecond precision.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

impl Timestamp {
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
    ) -> Timestamp {
        Timestamp {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
        }
    }
    /// The current time, in UTC.
    pub fn now() -> Timestamp {
        Utc::now().into()
    }
    /// `YYYY-MM-DD`
    pub fn date(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
    /// `HH:MM:SS.mmm`
    pub fn time(&self) -> String {
        format!(
            "{:02}:{:02}:{:02}.{:03}",
            self.hour, self.minute, self.second, self.millisecond
        )
    }
    /// `YYYY-MM-DDTHH:MM:SS.mmm`; formatting can't fail for any field values.
    pub fn encode(&self) -> String {
        format!("{}T{}", self.date(), self.time())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl<Tz: TimeZone> std::convert::From<DateTime<Tz>> for Timestamp {
    fn from(dt: DateTime<Tz>) -> Self {
        let utc = dt.with_timezone(&Utc);
        Timestamp {
            year: utc.year(),
            month: utc.month(),
            day: utc.day(),
            hour: utc.hour(),
            minute: utc.minute(),
            second: utc.second(),
            // `nanosecond()` exceeds 999,999,999 during a leap second; clamp so we never print
            // four digits of milliseconds.
            millisecond: std::cmp::min(utc.nanosecond() / 1_000_000, 999),
        }
    }
}

impl std::convert::From<std::time::SystemTime> for Timestamp {
    fn from(t: std::time::SystemTime) -> Self {
        DateTime::<Utc>::from(t).into()
    }
}
