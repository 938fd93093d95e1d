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

//! The log events this crate consumes.

use crate::{facility::Level, timestamp::Timestamp, value::Value};

use std::collections::BTreeMap;

/// A single log record, as delivered by the host logging framework.
///
/// These are transient: one is built per event, encoded & sent, then dropped.
#[derive(Clone, Debug)]
pub struct LogEvent {
    pub level: Level,
    pub message: String,
    pub timestamp: Timestamp,
    pub metadata: BTreeMap<String, Value>,
}

impl LogEvent {
    /// A new event stamped with the current time, and no metadata.
    pub fn new<S: Into<String>>(level: Level, message: S) -> LogEvent {
        LogEvent {
            level,
            message: message.into(),
            timestamp: Timestamp::now(),
            metadata: BTreeMap::new(),
        }
    }
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
