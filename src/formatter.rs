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

//! Message templates.
//!
//! The translation from log events to syslog packets occurs in three parts:
//!
//! 1. formatting the event to a textual message
//!
//! 2. incorporating that message into a syslog packet compliant with RFC 5424
//!
//! 3. transporting that packet to the collector
//!
//! This module implements step 1. The message is produced from a [`Template`]: a string with
//! `$`-prefixed placeholders, parsed once when the backend is (re)configured & rendered once per
//! event. Placeholders:
//!
//! - `$message`: the event's message
//! - `$level`: the severity, in lower case (`warning`)
//! - `$levelpad`: enough spaces to line-up whatever follows `$level`
//! - `$metadata`: `key=value ` for each configured metadata key present in the event
//! - `$date`: `YYYY-MM-DD`
//! - `$time`: `HH:MM:SS.mmm`
//!
//! A `$` followed by anything else is copied to the output verbatim.

use crate::{event::LogEvent, facility::Level};

/// The template used when none is configured.
pub const DEFAULT_FORMAT: &str = "$message\n";

// "emergency"
const LONGEST_LEVEL_NAME: usize = 9;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Text(String),
    Message,
    Level,
    LevelPad,
    Metadata,
    Date,
    Time,
}

/// A parsed message template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

impl std::default::Default for Template {
    fn default() -> Self {
        Template::parse(DEFAULT_FORMAT)
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl Template {
    /// Parse `source`; this can't fail, since unknown placeholders are just text.
    pub fn parse(source: &str) -> Template {
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut rest = source;
        while let Some(idx) = rest.find('$') {
            text.push_str(&rest[..idx]);
            let after = &rest[idx + 1..];
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let placeholder = match &after[..len] {
                "message" => Some(Part::Message),
                "level" => Some(Part::Level),
                "levelpad" => Some(Part::LevelPad),
                "metadata" => Some(Part::Metadata),
                "date" => Some(Part::Date),
                "time" => Some(Part::Time),
                _ => None,
            };
            match placeholder {
                Some(part) => {
                    if !text.is_empty() {
                        parts.push(Part::Text(std::mem::take(&mut text)));
                    }
                    parts.push(part);
                }
                None => {
                    text.push('$');
                    text.push_str(&after[..len]);
                }
            }
            rest = &after[len..];
        }
        text.push_str(rest);
        if !text.is_empty() {
            parts.push(Part::Text(text));
        }
        Template {
            source: source.to_string(),
            parts,
        }
    }
    /// Render `event`; `metadata_keys` governs the expansion of `$metadata`.
    pub fn render(&self, event: &LogEvent, metadata_keys: &[String]) -> String {
        let mut buf = String::with_capacity(event.message.len() + 32);
        for part in &self.parts {
            match part {
                Part::Text(text) => buf.push_str(text),
                Part::Message => buf.push_str(&event.message),
                Part::Level => buf.push_str(event.level.name()),
                Part::LevelPad => buf.push_str(level_pad(event.level)),
                Part::Metadata => write_metadata(event, metadata_keys, &mut buf),
                Part::Date => buf.push_str(&event.timestamp.date()),
                Part::Time => buf.push_str(&event.timestamp.time()),
            }
        }
        buf
    }
}

fn level_pad(level: Level) -> &'static str {
    const SPACES: &str = "         ";
    &SPACES[..LONGEST_LEVEL_NAME - level.name().len()]
}

fn write_metadata(event: &LogEvent, keys: &[String], buf: &mut String) {
    for key in keys {
        if let Some(text) = event.metadata.get(key).and_then(|v| v.coerce(key)) {
            buf.push_str(key);
            buf.push('=');
            buf.push_str(&text);
            buf.push(' ');
        }
    }
}
