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

//! RFC [5424] Structured Data
//!
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424
//!
//! The caller declares, up-front, which metadata keys may appear in which SD element (an
//! [`SdSpec`]). For each event, the event's metadata is intersected with that declaration &
//! rendered as a sequence of `[SD-ID key="value" ...]` blocks.

use crate::{
    error::{Error, Result},
    value::Value,
};

use backtrace::Backtrace;
use serde::Deserialize;

use std::collections::BTreeMap;

/// One SD element's worth of configuration: its SD-ID & the metadata keys it may carry, in the
/// order in which they should appear.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SdSpec {
    pub id: String,
    #[serde(default)]
    pub keys: Vec<String>,
}

impl SdSpec {
    pub fn new<S, I, K>(id: S, keys: I) -> SdSpec
    where
        S: Into<String>,
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        SdSpec {
            id: id.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
    /// Check the SD-ID & every key against the RFC 5424 SD-NAME grammar.
    pub fn validate(&self) -> Result<()> {
        validate_sd_name(&self.id)?;
        self.keys.iter().try_for_each(|k| validate_sd_name(k))
    }
}

/// RFC 5424 §6.3.2: `SD-NAME = 1*32PRINTUSASCII ; except '=', SP, ']', %d34 (")`
pub fn validate_sd_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name.len() <= 32
        && name
            .bytes()
            .all(|b| (33..=126).contains(&b) && b != b'=' && b != b']' && b != b'"');
    if ok {
        Ok(())
    } else {
        Err(Error::BadSdName {
            name: name.to_string(),
            back: Backtrace::new(),
        })
    }
}

/// A single, formatted-ready SD element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SdElement {
    pub id: String,
    pub params: Vec<(String, String)>,
}

impl SdElement {
    /// Append this element to `buf` as `[id key="value" ...]`.
    pub fn write_to(&self, buf: &mut String) {
        buf.push('[');
        buf.push_str(&self.id);
        for (key, value) in &self.params {
            buf.push(' ');
            buf.push_str(key);
            buf.push_str("=\"");
            escape_param_value(value, buf);
            buf.push('"');
        }
        buf.push(']');
    }
}

impl std::fmt::Display for SdElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = String::new();
        self.write_to(&mut buf);
        f.write_str(&buf)
    }
}

/// RFC 5424 §6.3.3: inside PARAM-VALUE, the characters '"', '\' & ']' MUST be escaped.
fn escape_param_value(value: &str, buf: &mut String) {
    for c in value.chars() {
        if matches!(c, '"' | '\\' | ']') {
            buf.push('\\');
        }
        buf.push(c);
    }
}

/// Intersect `metadata` with each element of `spec`.
///
/// Keys appear in the order declared in `spec`; keys whose values can't be coerced to text are
/// left out. An element with no surviving keys is still produced (as `[id]`), unless its spec
/// lists no keys at all, in which case it's skipped.
pub fn encode(spec: &[SdSpec], metadata: &BTreeMap<String, Value>) -> Vec<SdElement> {
    spec.iter()
        .filter(|sd| !sd.keys.is_empty())
        .map(|sd| SdElement {
            id: sd.id.clone(),
            params: sd
                .keys
                .iter()
                .filter_map(|key| {
                    metadata
                        .get(key)
                        .and_then(|value| value.coerce(key))
                        .map(|text| (key.clone(), text.into_owned()))
                })
                .collect(),
        })
        .collect()
}

/// Render a sequence of SD elements back-to-back, with no separator.
pub fn format_elements(elements: &[SdElement]) -> String {
    let mut buf = String::new();
    elements.iter().for_each(|el| el.write_to(&mut buf));
    buf
}
