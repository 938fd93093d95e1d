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

//! Primitives for mapping [`tracing`] entities to [`LogEvent`]s.
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//!
//! An [`Event`]'s `message` field becomes the [`LogEvent`]'s message, and its remaining fields
//! become metadata, alongside a few keys derived from the event's [`Metadata`]:
//!
//! | key      | value                                      |
//! |----------|--------------------------------------------|
//! | `file`   | source file, as a path                     |
//! | `line`   | source line                                |
//! | `module` | module path                                |
//! | `target` | the event's target                         |
//! | `domain` | the target, split on `::`                  |
//! | `pid`    | this process' ID                           |
//! | `thread` | the ID of the thread that emitted the event |
//!
//! Fields recorded on the event itself take precedence over these.
//!
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//! [`Metadata`]: https://docs.rs/tracing/0.1.35/tracing/struct.Metadata.html

use crate::{
    event::LogEvent,
    facility::Level,
    timestamp::Timestamp,
    value::{Handle, Value},
};

use std::{collections::BTreeMap, path::PathBuf};

/// The default mapping from [`tracing::Level`] to syslog severity.
pub fn default_level_mapping(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::TRACE | tracing::Level::DEBUG => Level::LOG_DEBUG,
        tracing::Level::INFO => Level::LOG_INFO,
        tracing::Level::WARN => Level::LOG_WARNING,
        tracing::Level::ERROR => Level::LOG_ERR,
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    metadata: BTreeMap<String, Value>,
}

impl FieldVisitor {
    fn record(&mut self, field: &tracing::field::Field, value: Value) {
        self.metadata.insert(field.name().to_string(), value);
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            // Regrettably, we have only a `Debug` implementation available to us; but the tracing
            // macros `info!()`, `event!()` & the like all take care to "pre-format" the `mesage`
            // field so that `value` actually refers to a `std::fmt::Arguments` instance, which will
            // print to a debug format without enclosing double-quotes.
            self.message = Some(format!("{:?}", value));
        } else {
            self.record(field, Value::Str(format!("{:?}", value)));
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.record(field, Value::Str(value.to_string()));
        }
    }
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.record(field, Value::Int(value as i128));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.record(field, Value::Int(value as i128));
    }
    fn record_i128(&mut self, field: &tracing::field::Field, value: i128) {
        self.record(field, Value::Int(value));
    }
    fn record_u128(&mut self, field: &tracing::field::Field, value: u128) {
        // Beyond i128::MAX there's no integer we can carry; fall back to text
        match i128::try_from(value) {
            Ok(n) => self.record(field, Value::Int(n)),
            Err(_) => self.record(field, Value::Str(value.to_string())),
        }
    }
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.record(field, Value::Float(value));
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.record(field, Value::Bool(value));
    }
    fn record_error(
        &mut self,
        field: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.record(field, Value::display(value.to_string()));
    }
}

/// Build a [`LogEvent`] from a [`tracing`] event.
///
/// `meta` is usually `event.metadata()`, but may be the normalized metadata of an event that
/// originated with the `log` crate. An event without a `message` field gets an empty message.
///
/// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
pub fn to_log_event(
    event: &tracing::Event<'_>,
    meta: &tracing::Metadata<'_>,
    map_level: &(dyn Fn(&tracing::Level) -> Level + Send + Sync),
) -> LogEvent {
    let mut visitor = FieldVisitor::default();
    event.record(&mut visitor);

    let mut metadata = builtin_metadata(meta);
    metadata.append(&mut visitor.metadata);

    LogEvent {
        level: map_level(meta.level()),
        message: visitor.message.unwrap_or_default(),
        timestamp: Timestamp::now(),
        metadata,
    }
}

fn builtin_metadata(meta: &tracing::Metadata<'_>) -> BTreeMap<String, Value> {
    let mut md = BTreeMap::new();
    if let Some(file) = meta.file() {
        md.insert("file".to_string(), Value::Path(PathBuf::from(file)));
    }
    if let Some(line) = meta.line() {
        md.insert("line".to_string(), Value::Int(line as i128));
    }
    if let Some(module) = meta.module_path() {
        // Full path, e.g. `my_app::db::pool`
        md.insert("module".to_string(), Value::Str(module.to_string()));
    }
    md.insert("target".to_string(), Value::Str(meta.target().to_string()));
    md.insert(
        "domain".to_string(),
        Value::List(
            meta.target()
                .split("::")
                .map(|seg| Value::Symbol(seg.to_string()))
                .collect(),
        ),
    );
    md.insert(
        "pid".to_string(),
        Value::Handle(Handle::Process(std::process::id())),
    );
    md.insert(
        "thread".to_string(),
        Value::Handle(Handle::Thread(std::thread::current().id())),
    );
    md
}
