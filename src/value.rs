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

//! Metadata values & their coercion to text.
//!
//! Log events carry a map of metadata, whose values may be of pretty much any type. When a value
//! is destined for the wire (as an SD-PARAM, or in the `$metadata` portion of a message) it needs
//! to become a string, and some values just can't be sensibly represented. [`Value`] is the
//! closed set of shapes we understand, and [`Value::coerce`] says what each becomes; `None` means
//! "leave this key out entirely".

use std::{borrow::Cow, path::PathBuf, sync::Arc};

/// Opaque runtime handles: identifiers that mean something only within this process (or this
/// host).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handle {
    /// An OS process ID
    Process(u32),
    /// A thread within this process
    Thread(std::thread::ThreadId),
    /// A [`tracing`] span ID
    ///
    /// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
    Span(u64),
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handle::Process(pid) => write!(f, "{}", pid),
            // `ThreadId` offers nothing but `Debug`, which renders as "ThreadId(N)"
            Handle::Thread(id) => write!(f, "{:?}", id),
            Handle::Span(id) => write!(f, "span-{}", id),
        }
    }
}

/// A metadata value.
#[derive(Clone)]
pub enum Value {
    /// No value at all
    Nil,
    Str(String),
    Int(i128),
    Float(f64),
    Bool(bool),
    /// The unit value; renders as the empty string
    Unit,
    Handle(Handle),
    /// A symbolic name, such as an enum variant or module; may be path-qualified (`Ordering::Less`)
    Symbol(String),
    /// Something pathname-like, such as a source file
    Path(PathBuf),
    List(Vec<Value>),
    /// A (module, function, arity) triple identifying a call site
    Call {
        module: String,
        function: String,
        arity: u32,
    },
    /// Anything else that can describe itself as text
    Display(Arc<dyn std::fmt::Display + Send + Sync>),
    /// Anything else that can't
    Opaque,
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Int(n) => write!(f, "Int({})", n),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Unit => write!(f, "Unit"),
            Value::Handle(h) => write!(f, "Handle({})", h),
            Value::Symbol(s) => write!(f, "Symbol({})", s),
            Value::Path(p) => write!(f, "Path({:?})", p),
            Value::List(l) => f.debug_tuple("List").field(l).finish(),
            Value::Call {
                module,
                function,
                arity,
            } => write!(f, "Call({}.{}/{})", module, function, arity),
            Value::Display(d) => write!(f, "Display({})", d),
            Value::Opaque => write!(f, "Opaque"),
        }
    }
}

impl Value {
    /// Wrap anything implementing [`std::fmt::Display`].
    pub fn display<T: std::fmt::Display + Send + Sync + 'static>(x: T) -> Value {
        Value::Display(Arc::new(x))
    }
    /// Coerce this value to text, on behalf of metadata key `key`.
    ///
    /// Checked in order; the first rule that matches wins:
    ///
    /// 1. nil: no value
    /// 2. strings: themselves
    /// 3. integers: decimal
    /// 4. floats: their canonical representation (always with a fractional part or exponent)
    /// 5. handles: their canonical textual form
    /// 6. symbols: their bare name, sans `crate::` & raw-identifier prefixes; unit becomes ""
    /// 7. paths: as-is
    /// 8. a non-empty list of segments under the key `domain`: the segments joined with "."
    /// 9. a call under the keys `mfa` or `initial_call`: `module.function/arity`
    /// 10. any other list: no value
    /// 11. anything else with a textual form: that form; otherwise no value
    pub fn coerce(&self, key: &str) -> Option<Cow<'_, str>> {
        match self {
            Value::Nil => None,
            Value::Str(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Int(n) => Some(Cow::Owned(n.to_string())),
            Value::Float(x) => Some(Cow::Owned(format!("{:?}", x))),
            Value::Handle(h) => Some(Cow::Owned(h.to_string())),
            Value::Symbol(s) => Some(bare_name(s)),
            Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Unit => Some(Cow::Borrowed("")),
            Value::Path(p) => Some(p.to_string_lossy()),
            Value::List(segments) if key == "domain" => join_domain(segments).map(Cow::Owned),
            Value::Call {
                module,
                function,
                arity,
            } if key == "mfa" || key == "initial_call" => Some(Cow::Owned(format!(
                "{}.{}/{}",
                module.replace("::", "."),
                function,
                arity
            ))),
            Value::List(_) => None,
            Value::Display(d) => Some(Cow::Owned(d.to_string())),
            Value::Call { .. } | Value::Opaque => None,
        }
    }
}

/// Strip the language-level namespace from a symbol: a leading `::` or `crate::`, and raw-identifier
/// prefixes (`r#type` => `type`). The path itself is kept (`my_app::db::pool` stays as-is).
fn bare_name(s: &str) -> Cow<'_, str> {
    let s = s.strip_prefix("::").unwrap_or(s);
    let s = s.strip_prefix("crate::").unwrap_or(s);
    let s = s.strip_prefix("r#").unwrap_or(s);
    if s.contains("::r#") {
        Cow::Owned(s.replace("::r#", "::"))
    } else {
        Cow::Borrowed(s)
    }
}

fn join_domain(segments: &[Value]) -> Option<String> {
    if segments.is_empty() {
        return None;
    }
    segments
        .iter()
        .map(|seg| match seg {
            Value::Symbol(s) => Some(bare_name(s)),
            Value::Str(s) => Some(Cow::Borrowed(s.as_str())),
            _ => None,
        })
        .collect::<Option<Vec<Cow<'_, str>>>>()
        .map(|v| v.join("."))
}

impl std::convert::From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::Str(x.to_string())
    }
}

impl std::convert::From<String> for Value {
    fn from(x: String) -> Self {
        Value::Str(x)
    }
}

impl std::convert::From<i64> for Value {
    fn from(x: i64) -> Self {
        Value::Int(x as i128)
    }
}

impl std::convert::From<u64> for Value {
    fn from(x: u64) -> Self {
        Value::Int(x as i128)
    }
}

impl std::convert::From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Int(x as i128)
    }
}

impl std::convert::From<u32> for Value {
    fn from(x: u32) -> Self {
        Value::Int(x as i128)
    }
}

impl std::convert::From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl std::convert::From<bool> for Value {
    fn from(x: bool) -> Self {
        Value::Bool(x)
    }
}

impl std::convert::From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl std::convert::From<Handle> for Value {
    fn from(x: Handle) -> Self {
        Value::Handle(x)
    }
}

impl std::convert::From<PathBuf> for Value {
    fn from(x: PathBuf) -> Self {
        Value::Path(x)
    }
}

impl<T: Into<Value>> std::convert::From<Option<T>> for Value {
    fn from(x: Option<T>) -> Self {
        x.map(Into::into).unwrap_or(Value::Nil)
    }
}
