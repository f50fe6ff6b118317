//! Declarative key tables for line-oriented vendor formats.
//!
//! Each format lists its recognised keys once, with the value type and the
//! field it fills. [`assign_field`] is the only place values get parsed, so
//! every format reports malformed values the same way.

use log::debug;

use crate::error::{CodecError, Result};

/// Declared type of a vendor key's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-negative integer (pixel and projection counts)
    Integer,
    Float,
    Text,
}

impl FieldKind {
    fn expected(self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Text => "string",
        }
    }
}

/// A parsed value, tagged with the kind it was declared as.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(u32),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric value of an `Integer` or `Float` field.
    ///
    /// Key tables only pair numeric kinds with numeric setters, so a text
    /// value here is a table bug and panics.
    pub fn as_u32(&self) -> u32 {
        match self {
            FieldValue::Integer(v) => *v,
            FieldValue::Float(v) => *v as u32,
            FieldValue::Text(_) => unreachable!("text value assigned through a numeric setter"),
        }
    }

    /// See [`FieldValue::as_u32`].
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Integer(v) => *v as f64,
            FieldValue::Float(v) => *v,
            FieldValue::Text(_) => unreachable!("text value assigned through a numeric setter"),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Integer(v) => v.to_string(),
            FieldValue::Float(v) => v.to_string(),
        }
    }
}

/// One recognised key: its name, declared type, and the setter it feeds.
pub struct FieldSpec<T> {
    pub key: &'static str,
    pub kind: FieldKind,
    pub assign: fn(&mut T, FieldValue),
}

/// Table entry constructor, keeps the per-format tables on one line per key.
pub const fn field<T>(
    key: &'static str,
    kind: FieldKind,
    assign: fn(&mut T, FieldValue),
) -> FieldSpec<T> {
    FieldSpec { key, kind, assign }
}

/// Parse `raw` as `kind`, reporting the key on failure.
pub fn parse_value(key: &str, kind: FieldKind, raw: &str) -> Result<FieldValue> {
    let trimmed = raw.trim();
    let malformed = || CodecError::MalformedField {
        key: key.to_string(),
        value: trimmed.to_string(),
        expected: kind.expected(),
    };

    match kind {
        FieldKind::Integer => trimmed
            .parse::<u32>()
            .map(FieldValue::Integer)
            .map_err(|_| malformed()),
        FieldKind::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(FieldValue::Float)
            .ok_or_else(malformed),
        FieldKind::Text => Ok(FieldValue::Text(trimmed.to_string())),
    }
}

/// Look `key` up in `table` and, if recognised, parse and assign its value.
///
/// Returns `Ok(false)` for unrecognised keys, which callers ignore.
pub fn assign_field<T>(
    table: &[FieldSpec<T>],
    target: &mut T,
    key: &str,
    raw: &str,
) -> Result<bool> {
    let key = key.trim();
    match table.iter().find(|spec| spec.key == key) {
        Some(spec) => {
            let value = parse_value(key, spec.kind, raw)?;
            (spec.assign)(target, value);
            Ok(true)
        }
        None => {
            debug!("Ignoring unrecognized key '{key}'");
            Ok(false)
        }
    }
}
