// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record <-> text column mapping.
//!
//! Every column is stored as text. Numbers use Rust's locale-independent
//! shortest round-trip form, bools are `"1"`/`"0"`, and object fields are
//! compact JSON. On the way back, empty text means the field is absent, so
//! the record's own serde defaults decide what a missing field becomes.
//!
//! [`encode_value`] and [`decode_value`] are the only places that match on
//! [`FieldKind`]; keep them in step.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};
use tinystore_core::{FieldKind, Record, Row, TinyStoreError, ID_COLUMN};
use tracing::debug;

use crate::schema::Schema;

/// A record flattened to text columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRow {
    pub id: String,
    /// Declared columns with a value. Columns without one are not listed.
    pub values: BTreeMap<String, String>,
}

/// Render one field value as column text.
///
/// Returns `None` for JSON `null` and for values that do not fit `kind`.
pub fn encode_value(kind: FieldKind, value: &Value) -> Option<String> {
    if value.is_null() {
        return None;
    }
    match kind {
        FieldKind::String => value.as_str().map(str::to_owned),
        FieldKind::Int
        | FieldKind::Int8
        | FieldKind::Int16
        | FieldKind::Int32
        | FieldKind::Int64 => value.as_i64().map(|n| n.to_string()),
        FieldKind::UInt
        | FieldKind::UInt8
        | FieldKind::UInt16
        | FieldKind::UInt32
        | FieldKind::UInt64 => value.as_u64().map(|n| n.to_string()),
        FieldKind::Float => value.as_f64().map(|f| (f as f32).to_string()),
        FieldKind::Double => value.as_f64().map(|f| f.to_string()),
        FieldKind::Bool => value.as_bool().map(|b| if b { "1" } else { "0" }.to_owned()),
        FieldKind::Object => serde_json::to_string(value).ok(),
    }
}

/// Parse column text back into a field value.
///
/// Returns `None` for empty text and for text that does not parse as `kind`,
/// including integers outside the declared width. Object text that is not
/// valid JSON is kept as a raw string.
pub fn decode_value(kind: FieldKind, text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    match kind {
        FieldKind::String => Some(Value::String(text.to_owned())),
        FieldKind::Int => text.parse::<isize>().ok().map(Value::from),
        FieldKind::Int8 => text.parse::<i8>().ok().map(Value::from),
        FieldKind::Int16 => text.parse::<i16>().ok().map(Value::from),
        FieldKind::Int32 => text.parse::<i32>().ok().map(Value::from),
        FieldKind::Int64 => text.parse::<i64>().ok().map(Value::from),
        FieldKind::UInt => text.parse::<usize>().ok().map(Value::from),
        FieldKind::UInt8 => text.parse::<u8>().ok().map(Value::from),
        FieldKind::UInt16 => text.parse::<u16>().ok().map(Value::from),
        FieldKind::UInt32 => text.parse::<u32>().ok().map(Value::from),
        FieldKind::UInt64 => text.parse::<u64>().ok().map(Value::from),
        FieldKind::Float => text
            .parse::<f32>()
            .ok()
            .and_then(|f| Number::from_f64(f64::from(f)))
            .map(Value::Number),
        FieldKind::Double => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        FieldKind::Bool => text.parse::<i64>().ok().map(|n| Value::Bool(n == 1)),
        FieldKind::Object => Some(
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned())),
        ),
    }
}

/// Flatten `record` into text columns per `schema`.
///
/// # Errors
///
/// [`TinyStoreError::Codec`] if the record does not serialize to an object,
/// or a declared field holds a value that does not fit its kind.
pub fn encode<T: Record>(schema: &Schema, record: &T) -> Result<EncodedRow, TinyStoreError> {
    let value = serde_json::to_value(record)
        .map_err(|e| TinyStoreError::Codec(format!("{}: {e}", schema.record_name())))?;
    let Value::Object(fields) = value else {
        return Err(TinyStoreError::Codec(format!(
            "{} does not serialize to an object",
            schema.record_name()
        )));
    };

    let mut values = BTreeMap::new();
    for &column in schema.columns() {
        let Some(value) = fields.get(column).filter(|v| !v.is_null()) else {
            continue;
        };
        let kind = schema.kind(column).unwrap_or(FieldKind::Object);
        let text = encode_value(kind, value).ok_or_else(|| {
            TinyStoreError::Codec(format!(
                "{}.{column} does not hold a {kind} value",
                schema.record_name()
            ))
        })?;
        values.insert(column.to_owned(), text);
    }

    Ok(EncodedRow {
        id: record.id().to_owned(),
        values,
    })
}

/// Rebuild a record from a row, or `None` if the record rejects it.
///
/// Columns the schema does not declare are ignored.
pub fn decode<T: Record>(schema: &Schema, row: &Row) -> Option<T> {
    let mut fields = Map::with_capacity(row.len());
    for (column, text) in row {
        if text.is_empty() {
            continue;
        }
        if column == ID_COLUMN {
            fields.insert(column.clone(), Value::String(text.clone()));
        } else if let Some(kind) = schema.kind(column) {
            if let Some(value) = decode_value(kind, text) {
                fields.insert(column.clone(), value);
            }
        }
    }

    match serde_json::from_value(Value::Object(fields)) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(
                record = schema.record_name(),
                id = row.get(ID_COLUMN).map(String::as_str).unwrap_or_default(),
                error = %e,
                "row dropped: record rejected decoded fields"
            );
            None
        }
    }
}
