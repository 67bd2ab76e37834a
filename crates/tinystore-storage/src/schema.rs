// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-record column schema, checked once against the record's template.

use std::collections::HashMap;

use serde_json::Value;
use tinystore_core::{FieldDecl, FieldKind, Record, TinyStoreError, ID_COLUMN};

/// The column layout of one record type. Immutable once derived.
///
/// The id column is not part of [`Schema::columns`]; it is always present,
/// always text, and handled apart from the declared fields.
#[derive(Debug, Clone)]
pub struct Schema {
    record: &'static str,
    columns: Vec<&'static str>,
    kinds: HashMap<&'static str, FieldKind>,
}

impl Schema {
    /// Build the schema for `T` from its declared fields, checking the
    /// declaration against `T::template()`.
    ///
    /// # Errors
    ///
    /// [`TinyStoreError::Schema`] when the declaration and the template
    /// disagree. A store must not be built from a type that fails here.
    pub fn derive<T: Record>() -> Result<Self, TinyStoreError> {
        let record = short_type_name::<T>();
        let fail = |message: String| TinyStoreError::Schema {
            record: record.to_string(),
            message,
        };

        let template = serde_json::to_value(T::template())
            .map_err(|e| fail(format!("template does not serialize: {e}")))?;
        let Value::Object(template) = template else {
            return Err(fail("template does not serialize to an object".into()));
        };

        let mut columns = Vec::with_capacity(T::FIELDS.len());
        let mut kinds = HashMap::with_capacity(T::FIELDS.len());

        for FieldDecl { name, kind } in T::FIELDS.iter().copied() {
            if name.is_empty() || name.contains('"') {
                return Err(fail(format!("invalid field name `{name}`")));
            }
            if name == ID_COLUMN {
                if kind != FieldKind::String {
                    return Err(fail(format!("`{ID_COLUMN}` must be declared as string, not {kind}")));
                }
                continue;
            }
            if kinds.insert(name, kind).is_some() {
                return Err(fail(format!("field `{name}` declared twice")));
            }

            match template.get(name) {
                None | Some(Value::Null) => {
                    return Err(fail(format!("template has no value for field `{name}`")));
                }
                Some(value) if !kind_accepts(kind, value) => {
                    return Err(fail(format!(
                        "template value for `{name}` is not a valid {kind}"
                    )));
                }
                Some(_) => {}
            }
            columns.push(name);
        }

        let template_fields = template.keys().filter(|k| *k != ID_COLUMN).count();
        if template_fields != columns.len() {
            return Err(fail(format!(
                "template has {template_fields} fields but {} are declared",
                columns.len()
            )));
        }

        Ok(Self {
            record,
            columns,
            kinds,
        })
    }

    /// Short type name of the record, for messages.
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    /// Declared non-id columns, in declaration order.
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn kind(&self, column: &str) -> Option<FieldKind> {
        self.kinds.get(column).copied()
    }
}

/// Whether a JSON value can be stored under `kind`.
pub(crate) fn kind_accepts(kind: FieldKind, value: &Value) -> bool {
    use FieldKind::*;
    match kind {
        String => value.is_string(),
        Int => value.as_i64().is_some_and(|n| isize::try_from(n).is_ok()),
        Int8 => value.as_i64().is_some_and(|n| i8::try_from(n).is_ok()),
        Int16 => value.as_i64().is_some_and(|n| i16::try_from(n).is_ok()),
        Int32 => value.as_i64().is_some_and(|n| i32::try_from(n).is_ok()),
        Int64 => value.as_i64().is_some(),
        UInt => value.as_u64().is_some_and(|n| usize::try_from(n).is_ok()),
        UInt8 => value.as_u64().is_some_and(|n| u8::try_from(n).is_ok()),
        UInt16 => value.as_u64().is_some_and(|n| u16::try_from(n).is_ok()),
        UInt32 => value.as_u64().is_some_and(|n| u32::try_from(n).is_ok()),
        UInt64 => value.as_u64().is_some(),
        Float | Double => value.is_number(),
        Bool => value.is_boolean(),
        Object => !value.is_null(),
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
