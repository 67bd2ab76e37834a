// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the record contract, the codec, and the stores.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Name of the column that carries a record's unique id.
pub const ID_COLUMN: &str = "id";

/// The closed set of primitive kinds a record field can have.
///
/// Every kind is persisted as text. Both the encode and the decode site match
/// on this enum exhaustively, so adding a kind means updating both directions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    /// Pointer-width signed integer.
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Pointer-width unsigned integer.
    #[strum(serialize = "uint")]
    #[serde(rename = "uint")]
    UInt,
    #[strum(serialize = "uint8")]
    #[serde(rename = "uint8")]
    UInt8,
    #[strum(serialize = "uint16")]
    #[serde(rename = "uint16")]
    UInt16,
    #[strum(serialize = "uint32")]
    #[serde(rename = "uint32")]
    UInt32,
    #[strum(serialize = "uint64")]
    #[serde(rename = "uint64")]
    UInt64,
    Float,
    Double,
    Bool,
    /// Nested structured value stored as compact JSON text.
    Object,
}

impl FieldKind {
    /// True for every kind whose column must be compared arithmetically.
    pub fn is_numeric(self) -> bool {
        !matches!(self, FieldKind::String | FieldKind::Object)
    }
}

/// A single declared field: its serialized name and its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDecl {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDecl {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Health status reported by the database handle's health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Handle is open and answers a trivial statement.
    Healthy,
    /// Handle is open but the health statement failed.
    Degraded(String),
    /// Handle is not open.
    Unhealthy(String),
}
