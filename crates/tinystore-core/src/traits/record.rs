// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The contract every storable entity satisfies.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::FieldDecl;

/// A strongly-typed record persisted as one row of a table.
///
/// The record's serde representation must be a map whose keys are the
/// declared field names (plus `id`). Optional fields that deserialize with a
/// default are how a record opts into tolerating absent columns; a required
/// field that is absent makes the row undecodable, and such rows are dropped
/// from query results.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Declared fields, in column order. `id` may be omitted.
    const FIELDS: &'static [FieldDecl];

    /// Stable unique id of this record.
    fn id(&self) -> &str;

    /// A fully-populated throwaway instance used only to check [`Self::FIELDS`]
    /// at store construction. Never persisted.
    fn template() -> Self;
}
