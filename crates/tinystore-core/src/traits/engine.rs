// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The narrow capability surface the stores need from a relational engine.

use std::collections::HashMap;

/// A result row: column name to textual value. `NULL` columns are absent.
pub type Row = HashMap<String, String>;

/// A relational engine with "one active connection, one active statement"
/// semantics.
///
/// Implementations are not required to be thread-safe; callers reach the
/// engine only through a single-worker serializer.
pub trait SqlEngine {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Executes a schema statement such as `CREATE TABLE`.
    fn create_schema_object(&mut self, statement: &str) -> Result<(), Self::Error>;

    /// Executes a data-modifying statement and returns the affected row count.
    fn mutate(&mut self, statement: &str) -> Result<usize, Self::Error>;

    /// Executes a query and returns every row as text.
    fn query(&mut self, statement: &str) -> Result<Vec<Row>, Self::Error>;

    /// Lists the column names of an existing table. A missing table yields
    /// an empty list.
    fn introspect_columns(&mut self, table: &str) -> Result<Vec<String>, Self::Error>;
}
