// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`SqlEngine`] over a `rusqlite` connection.
//!
//! Runs only on the database's single worker thread; see [`crate::database`].

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tinystore_core::{Row, SqlEngine};

use crate::statement::quote_ident;

/// A borrowed worker connection seen through [`SqlEngine`].
pub struct SqliteEngine<'c>(&'c mut Connection);

impl<'c> SqliteEngine<'c> {
    pub fn new(conn: &'c mut Connection) -> Self {
        Self(conn)
    }
}

impl SqlEngine for SqliteEngine<'_> {
    type Error = rusqlite::Error;

    fn create_schema_object(&mut self, statement: &str) -> Result<(), Self::Error> {
        self.0.execute_batch(statement)
    }

    fn mutate(&mut self, statement: &str) -> Result<usize, Self::Error> {
        self.0.execute(statement, [])
    }

    fn query(&mut self, statement: &str) -> Result<Vec<Row>, Self::Error> {
        let mut stmt = self.0.prepare(statement)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Row::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                if let Some(text) = value_to_text(row.get_ref(i)?) {
                    values.insert(name.clone(), text);
                }
            }
            if !values.is_empty() {
                out.push(values);
            }
        }
        Ok(out)
    }

    fn introspect_columns(&mut self, table: &str) -> Result<Vec<String>, Self::Error> {
        let sql = format!("PRAGMA table_info({})", quote_ident(table));
        let mut stmt = self.0.prepare(&sql)?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>("name"))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

/// Render any SQLite value as text. `NULL` has no textual form.
fn value_to_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
