// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Statement text builders.
//!
//! Every value reaches the engine as a quoted text literal; every identifier
//! is double-quoted. Filter fragments passed in by callers are appended
//! verbatim after `WHERE`.

use std::collections::BTreeMap;

use tinystore_core::ID_COLUMN;

use crate::codec::EncodedRow;
use crate::table::QueryOptions;

/// Quote an identifier. Embedded double quotes are stripped.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', ""))
}

/// Quote a text literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn create_table(table: &str, columns: &[&str]) -> String {
    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({} TEXT PRIMARY KEY NOT NULL",
        quote_ident(table),
        quote_ident(ID_COLUMN)
    );
    for column in columns {
        sql.push_str(", ");
        sql.push_str(&quote_ident(column));
        sql.push_str(" TEXT");
    }
    sql.push(')');
    sql
}

pub fn add_column(table: &str, column: &str) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {} TEXT",
        quote_ident(table),
        quote_ident(column)
    )
}

/// Single-row insert-or-replace naming only the columns present in `row`.
pub fn upsert(table: &str, row: &EncodedRow) -> String {
    let mut names = vec![quote_ident(ID_COLUMN)];
    let mut values = vec![quote_literal(&row.id)];
    for (column, value) in &row.values {
        names.push(quote_ident(column));
        values.push(quote_literal(value));
    }
    format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
        quote_ident(table),
        names.join(", "),
        values.join(", ")
    )
}

/// One multi-row insert-or-replace over `columns`. Values a row lacks are
/// written as `NULL`. Returns `None` for an empty batch.
pub fn upsert_batch(table: &str, columns: &[&str], rows: &[EncodedRow]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let names = std::iter::once(ID_COLUMN)
        .chain(columns.iter().copied())
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ");

    let tuples = rows
        .iter()
        .map(|row| {
            let values = std::iter::once(quote_literal(&row.id))
                .chain(columns.iter().map(|column| {
                    row.values
                        .get(*column)
                        .map_or_else(|| "NULL".to_string(), |v| quote_literal(v))
                }))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({values})")
        })
        .collect::<Vec<_>>()
        .join(", ");

    Some(format!(
        "INSERT OR REPLACE INTO {} ({names}) VALUES {tuples}",
        quote_ident(table)
    ))
}

/// `SELECT` with optional filter, ordering and window.
///
/// `numeric_sort` adds `+ 0` to the sort expression so text columns holding
/// numbers compare arithmetically. `reverse` has no effect without `sort_by`.
pub fn select(table: &str, options: &QueryOptions, numeric_sort: bool) -> String {
    let mut sql = format!("SELECT * FROM {}", quote_ident(table));

    if let Some(filter) = options.filter.as_deref() {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }

    if let Some(column) = options.sort_by.as_deref() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&quote_ident(column));
        if numeric_sort {
            sql.push_str(" + 0");
        }
        if options.reverse {
            sql.push_str(" DESC");
        }
    }

    match (options.limit, options.offset) {
        (Some(limit), offset) => {
            sql.push_str(&format!(" LIMIT {limit} OFFSET {}", offset.unwrap_or(0)));
        }
        (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
        (None, None) => {}
    }

    sql
}

pub fn delete_by_id(table: &str, id: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} = {}",
        quote_ident(table),
        quote_ident(ID_COLUMN),
        quote_literal(id)
    )
}

/// `DELETE ... WHERE id IN (...)`. Returns `None` when `ids` is empty.
pub fn delete_by_ids<'a>(table: &str, ids: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let list = ids.into_iter().map(quote_literal).collect::<Vec<_>>();
    if list.is_empty() {
        return None;
    }
    Some(format!(
        "DELETE FROM {} WHERE {} IN ({})",
        quote_ident(table),
        quote_ident(ID_COLUMN),
        list.join(", ")
    ))
}

pub fn delete_all(table: &str) -> String {
    format!("DELETE FROM {}", quote_ident(table))
}

pub fn delete_where(table: &str, predicate: &str) -> String {
    format!("DELETE FROM {} WHERE {predicate}", quote_ident(table))
}

/// Conjunction of `column = 'value'` clauses, in column order.
pub fn equality_filter(pairs: &BTreeMap<String, String>) -> String {
    pairs
        .iter()
        .map(|(column, value)| format!("{} = {}", quote_ident(column), quote_literal(value)))
        .collect::<Vec<_>>()
        .join(" AND ")
}
