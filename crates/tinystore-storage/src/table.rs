// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed record storage over one table.
//!
//! A [`RecordStore`] turns record operations into statement text and submits
//! each one to the shared [`TaskScheduler`] under its table name, so all
//! operations on one table run in submission order. Submission happens when
//! an operation is called; the returned future only waits for the result.
//! The statement itself runs on the [`Database`] worker.

use std::collections::{BTreeMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tinystore_core::{Record, Row, SqlEngine, TinyStoreError, ID_COLUMN};
use tracing::{debug, warn};

use crate::codec::{self, EncodedRow};
use crate::database::Database;
use crate::engine::SqliteEngine;
use crate::scheduler::TaskScheduler;
use crate::schema::Schema;
use crate::statement;

/// Options for [`RecordStore::query`].
///
/// `filter` is a raw predicate fragment without the `WHERE` keyword; it is
/// passed to the engine as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub filter: Option<String>,
    pub sort_by: Option<String>,
    pub reverse: bool,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        self.filter = Some(predicate.into());
        self
    }

    /// Sort by a column. Declared numeric columns sort arithmetically.
    pub fn sort_by(mut self, column: impl Into<String>) -> Self {
        self.sort_by = Some(column.into());
        self
    }

    /// Descending order. Ignored without [`sort_by`](Self::sort_by).
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Field name to value map for the equality variants.
pub type Filters = BTreeMap<String, Value>;

/// Storage for records of type `T` in one table.
pub struct RecordStore<T: Record> {
    table: String,
    schema: Arc<Schema>,
    scheduler: Arc<TaskScheduler>,
    db: Arc<Database>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for RecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            schema: Arc::clone(&self.schema),
            scheduler: Arc::clone(&self.scheduler),
            db: Arc::clone(&self.db),
            _record: PhantomData,
        }
    }
}

impl<T: Record> std::fmt::Debug for RecordStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("table", &self.table)
            .field("record", &self.schema.record_name())
            .field("columns", &self.schema.columns())
            .finish()
    }
}

impl<T: Record> RecordStore<T> {
    /// Bind `T` to `table`.
    ///
    /// Nothing is submitted; call [`initialize`](Self::initialize) before
    /// the first operation on a fresh database.
    ///
    /// # Errors
    ///
    /// [`TinyStoreError::Schema`] if `T`'s declared fields do not match its
    /// template. No store exists in that case.
    pub fn new(
        table: impl Into<String>,
        scheduler: Arc<TaskScheduler>,
        db: Arc<Database>,
    ) -> Result<Self, TinyStoreError> {
        let table = table.into();
        if table.replace('"', "").is_empty() {
            return Err(TinyStoreError::InvalidInput("table name is empty".into()));
        }
        let schema = Schema::derive::<T>()?;
        debug!(table = %table, record = schema.record_name(), "record store bound");
        Ok(Self {
            table,
            schema: Arc::new(schema),
            scheduler,
            db,
            _record: PhantomData,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create the table if missing, then add any declared column it lacks.
    ///
    /// Runs under the table key, so operations submitted after this call see
    /// the reconciled table. Existing columns are never altered or dropped.
    /// A column that cannot be added is logged and skipped. Resolves to the
    /// columns that were added.
    pub fn initialize(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, TinyStoreError>> + Send + use<T> {
        let table = self.table.clone();
        let schema = Arc::clone(&self.schema);
        let submitted = self.submit(move |engine| reconcile(engine, &table, &schema));
        let table = self.table.clone();
        async move {
            let result = submitted.await;
            match &result {
                Ok(added) => debug!(table = %table, added = ?added, "table initialized"),
                Err(e) => warn!(table = %table, error = %e, "table initialization failed"),
            }
            result
        }
    }

    /// Insert `record`, replacing any row with the same id.
    pub fn upsert(
        &self,
        record: &T,
    ) -> impl Future<Output = Result<(), TinyStoreError>> + Send + use<T> {
        let submitted = codec::encode(&self.schema, record).map(|row| {
            let sql = statement::upsert(&self.table, &row);
            self.submit(move |engine| engine.mutate(&sql))
        });
        async move {
            submitted?.await?;
            Ok(())
        }
    }

    /// Insert or replace every record in one statement.
    ///
    /// Resolves to the number of rows written. An empty batch is rejected.
    pub fn upsert_batch(
        &self,
        records: &[T],
    ) -> impl Future<Output = Result<usize, TinyStoreError>> + Send + use<T> {
        let submitted = records
            .iter()
            .map(|record| codec::encode(&self.schema, record))
            .collect::<Result<Vec<EncodedRow>, _>>()
            .and_then(|rows| {
                statement::upsert_batch(&self.table, self.schema.columns(), &rows).ok_or_else(|| {
                    TinyStoreError::InvalidInput("upsert_batch with no records".into())
                })
            })
            .map(|sql| self.submit(move |engine| engine.mutate(&sql)));
        async move { submitted?.await }
    }

    /// Load matching records.
    ///
    /// Rows the record type rejects are left out; the call still succeeds.
    pub fn query(
        &self,
        options: QueryOptions,
    ) -> impl Future<Output = Result<Vec<T>, TinyStoreError>> + Send + use<T> {
        let numeric_sort = options
            .sort_by
            .as_deref()
            .and_then(|column| self.schema.kind(column))
            .is_some_and(|kind| kind.is_numeric());
        let sql = statement::select(&self.table, &options, numeric_sort);
        let submitted = self.submit(move |engine| engine.query(&sql));
        let table = self.table.clone();
        let schema = Arc::clone(&self.schema);
        async move {
            let rows = submitted.await?;
            Ok(decode_rows(&table, &schema, rows))
        }
    }

    /// Load records whose fields equal every value in `filters`.
    ///
    /// Combined with `options.filter` by `AND` when both are given.
    pub fn query_eq(
        &self,
        filters: &Filters,
        mut options: QueryOptions,
    ) -> impl Future<Output = Result<Vec<T>, TinyStoreError>> + Send + use<T> {
        let submitted = self.equality_filter(filters).map(|equality| {
            options.filter = Some(match options.filter.take() {
                Some(extra) => format!("{equality} AND ({extra})"),
                None => equality,
            });
            self.query(options)
        });
        async move { submitted?.await }
    }

    /// Load the record with `id`, if any.
    pub fn get(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<T>, TinyStoreError>> + Send + use<T> {
        let filter = format!(
            "{} = {}",
            statement::quote_ident(ID_COLUMN),
            statement::quote_literal(id)
        );
        let found = self.query(QueryOptions::new().filter(filter).limit(1));
        async move { Ok(found.await?.pop()) }
    }

    /// Delete the row with `record`'s id. Resolves to the number of rows removed.
    pub fn delete(
        &self,
        record: &T,
    ) -> impl Future<Output = Result<usize, TinyStoreError>> + Send + use<T> {
        let sql = statement::delete_by_id(&self.table, record.id());
        self.submit(move |engine| engine.mutate(&sql))
    }

    /// Delete the rows of every record in one statement. An empty batch is
    /// rejected.
    pub fn delete_batch(
        &self,
        records: &[T],
    ) -> impl Future<Output = Result<usize, TinyStoreError>> + Send + use<T> {
        let submitted = statement::delete_by_ids(&self.table, records.iter().map(T::id))
            .ok_or_else(|| TinyStoreError::InvalidInput("delete_batch with no records".into()))
            .map(|sql| self.submit(move |engine| engine.mutate(&sql)));
        async move { submitted?.await }
    }

    pub fn delete_all(
        &self,
    ) -> impl Future<Output = Result<usize, TinyStoreError>> + Send + use<T> {
        let sql = statement::delete_all(&self.table);
        self.submit(move |engine| engine.mutate(&sql))
    }

    /// Delete rows matching a raw predicate fragment (no `WHERE` keyword).
    pub fn delete_where(
        &self,
        predicate: &str,
    ) -> impl Future<Output = Result<usize, TinyStoreError>> + Send + use<T> {
        let submitted = if predicate.trim().is_empty() {
            Err(TinyStoreError::InvalidInput(
                "delete_where with empty predicate; use delete_all".into(),
            ))
        } else {
            let sql = statement::delete_where(&self.table, predicate);
            Ok(self.submit(move |engine| engine.mutate(&sql)))
        };
        async move { submitted?.await }
    }

    /// Delete rows whose fields equal every value in `filters`.
    pub fn delete_eq(
        &self,
        filters: &Filters,
    ) -> impl Future<Output = Result<usize, TinyStoreError>> + Send + use<T> {
        let submitted = self.equality_filter(filters).map(|predicate| {
            let sql = statement::delete_where(&self.table, &predicate);
            self.submit(move |engine| engine.mutate(&sql))
        });
        async move { submitted?.await }
    }

    /// Enqueue `op` under this table's key right away; the returned future
    /// only waits for its result.
    fn submit<F, R>(
        &self,
        op: F,
    ) -> impl Future<Output = Result<R, TinyStoreError>> + Send + use<T, F, R>
    where
        F: FnOnce(&mut SqliteEngine<'_>) -> Result<R, rusqlite::Error> + Send + 'static,
        R: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let handle = self.scheduler.enqueue(self.table.clone(), async move {
            db.execute(move |conn| op(&mut SqliteEngine::new(conn))).await
        });
        async move { handle.await? }
    }

    fn equality_filter(&self, filters: &Filters) -> Result<String, TinyStoreError> {
        if filters.is_empty() {
            return Err(TinyStoreError::InvalidInput("equality filter is empty".into()));
        }
        let mut pairs = BTreeMap::new();
        for (column, value) in filters {
            let text = if column == ID_COLUMN {
                value.as_str().map(str::to_owned)
            } else {
                let kind = self.schema.kind(column).ok_or_else(|| {
                    TinyStoreError::InvalidInput(format!(
                        "`{column}` is not a column of {}",
                        self.table
                    ))
                })?;
                codec::encode_value(kind, value)
            };
            let text = text.ok_or_else(|| {
                TinyStoreError::InvalidInput(format!("cannot compare `{column}` with {value}"))
            })?;
            pairs.insert(column.clone(), text);
        }
        Ok(statement::equality_filter(&pairs))
    }
}

fn decode_rows<T: Record>(table: &str, schema: &Schema, rows: Vec<Row>) -> Vec<T> {
    let total = rows.len();
    let records: Vec<T> = rows
        .iter()
        .filter_map(|row| codec::decode(schema, row))
        .collect();
    if records.len() < total {
        debug!(table, dropped = total - records.len(), "rows left out of result");
    }
    records
}

/// Create `table` if missing and add the declared columns it lacks.
pub(crate) fn reconcile<E: SqlEngine>(
    engine: &mut E,
    table: &str,
    schema: &Schema,
) -> Result<Vec<String>, E::Error> {
    engine.create_schema_object(&statement::create_table(table, schema.columns()))?;

    let existing: HashSet<String> = engine.introspect_columns(table)?.into_iter().collect();
    let mut added = Vec::new();
    for &column in schema.columns() {
        if existing.contains(column) {
            continue;
        }
        match engine.create_schema_object(&statement::add_column(table, column)) {
            Ok(()) => {
                debug!(table, column, "column added");
                added.push(column.to_owned());
            }
            Err(e) => warn!(table, column, error = %e, "failed to add column"),
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tinystore_core::{FieldDecl, FieldKind};
    use tracing_test::traced_test;

    #[derive(Debug, Serialize, Deserialize)]
    struct Task {
        id: String,
        title: String,
        priority: u8,
        done: bool,
    }

    impl Record for Task {
        const FIELDS: &'static [FieldDecl] = &[
            FieldDecl::new("title", FieldKind::String),
            FieldDecl::new("priority", FieldKind::UInt8),
            FieldDecl::new("done", FieldKind::Bool),
        ];

        fn id(&self) -> &str {
            &self.id
        }

        fn template() -> Self {
            Self {
                id: String::new(),
                title: "t".into(),
                priority: 1,
                done: false,
            }
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("mock engine: {0}")]
    struct MockError(String);

    /// Engine double that records statements and refuses chosen columns.
    #[derive(Default)]
    struct MockEngine {
        columns: Vec<String>,
        refuse: Vec<&'static str>,
        fail_create: bool,
        statements: Vec<String>,
    }

    impl SqlEngine for MockEngine {
        type Error = MockError;

        fn create_schema_object(&mut self, statement: &str) -> Result<(), MockError> {
            self.statements.push(statement.to_owned());
            if self.fail_create && statement.starts_with("CREATE") {
                return Err(MockError("disk I/O error".into()));
            }
            if statement.starts_with("ALTER") {
                let refused = self
                    .refuse
                    .iter()
                    .find(|column| statement.contains(&format!("\"{column}\"")));
                if let Some(column) = refused {
                    return Err(MockError(format!("cannot add {column}")));
                }
            }
            Ok(())
        }

        fn mutate(&mut self, _statement: &str) -> Result<usize, MockError> {
            Ok(0)
        }

        fn query(&mut self, _statement: &str) -> Result<Vec<Row>, MockError> {
            Ok(Vec::new())
        }

        fn introspect_columns(&mut self, _table: &str) -> Result<Vec<String>, MockError> {
            Ok(self.columns.clone())
        }
    }

    fn schema() -> Schema {
        Schema::derive::<Task>().unwrap()
    }

    #[test]
    fn reconcile_adds_only_missing_columns() {
        let mut engine = MockEngine {
            columns: vec!["id".into(), "title".into()],
            ..Default::default()
        };
        let added = reconcile(&mut engine, "tasks", &schema()).unwrap();
        assert_eq!(added, vec!["priority", "done"]);
        assert!(engine.statements[0].starts_with("CREATE TABLE IF NOT EXISTS \"tasks\""));
        assert_eq!(
            &engine.statements[1..],
            &[
                "ALTER TABLE \"tasks\" ADD COLUMN \"priority\" TEXT",
                "ALTER TABLE \"tasks\" ADD COLUMN \"done\" TEXT",
            ]
        );
    }

    #[test]
    fn reconcile_on_current_table_adds_nothing() {
        let mut engine = MockEngine {
            columns: vec!["id".into(), "title".into(), "priority".into(), "done".into()],
            ..Default::default()
        };
        assert!(reconcile(&mut engine, "tasks", &schema()).unwrap().is_empty());
        assert_eq!(engine.statements.len(), 1);
    }

    #[traced_test]
    #[test]
    fn reconcile_logs_and_skips_refused_column() {
        let mut engine = MockEngine {
            columns: vec!["id".into()],
            refuse: vec!["priority"],
            ..Default::default()
        };
        let added = reconcile(&mut engine, "tasks", &schema()).unwrap();
        assert_eq!(added, vec!["title", "done"]);
        assert!(logs_contain("failed to add column"));
        assert!(logs_contain("cannot add priority"));
    }

    #[test]
    fn reconcile_fails_when_table_cannot_be_created() {
        let mut engine = MockEngine {
            fail_create: true,
            ..Default::default()
        };
        assert!(reconcile(&mut engine, "tasks", &schema()).is_err());
        assert_eq!(engine.statements.len(), 1);
    }

    #[test]
    fn query_options_builder() {
        let options = QueryOptions::new()
            .filter("\"done\" = '0'")
            .sort_by("priority")
            .reverse(true)
            .offset(4)
            .limit(2);
        assert_eq!(options.filter.as_deref(), Some("\"done\" = '0'"));
        assert_eq!(options.sort_by.as_deref(), Some("priority"));
        assert!(options.reverse);
        assert_eq!(options.offset, Some(4));
        assert_eq!(options.limit, Some(2));
    }
}
