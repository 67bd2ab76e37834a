// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration tests.
//!
//! `TestHarness` owns a temp directory holding a configured database, the
//! scheduler every store in the test shares, and a root for blob files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tinystore_config::{BlobConfig, StorageConfig};
use tinystore_core::{Record, TinyStoreError};
use tinystore_storage::{BlobStore, Database, RecordStore, TaskScheduler};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    wal_mode: bool,
    busy_timeout_ms: u64,
    file_name: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            wal_mode: true,
            busy_timeout_ms: 5000,
            file_name: "test.db".to_string(),
        }
    }

    pub fn with_wal_mode(mut self, enabled: bool) -> Self {
        self.wal_mode = enabled;
        self
    }

    pub fn with_busy_timeout_ms(mut self, ms: u64) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    /// Database file name inside the temp directory.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Create the temp directory, open the database and start a scheduler.
    pub async fn build(self) -> Result<TestHarness, TinyStoreError> {
        let temp_dir = tempfile::TempDir::new().map_err(TinyStoreError::storage)?;
        let db_path = temp_dir.path().join(&self.file_name);

        let storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: self.wal_mode,
            busy_timeout_ms: self.busy_timeout_ms,
        };
        let db = Database::new(storage);
        db.configure().await?;

        Ok(TestHarness {
            db: Arc::new(db),
            scheduler: Arc::new(TaskScheduler::new()?),
            db_path,
            temp_dir,
        })
    }
}

/// A configured database in a temp directory, removed on drop.
pub struct TestHarness {
    /// The open database handle.
    pub db: Arc<Database>,
    /// Scheduler shared by every store created through this harness.
    pub scheduler: Arc<TaskScheduler>,
    db_path: PathBuf,
    temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings.
    pub async fn new() -> Result<Self, TinyStoreError> {
        Self::builder().build().await
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Bind `T` to `table` without initializing it.
    pub fn store<T: Record>(&self, table: &str) -> Result<RecordStore<T>, TinyStoreError> {
        RecordStore::new(table, Arc::clone(&self.scheduler), Arc::clone(&self.db))
    }

    /// Bind `T` to `table` and wait for the table to be created.
    pub async fn initialized_store<T: Record>(
        &self,
        table: &str,
    ) -> Result<RecordStore<T>, TinyStoreError> {
        let store = self.store(table)?;
        store.initialize().await?;
        Ok(store)
    }

    /// Blob store rooted at `<temp>/blobs`.
    pub fn blob_store(&self) -> Result<BlobStore, TinyStoreError> {
        BlobStore::new(BlobConfig {
            root_dir: Some(self.dir().join("blobs").to_string_lossy().into_owned()),
            create_parent_dirs: true,
        })
    }

    /// Tear the database down; later operations fail with `NotOpen`.
    pub async fn teardown(&self) -> Result<(), TinyStoreError> {
        self.db.teardown().await
    }
}
