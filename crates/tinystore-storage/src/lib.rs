// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed typed record storage for TinyStore.
//!
//! Two tiers keep the single engine handle safe under concurrent callers:
//! a [`TaskScheduler`] admits keyed work and keeps it FIFO per key (one key
//! per table), and a [`Database`] runs every handle operation on one
//! dedicated `tokio-rusqlite` worker. [`RecordStore`] builds statements from a
//! record's declared schema and maps rows through the text [`codec`].
//! [`BlobStore`] applies the same per-key fencing to plain files.

pub mod blob;
pub mod codec;
pub mod database;
pub mod engine;
pub mod scheduler;
pub mod schema;
pub mod statement;
pub mod table;

pub use blob::BlobStore;
pub use codec::EncodedRow;
pub use database::{CompletionContext, Database};
pub use engine::SqliteEngine;
pub use scheduler::{TaskHandle, TaskScheduler};
pub use schema::Schema;
pub use table::{Filters, QueryOptions, RecordStore};
