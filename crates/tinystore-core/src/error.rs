// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the TinyStore persistence library.

use thiserror::Error;

/// The primary error type returned by every TinyStore operation.
///
/// A returned `Err` is the failure report of exactly one operation. It never
/// affects the scheduler, the serializer, or any other submitted task.
#[derive(Debug, Error)]
pub enum TinyStoreError {
    /// The record's declared schema does not match its template instance.
    ///
    /// Raised only at store construction; a store that fails here is never built.
    #[error("schema error for record `{record}`: {message}")]
    Schema { record: String, message: String },

    /// `configure` was called on a handle that is already open or torn down.
    #[error("database handle is already open")]
    AlreadyOpen,

    /// The handle was never opened, or has been torn down.
    #[error("database handle is not open")]
    NotOpen,

    /// Engine-level failure (open, malformed statement, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Degenerate input that would otherwise be a silent no-op.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A record could not be mapped onto column values.
    #[error("codec error: {0}")]
    Codec(String),

    /// Filesystem failure in the blob store.
    #[error("blob error at {path}: {source}")]
    Blob {
        path: String,
        source: std::io::Error,
    },

    /// Internal or unexpected errors (dropped task, poisoned lock).
    #[error("internal error: {0}")]
    Internal(String),
}

impl TinyStoreError {
    /// Wraps any engine error as [`TinyStoreError::Storage`].
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Returns `true` for errors that mean the handle is unusable rather than
    /// that a single statement failed.
    pub fn is_handle_error(&self) -> bool {
        matches!(self, Self::AlreadyOpen | Self::NotOpen)
    }
}
