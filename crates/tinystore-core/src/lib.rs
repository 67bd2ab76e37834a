// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the TinyStore persistence layer.
//!
//! This crate provides the error type, the closed set of field kinds, the
//! [`Record`] contract every storable entity implements, and the
//! [`SqlEngine`] capability surface the stores depend on. It has no engine
//! dependency of its own.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TinyStoreError;
pub use traits::{Record, Row, SqlEngine};
pub use types::{FieldDecl, FieldKind, HealthStatus, ID_COLUMN};
