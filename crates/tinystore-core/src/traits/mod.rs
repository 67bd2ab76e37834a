// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits: what a storable record must provide, and what the
//! underlying relational engine must offer.

pub mod engine;
pub mod record;

pub use engine::{Row, SqlEngine};
pub use record::Record;
