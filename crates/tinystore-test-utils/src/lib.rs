// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for TinyStore integration tests.
//!
//! # Components
//!
//! - [`TestHarness`] - temp database, shared scheduler and blob root
//! - [`records`] - sample record types covering every field kind
//! - [`init_test_tracing`] - log output for test runs

pub mod harness;
pub mod records;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use records::{Contact, Sample, SampleMeta};

/// Install a `fmt` subscriber for tests.
///
/// Uses `RUST_LOG` when set, otherwise `tinystore=<level>,warn`. Safe to call
/// from every test; only the first call installs anything.
pub fn init_test_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tinystore={level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer()
        .try_init();
}
