// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tinystore.toml` > `~/.config/tinystore/tinystore.toml` >
//! `/etc/tinystore/tinystore.toml` with environment variable overrides via `TINYSTORE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TinyStoreConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tinystore/tinystore.toml` (system-wide)
/// 3. `~/.config/tinystore/tinystore.toml` (user XDG config)
/// 4. `./tinystore.toml` (local directory)
/// 5. `TINYSTORE_*` environment variables
pub fn load_config() -> Result<TinyStoreConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and embedded configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TinyStoreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TinyStoreConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TinyStoreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TinyStoreConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TinyStoreConfig::default()))
        .merge(Toml::file("/etc/tinystore/tinystore.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tinystore/tinystore.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tinystore.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `TINYSTORE_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("TINYSTORE_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name onto a dotted config path.
///
/// Only the leading section name is split off; unknown sections pass through
/// unchanged and surface as unknown-key diagnostics.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 3] = ["storage", "blobs", "logging"];
    SECTIONS
        .iter()
        .find_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|rest| format!("{section}.{rest}"))
        })
        .unwrap_or_else(|| key.to_string())
}
