// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Path-keyed file storage.
//!
//! A [`BlobStore`] fences every operation by its resolved path with its own
//! [`TaskScheduler`], so reads and writes of one file happen in submission
//! order while different files proceed independently. Each operation is
//! enqueued when it is called and the returned future only waits for it.
//! There is no database worker here; each operation goes straight to the
//! filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tinystore_config::BlobConfig;
use tinystore_core::TinyStoreError;
use tracing::debug;

use crate::scheduler::TaskScheduler;

pub struct BlobStore {
    config: BlobConfig,
    scheduler: TaskScheduler,
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("root_dir", &self.config.root_dir)
            .finish()
    }
}

impl BlobStore {
    /// Create a store on the current tokio runtime.
    pub fn new(config: BlobConfig) -> Result<Self, TinyStoreError> {
        Ok(Self {
            config,
            scheduler: TaskScheduler::new()?,
        })
    }

    /// Absolute paths are used as given; relative ones resolve against
    /// `root_dir` when configured.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match &self.config.root_dir {
            Some(root) if path.is_relative() => Path::new(root).join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Read the file's bytes. A missing file is `Ok(None)`.
    pub fn get_raw(
        &self,
        path: impl AsRef<Path>,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TinyStoreError>> + Send {
        let path = self.resolve(path);
        let handle = self
            .scheduler
            .enqueue(fence_key(&path), async move { read(&path).await });
        async move { handle.await? }
    }

    /// Replace the file's contents with `bytes`.
    pub fn put_raw(
        &self,
        path: impl AsRef<Path>,
        bytes: impl Into<Vec<u8>>,
    ) -> impl Future<Output = Result<(), TinyStoreError>> + Send {
        let path = self.resolve(path);
        let bytes = bytes.into();
        let create_parents = self.config.create_parent_dirs;
        let handle = self.scheduler.enqueue(fence_key(&path), async move {
            write(&path, &bytes, create_parents).await
        });
        async move { handle.await? }
    }

    /// Read and decode a JSON value.
    ///
    /// A missing file and content that does not decode as `T` are both
    /// `Ok(None)`.
    pub fn get<T: DeserializeOwned>(
        &self,
        path: impl AsRef<Path>,
    ) -> impl Future<Output = Result<Option<T>, TinyStoreError>> + Send {
        let shown = path.as_ref().to_path_buf();
        let raw = self.get_raw(path);
        async move {
            let Some(bytes) = raw.await? else {
                return Ok(None);
            };
            match serde_json::from_slice(&bytes) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    debug!(path = %shown.display(), error = %e, "blob content not decodable");
                    Ok(None)
                }
            }
        }
    }

    /// Encode `value` as JSON and write it.
    pub fn put<T: Serialize>(
        &self,
        path: impl AsRef<Path>,
        value: &T,
    ) -> impl Future<Output = Result<(), TinyStoreError>> + Send {
        let submitted = serde_json::to_vec(value)
            .map_err(|e| TinyStoreError::Codec(e.to_string()))
            .map(|bytes| self.put_raw(path, bytes));
        async move { submitted?.await }
    }

    /// Remove the file. Removing a missing file succeeds.
    pub fn delete(
        &self,
        path: impl AsRef<Path>,
    ) -> impl Future<Output = Result<(), TinyStoreError>> + Send {
        let path = self.resolve(path);
        let handle = self.scheduler.enqueue(fence_key(&path), async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(blob_err(&path, e)),
            }
        });
        async move { handle.await? }
    }

    pub fn exists(
        &self,
        path: impl AsRef<Path>,
    ) -> impl Future<Output = Result<bool, TinyStoreError>> + Send {
        let path = self.resolve(path);
        let handle = self.scheduler.enqueue(fence_key(&path), async move {
            tokio::fs::try_exists(&path)
                .await
                .map_err(|e| blob_err(&path, e))
        });
        async move { handle.await? }
    }
}

fn fence_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn blob_err(path: &Path, source: std::io::Error) -> TinyStoreError {
    TinyStoreError::Blob {
        path: path.display().to_string(),
        source,
    }
}

async fn read(path: &Path) -> Result<Option<Vec<u8>>, TinyStoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(blob_err(path, e)),
    }
}

/// Write through a sibling temporary file and rename over the target.
async fn write(path: &Path, bytes: &[u8], create_parents: bool) -> Result<(), TinyStoreError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| TinyStoreError::InvalidInput(format!("{} is not a file path", path.display())))?;

    if create_parents {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| blob_err(parent, e))?;
        }
    }

    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| blob_err(&tmp, e))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(blob_err(path, e));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "blob written");
    Ok(())
}
