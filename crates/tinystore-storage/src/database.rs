// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle ownership: the single-writer resource serializer.
//!
//! A [`Database`] owns exactly one `tokio_rusqlite::Connection`. Every
//! operation on the handle is a closure shipped to tokio-rusqlite's one
//! background thread, so handle operations never run concurrently with each
//! other. Do NOT open additional connections to the same file for writes.
//!
//! Lifecycle: `Unopened` → [`configure`](Database::configure) → `Open` →
//! [`teardown`](Database::teardown) → `Closed`. A closed handle is never
//! reopened; operations on it fail with [`TinyStoreError::NotOpen`].
//!
//! Every operation takes an in-flight permit at the moment it is issued and
//! holds it until its result is delivered. Teardown waits for all permits
//! before closing the worker.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tinystore_config::StorageConfig;
use tinystore_core::{HealthStatus, TinyStoreError};
use tokio::runtime::Handle;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};
use tokio_rusqlite::Connection;
use tracing::{debug, info};

/// Map a tokio-rusqlite error into a [`TinyStoreError`].
///
/// A closed connection means the handle is gone, not that a statement failed.
/// `Connection::open` reports a plain `rusqlite::Error` and is mapped with
/// [`TinyStoreError::storage`] instead.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TinyStoreError {
    match e {
        tokio_rusqlite::Error::ConnectionClosed => TinyStoreError::NotOpen,
        other => TinyStoreError::storage(other),
    }
}

/// Where a completion callback runs.
///
/// Wraps a tokio runtime handle so the worker thread never runs caller code.
#[derive(Debug, Clone)]
pub struct CompletionContext(Handle);

impl CompletionContext {
    /// The runtime the calling task is running on.
    pub fn current() -> Result<Self, TinyStoreError> {
        Handle::try_current()
            .map(Self)
            .map_err(|e| TinyStoreError::Internal(format!("no tokio runtime: {e}")))
    }

    pub fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> &Handle {
        &self.0
    }
}

enum HandleState {
    Unopened,
    Opening,
    Open(Connection),
    Closed,
}

/// Admission to the worker: a connection sender plus the in-flight permit.
type Admitted = (Connection, OwnedRwLockReadGuard<()>);

/// Single owner of the engine handle.
pub struct Database {
    config: StorageConfig,
    state: Mutex<HandleState>,
    in_flight: Arc<RwLock<()>>,
    /// Default context for [`Database::execute_with`], captured at construction.
    completion: Option<CompletionContext>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.config.database_path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Database {
    /// Create an unopened handle. Nothing touches disk until [`configure`](Self::configure).
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            state: Mutex::new(HandleState::Unopened),
            in_flight: Arc::new(RwLock::new(())),
            completion: CompletionContext::current().ok(),
        }
    }

    /// Create and configure a handle at `path` with default settings.
    pub async fn open(path: &str) -> Result<Self, TinyStoreError> {
        let db = Self::new(StorageConfig::at(path));
        db.configure().await?;
        Ok(db)
    }

    /// Path of the database file.
    pub fn path(&self) -> &str {
        &self.config.database_path
    }

    /// Open the handle exactly once.
    ///
    /// Fails with [`TinyStoreError::AlreadyOpen`] if the handle was opened
    /// before (including after teardown), or with a storage error if the
    /// engine refuses to open. After an engine failure the handle stays
    /// unopened.
    pub async fn configure(&self) -> Result<(), TinyStoreError> {
        {
            let mut state = self.lock_state()?;
            match *state {
                HandleState::Unopened => *state = HandleState::Opening,
                _ => return Err(TinyStoreError::AlreadyOpen),
            }
        }

        match self.open_connection().await {
            Ok(conn) => {
                *self.lock_state()? = HandleState::Open(conn);
                info!(path = %self.config.database_path, "database opened");
                Ok(())
            }
            Err(e) => {
                *self.lock_state()? = HandleState::Unopened;
                debug!(path = %self.config.database_path, error = %e, "database open failed");
                Err(e)
            }
        }
    }

    async fn open_connection(&self) -> Result<Connection, TinyStoreError> {
        let path = self.config.database_path.clone();
        if let Some(parent) = Path::new(&path).parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(TinyStoreError::storage)?;
        }

        let conn = Connection::open(&path)
            .await
            .map_err(TinyStoreError::storage)?;

        let busy_timeout = Duration::from_millis(self.config.busy_timeout_ms);
        let wal_mode = self.config.wal_mode;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(busy_timeout)?;
            if wal_mode {
                let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get(0)
                })?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        Ok(conn)
    }

    /// Whether the handle is currently open.
    pub fn is_open(&self) -> bool {
        self.state
            .lock()
            .map(|state| matches!(*state, HandleState::Open(_)))
            .unwrap_or(false)
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, HandleState>, TinyStoreError> {
        self.state
            .lock()
            .map_err(|e| TinyStoreError::Internal(format!("failed to lock database state: {e}")))
    }

    /// Admit one operation. Fails unless the handle is open.
    ///
    /// The permit is taken under the state lock, so teardown either sees it
    /// or the caller sees `Closed`.
    fn admit(&self) -> Result<Admitted, TinyStoreError> {
        match &*self.lock_state()? {
            HandleState::Open(conn) => {
                let permit = Arc::clone(&self.in_flight)
                    .try_read_owned()
                    .map_err(|_| TinyStoreError::NotOpen)?;
                Ok((conn.clone(), permit))
            }
            _ => Err(TinyStoreError::NotOpen),
        }
    }

    /// Run `op` against the engine handle on the single worker thread.
    ///
    /// The operation is admitted when this is called, not when the returned
    /// future is first polled, so a teardown issued afterwards waits for it.
    /// Failures are captured here and returned to this caller only; the
    /// worker keeps serving later operations.
    pub fn execute<F, R>(
        &self,
        op: F,
    ) -> impl Future<Output = Result<R, TinyStoreError>> + Send + use<F, R>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, rusqlite::Error> + Send + 'static,
        R: Send + 'static,
    {
        let admitted = self.admit();
        async move {
            let (conn, _permit) = admitted?;
            run_on(conn, op).await
        }
    }

    /// Run `op` on the worker and deliver its result to `on_done` on the given
    /// completion context, or on the context captured at construction.
    ///
    /// Returns an error only when no completion context is available at all.
    pub fn execute_with<F, R, C>(
        &self,
        op: F,
        context: Option<&CompletionContext>,
        on_done: C,
    ) -> Result<(), TinyStoreError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, rusqlite::Error> + Send + 'static,
        R: Send + 'static,
        C: FnOnce(Result<R, TinyStoreError>) + Send + 'static,
    {
        let context = match context.or(self.completion.as_ref()) {
            Some(context) => context.clone(),
            None => CompletionContext::current()?,
        };
        let work = self.execute(op);
        context.handle().spawn(async move {
            on_done(work.await);
        });
        Ok(())
    }

    /// Drain the worker and release the handle.
    ///
    /// Resolves once every operation issued before the call has finished.
    /// Later operations fail with [`TinyStoreError::NotOpen`]. A future from
    /// [`execute`](Self::execute) that is held but never polled keeps
    /// teardown waiting until it is awaited or dropped.
    pub async fn teardown(&self) -> Result<(), TinyStoreError> {
        let conn = {
            let mut state = self.lock_state()?;
            match std::mem::replace(&mut *state, HandleState::Closed) {
                HandleState::Open(conn) => conn,
                previous => {
                    *state = previous;
                    return Err(TinyStoreError::NotOpen);
                }
            }
        };

        let _drained = self.in_flight.write().await;
        conn.close().await.map_err(map_tr_err)?;
        info!(path = %self.config.database_path, "database closed");
        Ok(())
    }

    /// Check the handle with a trivial statement.
    pub async fn health_check(&self) -> HealthStatus {
        let (conn, _permit) = match self.admit() {
            Ok(admitted) => admitted,
            Err(e) => return HealthStatus::Unhealthy(e.to_string()),
        };
        let checked = run_on(conn, |conn| conn.execute_batch("SELECT 1;")).await;
        match checked {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Degraded(e.to_string()),
        }
    }
}

async fn run_on<F, R>(conn: Connection, op: F) -> Result<R, TinyStoreError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, rusqlite::Error> + Send + 'static,
    R: Send + 'static,
{
    conn.call(op).await.map_err(|e| {
        let e = map_tr_err(e);
        debug!(error = %e, "database operation failed");
        e
    })
}
