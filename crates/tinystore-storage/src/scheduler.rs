// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-fenced task admission.
//!
//! [`TaskScheduler`] runs submitted futures on a multi-worker tokio runtime
//! while keeping FIFO order among tasks that share a fencing key. Each key maps
//! to the completion signal of its most recently submitted task; a new
//! submission awaits that signal and then installs its own, so admission is
//! O(1) regardless of how much work is pending. Tasks under different keys
//! have no ordering relative to each other.
//!
//! There is no priority, cancellation, or timeout. A failed or panicked task
//! still releases its fence, so later tasks on the same key are unaffected.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::future::{FutureExt, Shared};
use tinystore_core::TinyStoreError;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::trace;

type Signal = Shared<oneshot::Receiver<()>>;

struct Fence {
    seq: u64,
    done: Signal,
}

type FenceMap = Arc<Mutex<HashMap<String, Fence>>>;

/// Admits keyed units of work, FIFO per key.
///
/// Construct one per key-space and share it (behind an `Arc`) with every
/// store that should be ordered against the others.
pub struct TaskScheduler {
    runtime: Handle,
    fences: FenceMap,
    next_seq: AtomicU64,
}

impl std::fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("pending_keys", &self.pending_keys())
            .finish()
    }
}

impl TaskScheduler {
    /// A scheduler that spawns onto the current tokio runtime.
    pub fn new() -> Result<Self, TinyStoreError> {
        let runtime = Handle::try_current()
            .map_err(|e| TinyStoreError::Internal(format!("no tokio runtime: {e}")))?;
        Ok(Self::with_runtime(runtime))
    }

    /// A scheduler that spawns onto the given runtime.
    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            runtime,
            fences: Arc::new(Mutex::new(HashMap::new())),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Submit `work` under `key` and get a handle to its output.
    ///
    /// Outputs of same-key tasks become available in submission order.
    pub fn enqueue<F, T>(&self, key: impl Into<String>, work: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.enqueue_with(key, work, move |output| {
            // The caller may have dropped the handle; the work still ran.
            let _ = tx.send(output);
        });
        TaskHandle { rx }
    }

    /// Submit `work` under `key`; `on_done` receives its output.
    ///
    /// `on_done` runs before the next same-key task is released, so callbacks
    /// for one key fire strictly in submission order.
    pub fn enqueue_with<F, T, C>(&self, key: impl Into<String>, work: F, on_done: C)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let key = key.into();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = oneshot::channel();

        let previous = {
            let mut fences = lock_fences(&self.fences);
            fences
                .insert(
                    key.clone(),
                    Fence {
                        seq,
                        done: done_rx.shared(),
                    },
                )
                .map(|fence| fence.done)
        };
        trace!(key = %key, seq, chained = previous.is_some(), "task admitted");

        let guard = FenceGuard {
            key,
            seq,
            fences: Arc::clone(&self.fences),
            done: Some(done_tx),
        };

        self.runtime.spawn(async move {
            if let Some(previous) = previous {
                // A dropped sender (panicked predecessor) also releases us.
                let _ = previous.await;
            }
            let output = work.await;
            on_done(output);
            drop(guard);
        });
    }

    /// Number of keys with admitted work that has not yet finished.
    pub fn pending_keys(&self) -> usize {
        lock_fences(&self.fences).len()
    }
}

fn lock_fences(
    fences: &Mutex<HashMap<String, Fence>>,
) -> std::sync::MutexGuard<'_, HashMap<String, Fence>> {
    // The map holds no invariant a panicking holder could break mid-update.
    fences.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Releases a task's fence when the task finishes or unwinds.
struct FenceGuard {
    key: String,
    seq: u64,
    fences: FenceMap,
    done: Option<oneshot::Sender<()>>,
}

impl Drop for FenceGuard {
    fn drop(&mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
        let mut fences = lock_fences(&self.fences);
        if fences.get(&self.key).is_some_and(|fence| fence.seq == self.seq) {
            fences.remove(&self.key);
        }
    }
}

/// Output of a task submitted with [`TaskScheduler::enqueue`].
///
/// Resolves to [`TinyStoreError::Internal`] if the task was dropped before
/// producing output (runtime shutdown, panic).
#[must_use = "a TaskHandle does nothing unless awaited; the task itself runs regardless"]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TinyStoreError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|result| {
            result.map_err(|_| TinyStoreError::Internal("task dropped before completion".into()))
        })
    }
}
