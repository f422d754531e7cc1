//! Single-slot admission for downloads that share one output path.
//!
//! The slot is a fair async mutex: waiters queue in FIFO order and are woken
//! when the holder's permit is dropped. Waiting can be bounded by a
//! deadline or abandoned through a cancellation token; once a permit is held
//! it is released on every exit path by `Drop`.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

/// Why a caller did not get the slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    #[error("timed out after {0:?} waiting for the download slot")]
    TimedOut(Duration),
    #[error("cancelled while waiting for the download slot")]
    Cancelled,
}

/// Bounds on a single wait for the slot.
#[derive(Debug, Clone, Default)]
pub struct AcquireOptions {
    /// Give up after this long (None = wait forever).
    pub deadline: Option<Duration>,
    /// Give up when this token is cancelled.
    pub cancel: Option<CancellationToken>,
}

impl AcquireOptions {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Shared single-flight slot. Clones refer to the same slot.
#[derive(Debug, Clone)]
pub struct DownloadSlot {
    lock: Arc<Mutex<()>>,
}

impl Default for DownloadSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadSlot {
    pub fn new() -> Self {
        Self {
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// True while some caller holds the slot.
    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    /// Take the slot if it is free right now.
    pub fn try_acquire(&self) -> Option<SlotPermit> {
        Arc::clone(&self.lock).try_lock_owned().ok().map(SlotPermit::new)
    }

    /// Wait (unbounded) until the slot is free.
    pub async fn acquire(&self) -> SlotPermit {
        SlotPermit::new(Arc::clone(&self.lock).lock_owned().await)
    }

    /// Wait for the slot, honoring the deadline and cancellation token in `opts`.
    pub async fn acquire_with(&self, opts: &AcquireOptions) -> Result<SlotPermit, AcquireError> {
        let cancelled = async {
            match &opts.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match opts.deadline {
                Some(d) => {
                    tokio::time::sleep(d).await;
                    d
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => {
                tracing::debug!("slot wait cancelled");
                Err(AcquireError::Cancelled)
            }
            permit = self.acquire() => Ok(permit),
            waited = expired => {
                tracing::warn!("slot wait timed out after {:?}", waited);
                Err(AcquireError::TimedOut(waited))
            }
        }
    }
}

/// Held slot. Dropping it frees the slot and wakes the next waiter.
#[derive(Debug)]
pub struct SlotPermit {
    _guard: OwnedMutexGuard<()>,
    acquired_at: Instant,
}

impl SlotPermit {
    fn new(guard: OwnedMutexGuard<()>) -> Self {
        tracing::debug!("download slot acquired");
        Self {
            _guard: guard,
            acquired_at: Instant::now(),
        }
    }

    /// When the slot was taken; downloads are timed from here.
    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        tracing::debug!(
            "download slot released after {:?}",
            self.acquired_at.elapsed()
        );
    }
}
