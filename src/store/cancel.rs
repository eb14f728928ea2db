//! Cooperative cancellation for in-flight store queries.
//!
//! A `CancelSource` hands out generation-numbered tokens. Issuing a new
//! token supersedes every earlier one, so the holder of a stale token can
//! detect that its result must be discarded. Cancellation is cooperative:
//! an in-flight call may still complete, its result is simply dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Issues cancellation tokens, one per fetch. Owned by a single controller.
#[derive(Debug, Default)]
pub struct CancelSource {
    counter: Arc<AtomicU64>,
}

impl CancelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token. Every previously issued token becomes cancelled.
    pub fn issue(&self) -> CancelToken {
        let generation = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        CancelToken {
            generation,
            current: Arc::clone(&self.counter),
        }
    }

    /// Cancel all outstanding tokens without issuing a new one.
    pub fn cancel_all(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// A token checked before applying a query result.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl CancelToken {
    /// Whether a later token has been issued since this one.
    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.generation
    }

    /// A token that is never cancelled, for callers outside a controller.
    pub fn never() -> Self {
        Self {
            generation: 0,
            current: Arc::new(AtomicU64::new(0)),
        }
    }
}
