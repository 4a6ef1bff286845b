use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::foundation::core::FrameIndex;

/// Receiver of per-frame checksums.
///
/// Ordering contract: within one activation `report` is called in strictly increasing
/// `FrameIndex` order, all with the same checksum.
pub trait CrcSink: Send + Sync {
    /// Record the checksum of the frame shown at refresh `frame`.
    fn report(&self, frame: FrameIndex, crc: u32);
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryCrcSink {
    entries: Mutex<Vec<(FrameIndex, u32)>>,
}

impl InMemoryCrcSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every entry reported so far, in report order.
    pub fn entries(&self) -> Vec<(FrameIndex, u32)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CrcSink for InMemoryCrcSink {
    fn report(&self, frame: FrameIndex, crc: u32) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((frame, crc));
    }
}

/// Activation reference count of the refresh interrupt source.
///
/// Every `get` is balanced by exactly one `put`; ticks only arrive while the count is non-zero.
pub trait RefreshSource: Send + Sync {
    /// Take a reference, enabling refresh ticks.
    fn get(&self);
    /// Drop a reference taken by `get`.
    fn put(&self);
}

/// Refresh source that only counts references; ticks are delivered by the caller.
#[derive(Debug, Default)]
pub struct CountingRefresh {
    refs: AtomicUsize,
}

impl CountingRefresh {
    /// Create a source with no references.
    pub fn new() -> Self {
        Self::default()
    }

    /// References currently held.
    pub fn refs(&self) -> usize {
        self.refs.load(Ordering::SeqCst)
    }
}

impl RefreshSource for CountingRefresh {
    fn get(&self) {
        self.refs.fetch_add(1, Ordering::SeqCst);
    }

    fn put(&self) {
        let prev = self
            .refs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if prev.is_err() {
            tracing::warn!("refresh reference released more often than taken");
        }
    }
}
