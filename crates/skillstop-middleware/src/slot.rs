//! Latest-value mailbox between a sensor producer and the control thread.
//!
//! The producer overwrites the stored value; it never queues. The control
//! thread calls [`SensorSlot::try_read`], which gives up immediately if the
//! producer holds the lock, so a slow or stuck producer costs the reader one
//! missed sample, never a stalled cycle.
//!
//! # Example
//!
//! ```rust
//! use skillstop_middleware::SensorSlot;
//!
//! let slot = SensorSlot::new();
//! assert_eq!(slot.try_read(), None::<u32>);
//! slot.publish(7);
//! assert_eq!(slot.try_read(), Some(7));
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

/// Shared single-value mailbox. Clones share the same slot.
#[derive(Debug)]
pub struct SensorSlot<T> {
    inner: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for SensorSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SensorSlot<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T: Copy> SensorSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored value. Called from the producer side; may wait
    /// briefly for a reader that is mid-copy.
    pub fn publish(&self, value: T) {
        *self.inner.lock() = Some(value);
    }

    /// Latest value, or `None` if nothing was published yet or the lock is
    /// currently held. Never blocks.
    pub fn try_read(&self) -> Option<T> {
        self.inner.try_lock().and_then(|guard| *guard)
    }

    /// Empty the slot, e.g. between skills.
    pub fn clear(&self) {
        *self.inner.lock() = None;
    }
}
