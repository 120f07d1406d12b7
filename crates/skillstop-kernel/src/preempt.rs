//! [`PreemptFlag`] – cross-thread skill cancellation.
//!
//! A supervisor, operator console or signal handler holds one clone and
//! calls [`PreemptFlag::request`]; the control thread holds another and
//! reads it once per cycle. Both sides are a single atomic operation, so the
//! control thread never waits on a lock.
//!
//! # Example
//!
//! ```rust
//! use skillstop_kernel::PreemptFlag;
//!
//! let flag = PreemptFlag::new();
//! let supervisor = flag.clone();
//! assert!(!flag.is_requested());
//!
//! std::thread::spawn(move || supervisor.request()).join().unwrap();
//! assert!(flag.is_requested());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared, clonable preemption request.
#[derive(Debug, Clone, Default)]
pub struct PreemptFlag(Arc<AtomicBool>);

impl PreemptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the running skill to stop. Idempotent.
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Lower the flag before the next skill starts. Handlers that already
    /// latched a preemption stay terminated.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = PreemptFlag::new();
        let b = a.clone();
        b.request();
        assert!(a.is_requested());
        a.clear();
        assert!(!b.is_requested());
    }

    #[test]
    fn request_is_idempotent() {
        let flag = PreemptFlag::new();
        flag.request();
        flag.request();
        assert!(flag.is_requested());
    }
}
