//! Cancellation context passed through to lifecycle hooks.
//!
//! The engine only carries the context; hooks decide whether to check it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable cancellation flag.
///
/// Clones observe the same state, and the flag may be tripped from another
/// thread (for example a signal handler) while a hook is running.
#[derive(Debug, Default, Clone)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
