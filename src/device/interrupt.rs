//! Interrupt token
//!
//! A cloneable flag that cancels a blocked lock wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation signal for device lock waits
///
/// Clones share the same flag, so a handle given to another thread can
/// abort a wait in progress. A raised interrupt stays raised until cleared.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    raised: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every holder of this token
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Reset the flag so later operations may proceed
    pub fn clear(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
