use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// A shared run counter.
///
/// Every holder of a clone sees the same value. A worker remembers the epoch it
/// was started in and keeps going only while that epoch is still current; a
/// call to `advance()` retires every worker started before it.
#[derive(Clone, Debug)]
pub struct Epoch {
    value: Arc<AtomicU64>,
}

impl Default for Epoch {
    fn default() -> Self {
        Self::new()
    }
}

impl Epoch {
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Move to the next epoch and return it.
    pub fn advance(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.current()
    }
}
