//! Marker for the span in which one provider's constructor runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared by the instantiation and every lazy accessor created for it.
#[derive(Debug, Clone, Default)]
pub(crate) struct Construction(Arc<AtomicBool>);

impl Construction {
    pub(crate) fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Marks the constructor as running until the guard drops.
    pub(crate) fn start(&self) -> Running {
        self.0.store(true, Ordering::Release);
        Running(self.0.clone())
    }
}

/// Clears the running flag on drop, also when the constructor panics.
pub(crate) struct Running(Arc<AtomicBool>);

impl Drop for Running {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_only_while_guard_lives() {
        let construction = Construction::default();
        assert!(!construction.is_running());
        {
            let _running = construction.start();
            assert!(construction.clone().is_running());
        }
        assert!(!construction.is_running());
    }
}
