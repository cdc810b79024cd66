use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::errors::FlowError;

/// Re-entrancy guard: at most one attempt in flight per flow instance. A
/// second start while one is pending is refused, not queued.
#[derive(Clone, Debug, Default)]
pub(crate) struct PendingFlow {
    busy: Arc<AtomicBool>,
}

impl PendingFlow {
    pub(crate) fn acquire(&self) -> Result<PendingGuard, FlowError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FlowError::AttemptInProgress);
        }
        Ok(PendingGuard {
            busy: self.busy.clone(),
        })
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Clears the pending flag on drop, whatever the exit path was.
#[derive(Debug)]
pub(crate) struct PendingGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused_while_pending() {
        let pending = PendingFlow::default();

        let guard = pending.acquire().expect("first acquire");
        assert!(pending.is_pending());
        assert_eq!(pending.acquire().unwrap_err(), FlowError::AttemptInProgress);

        drop(guard);
        assert!(!pending.is_pending());
    }

    #[test]
    fn test_guard_release_allows_new_attempt() {
        let pending = PendingFlow::default();
        drop(pending.acquire().expect("first acquire"));
        pending.acquire().expect("second acquire after release");
    }

    #[test]
    fn test_guard_releases_on_early_return() {
        fn failing_attempt(pending: &PendingFlow) -> Result<(), FlowError> {
            let _guard = pending.acquire()?;
            Err(FlowError::Validation("bad input".to_string()))
        }

        let pending = PendingFlow::default();
        assert!(failing_attempt(&pending).is_err());
        assert!(!pending.is_pending());
    }
}
