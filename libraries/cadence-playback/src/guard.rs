//! Single-flight transition guard

use std::sync::atomic::{AtomicBool, Ordering};

/// Marks a transition as in flight for as long as it is alive
///
/// Acquisition never waits: if a transition already holds the flag the
/// caller gets `None` and the request is dropped. The flag is cleared on
/// drop, so every exit path (early return, error, panic unwind) releases it.
#[derive(Debug)]
pub(crate) struct TransitionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TransitionGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let flag = AtomicBool::new(false);

        let guard = TransitionGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(TransitionGuard::acquire(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(TransitionGuard::acquire(&flag).is_some());
    }

    #[test]
    fn released_on_early_return() {
        fn attempt(flag: &AtomicBool, fail: bool) -> Result<(), ()> {
            let _guard = TransitionGuard::acquire(flag).ok_or(())?;
            if fail {
                return Err(());
            }
            Ok(())
        }

        let flag = AtomicBool::new(false);
        assert!(attempt(&flag, true).is_err());
        assert!(attempt(&flag, false).is_ok());
        assert!(!flag.load(Ordering::Acquire));
    }
}
