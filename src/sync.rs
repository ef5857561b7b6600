//! Predicate-guarded state shared between the owning thread and workers.
//!
//! [`Gate`] bundles a mutex, the state it protects, and a condition variable.
//! Writers mutate the state under the lock and notify; waiters block until a
//! predicate over the state holds. Both the worker mailbox and the completion
//! barrier are built on it.

use parking_lot::{Condvar, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct Gate<T> {
    state: Mutex<T>,
    cond: Condvar,
}

impl<T> Gate<T> {
    pub fn new(state: T) -> Self {
        Gate {
            state: Mutex::new(state),
            cond: Condvar::new(),
        }
    }

    /// Mutates the state under the lock, then wakes every waiter.
    ///
    /// The notification is issued after the lock is released and is never
    /// skipped, so a waiter cannot miss an update.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut *self.state.lock());
        self.cond.notify_all();
        result
    }

    /// Mutates the state under the lock and wakes one waiter only if `f`
    /// returns true.
    pub fn update_and_notify_if(&self, f: impl FnOnce(&mut T) -> bool) {
        let notify = f(&mut *self.state.lock());
        if notify {
            self.cond.notify_one();
        }
    }

    /// Mutates the state under the lock without waking anyone.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut *self.state.lock())
    }

    /// Blocks until `ready` holds, then runs `f` on the state while still
    /// holding the lock.
    pub fn wait_until<R>(
        &self,
        mut ready: impl FnMut(&T) -> bool,
        f: impl FnOnce(&mut T) -> R,
    ) -> R {
        let mut guard = self.state.lock();
        self.cond.wait_while(&mut guard, |state| !ready(&*state));
        f(&mut *guard)
    }

    /// Like [`wait_until`](Self::wait_until) but gives up after `timeout`,
    /// returning `None` without running `f`.
    pub fn wait_until_for<R>(
        &self,
        mut ready: impl FnMut(&T) -> bool,
        timeout: Duration,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let mut guard = self.state.lock();
        let result = self
            .cond
            .wait_while_for(&mut guard, |state| !ready(&*state), timeout);
        if result.timed_out() && !ready(&*guard) {
            return None;
        }
        Some(f(&mut *guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_wait_until_sees_update_from_other_thread() {
        let gate = Arc::new(Gate::new(0usize));
        let gate_clone = gate.clone();

        let handle = thread::spawn(move || {
            for _ in 0..10 {
                gate_clone.update(|n| *n += 1);
            }
        });

        let seen = gate.wait_until(|n| *n == 10, |n| *n);
        assert_eq!(seen, 10);
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_until_for_times_out() {
        let gate = Gate::new(false);
        let result = gate.wait_until_for(|ready| *ready, Duration::from_millis(20), |_| ());
        assert!(result.is_none());
    }

    #[test]
    fn test_wait_until_for_returns_immediately_when_ready() {
        let gate = Gate::new(3);
        let result = gate.wait_until_for(|n| *n == 3, Duration::from_secs(5), |n| {
            *n = 0;
            7
        });
        assert_eq!(result, Some(7));
        assert_eq!(gate.with(|n| *n), 0);
    }
}
