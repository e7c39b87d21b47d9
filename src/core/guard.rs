//! # ConnectionGuard: the one mutable resource shared by all activities.
//!
//! The current connection sits in an [`ArcSwapOption`] so readers (`send`/`receive`
//! callers) grab an `Arc` snapshot without waiting. Every writer (install after a
//! dial, release at shutdown) must hold the guard's async mutex, which also makes
//! the reconnect routine a critical section: at most one runs at a time.
//!
//! ```text
//! reconnect::acquire ──► lock() ──► dial loop ──► install(&held, conn)
//! cleanup            ──► release_once()   (lock, mark closed, take)
//! readers            ──► current()        (no lock, may be None)
//! ```
//!
//! ## Rules
//! - A snapshot from `current()` is stable for one call; callers re-read before the next.
//! - `release_once` hands out the connection at most once; after it, `install` is refused.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwapOption;
use tokio::sync::{Mutex, MutexGuard};

pub(crate) struct ConnectionGuard<C> {
    lock: Mutex<()>,
    current: ArcSwapOption<C>,
    released: AtomicBool,
}

impl<C> ConnectionGuard<C> {
    pub(crate) fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            current: ArcSwapOption::empty(),
            released: AtomicBool::new(false),
        }
    }

    /// Enters the critical section; waits while another holder is inside.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    pub(crate) fn current(&self) -> Option<Arc<C>> {
        self.current.load_full()
    }

    pub(crate) fn is_current(&self, conn: &Arc<C>) -> bool {
        self.current
            .load()
            .as_ref()
            .is_some_and(|cur| Arc::ptr_eq(cur, conn))
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Replaces the current connection. The caller proves it holds the lock.
    ///
    /// Returns `false` (and drops `conn`) once the guard has been released.
    pub(crate) fn install(&self, _held: &MutexGuard<'_, ()>, conn: Arc<C>) -> bool {
        if self.is_released() {
            return false;
        }
        self.current.store(Some(conn));
        true
    }

    /// Takes the connection for the final close. Only the first call gets it.
    pub(crate) async fn release_once(&self) -> Option<Arc<C>> {
        let _held = self.lock.lock().await;
        if self.released.swap(true, Ordering::AcqRel) {
            return None;
        }
        self.current.swap(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_release_hands_out_connection_once() {
        let guard = ConnectionGuard::<u32>::new();
        {
            let held = guard.lock().await;
            assert!(guard.install(&held, Arc::new(7)));
        }
        assert_eq!(guard.current().as_deref(), Some(&7));

        assert_eq!(guard.release_once().await.as_deref(), Some(&7));
        assert!(guard.release_once().await.is_none());
        assert!(guard.current().is_none());

        let held = guard.lock().await;
        assert!(!guard.install(&held, Arc::new(8)));
        assert!(guard.current().is_none());
    }

    #[tokio::test]
    async fn test_is_current_compares_identity() {
        let guard = ConnectionGuard::<u32>::new();
        let first = Arc::new(1);
        let second = Arc::new(1);
        let held = guard.lock().await;
        guard.install(&held, first.clone());
        assert!(guard.is_current(&first));
        assert!(!guard.is_current(&second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_is_exclusive() {
        let guard = Arc::new(ConnectionGuard::<u32>::new());
        let held = guard.lock().await;

        let other = Arc::clone(&guard);
        let waiter = tokio::spawn(async move {
            let _held = other.lock().await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap();
    }
}
