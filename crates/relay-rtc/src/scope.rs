//! Cancellation scopes
//!
//! A [`LifetimeScope`] is a node in an explicit cancellation tree. Each child
//! registers itself as a listener on its parent, so cancelling a scope
//! cancels every descendant, while a child can still be cancelled on its own
//! without touching the parent or its siblings.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::Notify;

#[derive(Clone)]
pub struct LifetimeScope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    cancelled: AtomicBool,
    notify: Notify,
    /// Children listening for our cancellation. Weak so dropped children
    /// don't keep their state alive.
    children: Mutex<Vec<Weak<ScopeInner>>>,
}

impl ScopeInner {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            notify: Notify::new(),
            children: Mutex::new(Vec::new()),
        }
    }

    fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.notify.notify_waiters();

        let children = std::mem::take(
            &mut *self.children.lock().unwrap_or_else(|e| e.into_inner()),
        );
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }

        true
    }
}

impl LifetimeScope {
    /// Create a scope with no parent
    pub fn root() -> Self {
        Self {
            inner: Arc::new(ScopeInner::new()),
        }
    }

    /// Derive a child scope bounded by this one
    pub fn child(&self) -> Self {
        let child = Arc::new(ScopeInner::new());

        {
            let mut children = self.inner.children.lock().unwrap_or_else(|e| e.into_inner());
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&child));

            // Checked under the lock: a concurrent cancel either drains us
            // from the list or has already set the flag.
            if self.inner.cancelled.load(Ordering::Acquire) {
                child.cancel();
            }
        }

        Self { inner: child }
    }

    /// Cancel this scope and all of its descendants.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn cancel(&self) -> bool {
        self.inner.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Wait until the scope is cancelled
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for LifetimeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifetimeScope")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
