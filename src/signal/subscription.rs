//! Scoped tap subscriptions.
//!
//! A host hands out one [`Subscription`] per attached tap. Disposing it (or
//! dropping it) detaches the listener exactly once, so a torn-down session
//! never leaves handlers behind on shared targets.

use super::types::Tap;
use std::fmt;

type Detach = Box<dyn FnOnce() + Send>;

/// Handle for an attached tap; detaches on dispose or drop.
pub struct Subscription {
    tap: Tap,
    detach: Option<Detach>,
}

impl Subscription {
    /// Create a subscription that runs `detach` when disposed.
    pub fn new(tap: Tap, detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            tap,
            detach: Some(Box::new(detach)),
        }
    }

    pub fn tap(&self) -> Tap {
        self.tap
    }

    /// Whether the detach action is still pending.
    pub fn is_attached(&self) -> bool {
        self.detach.is_some()
    }

    /// Detach the listener. Later calls do nothing.
    pub fn dispose(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("tap", &self.tap)
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_dispose_runs_once() {
        let detached = Arc::new(AtomicUsize::new(0));
        let counter = detached.clone();
        let mut sub = Subscription::new(Tap::Keyboard, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(sub.is_attached());
        sub.dispose();
        sub.dispose();
        drop(sub);

        assert_eq!(detached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_detaches() {
        let detached = Arc::new(AtomicUsize::new(0));
        let counter = detached.clone();
        {
            let _sub = Subscription::new(Tap::Focus, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(detached.load(Ordering::SeqCst), 1);
    }
}
