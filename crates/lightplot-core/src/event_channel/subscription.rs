//! Scoped listener registrations.

use std::fmt;

/// A registration that is released exactly once.
///
/// Dropping the guard (or calling [`Subscription::release`]) runs the
/// release action, which removes the listener from whatever it was added
/// to. Behaviors keep the guards for their in-flight global listeners in the
/// operation state, so finishing, cancelling, or tearing down the operation
/// all release the same listeners.
#[must_use = "dropping a Subscription immediately removes its listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Create a guard that runs `release` when dropped
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard with nothing to release
    pub fn empty() -> Self {
        Self { release: None }
    }

    /// Whether the release action is still pending
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Release now instead of at drop
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Keep the listener registered for the lifetime of its channel
    pub fn forget(mut self) {
        self.release = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_release_runs_once() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let sub = Subscription::new(move || c.set(c.get() + 1));
        assert!(sub.is_active());
        sub.release();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let count = Rc::new(Cell::new(0));
        {
            let c = count.clone();
            let _sub = Subscription::new(move || c.set(c.get() + 1));
        }
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_forget_skips_release() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        Subscription::new(move || c.set(c.get() + 1)).forget();
        assert_eq!(count.get(), 0);
        assert!(!Subscription::empty().is_active());
    }
}
