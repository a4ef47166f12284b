//! Change-tracking primitives the binding layer publishes render state
//! through.
//!
//! [`Signal<T>`] is a shared, version-tracked value wrapper with change
//! notification via subscriber callbacks; [`Subscription`] is the RAII
//! guard that removes a callback on drop.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version
//!    bump, no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//!
//! # Architecture
//!
//! `Signal<T>` uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Subscribers are stored as `Weak` function pointers and
//! cleaned up lazily during notification; the `Subscription` guard holds
//! the only strong reference to the callback.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

struct SignalInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<dyn Fn(&T)>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning a `Signal` creates a new handle to the **same** inner state.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Create a signal holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Access the current value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Monotonic version; bumped once per value-changing mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Subscribe to changes. The callback fires after each
    /// value-changing [`set()`](Self::set), in registration order, and
    /// stays live until the returned guard is dropped.
    #[must_use]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<dyn Fn(&T)> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _keep: Box::new(strong),
        }
    }

    fn notify(&self) {
        // Snapshot live callbacks first so a subscriber may drop its own
        // Subscription (or register new ones) without a re-entrant borrow.
        let callbacks: Vec<Rc<dyn Fn(&T)>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect()
        };
        for callback in callbacks {
            self.with(|value| callback(value));
        }
    }
}

impl<T: PartialEq + 'static> Signal<T> {
    /// Replace the value. Equal values are a no-op: no version bump, no
    /// notifications.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
            trace!(
                version = inner.version,
                subscribers = inner.subscribers.len(),
                "signal value changed"
            );
        }
        self.notify();
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }
}

/// RAII guard for a [`Signal`] subscription. Dropping it removes the
/// callback before the next notification cycle.
pub struct Subscription {
    _keep: Box<dyn Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
