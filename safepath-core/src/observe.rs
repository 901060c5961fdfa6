//! Synchronous subscriber registry.
//!
//! Callbacks run on the notifying task, in subscription order. A callback
//! that panics is caught and logged; the remaining subscribers still run and
//! the notifying operation carries on.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Boxed subscriber callback.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SubscriberId(u64);

struct Registry<T> {
    next_id: u64,
    callbacks: Vec<(SubscriberId, Callback<T>)>,
}

/// A list of callbacks notified on every change to some value `T`.
pub struct Subscribers<T> {
    registry: Arc<Mutex<Registry<T>>>,
    label: &'static str,
}

impl<T: 'static> std::fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("label", &self.label)
            .field("count", &self.len())
            .finish()
    }
}

impl<T: 'static> Subscribers<T> {
    /// Create an empty registry; `label` names it in log output.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                callbacks: Vec::new(),
            })),
            label,
        }
    }

    /// Register `callback`.
    ///
    /// The callback stays registered until [`Subscription::unsubscribe`] is
    /// called; dropping the handle does not remove it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriberId(registry.next_id);
        registry.next_id += 1;
        registry.callbacks.push((id, Arc::new(callback)));
        drop(registry);

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    registry
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .callbacks
                        .retain(|(existing, _)| *existing != id);
                }
            })),
        }
    }

    /// Invoke every callback with `value`.
    ///
    /// The registry lock is released before callbacks run, so a callback may
    /// subscribe or unsubscribe without deadlocking.
    pub fn notify(&self, value: &T) {
        let callbacks: Vec<(SubscriberId, Callback<T>)> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .clone();
        for (id, callback) in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                log::error!(
                    "{} subscriber {} panicked; continuing with remaining subscribers",
                    self.label,
                    id.0
                );
            }
        }
    }

    /// Remove every callback.
    pub fn clear(&self) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .clear();
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .len()
    }

    /// Report whether nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`Subscribers::subscribe`].
#[must_use = "keep the subscription to be able to unsubscribe later"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

impl Subscription {
    /// Stop receiving notifications. Safe to call after the registry is gone.
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}
