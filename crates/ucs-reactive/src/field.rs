#![forbid(unsafe_code)]

//! Scalar reactive fields.
//!
//! A [`ReactiveField<T>`] is a named value with an `on_changed` channel.
//! Subscribers are called with no payload; they re-read the field (and any
//! other field they care about) when they run.
//!
//! # Invariants
//!
//! 1. [`set`](ReactiveField::set) notifies iff the new value differs from the
//!    stored one (`PartialEq`).
//! 2. The new value is stored before any subscriber runs, so a subscriber
//!    always observes it.
//! 3. `version()` increments exactly once per notification.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::channel::{EventChannel, Subscription};

struct FieldInner<T> {
    name: String,
    value: RefCell<T>,
    version: Cell<u64>,
    on_changed: EventChannel<()>,
}

/// A named, observable scalar.
///
/// Cloning a `ReactiveField` creates a new handle to the **same** value.
pub struct ReactiveField<T> {
    inner: Rc<FieldInner<T>>,
}

impl<T> Clone for ReactiveField<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveField")
            .field("name", &self.inner.name)
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("subscribers", &self.inner.on_changed.subscriber_count())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReactiveField<T> {
    /// Create a field holding `value`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: T) -> Self {
        let name = name.into();
        Self {
            inner: Rc::new(FieldInner {
                on_changed: EventChannel::new(name.clone()),
                name,
                value: RefCell::new(value),
                version: Cell::new(0),
            }),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value.
    ///
    /// # Panics
    ///
    /// Panics if `f` sets this same field (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store `value` and notify subscribers if it differs from the current one.
    ///
    /// Returns whether the value changed. Subscribers run synchronously before
    /// this call returns.
    pub fn set(&self, value: T) -> bool {
        let changed = {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        };
        if changed {
            self.notify();
        }
        changed
    }

    /// Compute a new value from the current one and [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = f(&self.inner.value.borrow());
        self.set(next)
    }

    fn notify(&self) {
        self.inner.version.set(self.inner.version.get() + 1);
        tracing::trace!(field = %self.inner.name, version = self.inner.version.get(), "field changed");
        self.inner.on_changed.invoke(&());
    }
}

impl<T> ReactiveField<T> {
    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The change channel. Subscribers receive `&()`.
    #[must_use]
    pub fn on_changed(&self) -> &EventChannel<()> {
        &self.inner.on_changed
    }

    /// Subscribe a payload-less callback, returning an RAII guard.
    #[must_use = "dropping the Subscription immediately unsubscribes"]
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner.on_changed.subscribe_scoped(move |_| callback())
    }

    /// Number of subscribers on the change channel.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.on_changed.subscriber_count()
    }

    /// Number of notifications sent so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Whether two handles point at the same field.
    #[must_use]
    pub fn same_field(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn identity(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}
