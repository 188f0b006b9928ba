#![forbid(unsafe_code)]

//! Ordered subscriber lists with synchronous fan-out.
//!
//! An [`EventChannel<A>`] stores callbacks in registration order and calls
//! each of them with a shared `&A` when [`invoke`](EventChannel::invoke)d.
//!
//! # Invariants
//!
//! 1. Invocation order equals registration order; the same closure registered
//!    twice runs twice.
//! 2. Every registration gets a fresh [`SubscriberId`].
//! 3. `invoke` walks the live list: a subscriber added while an invocation is
//!    in progress runs in that same invocation, after the ones already there.
//! 4. No borrow of the channel is held while a callback runs, so callbacks may
//!    subscribe, unsubscribe or re-invoke the channel.
//!
//! # Failure Modes
//!
//! - Unsubscribing an id that is not registered returns
//!   [`ReactiveError::UnknownSubscriber`].
//! - Removing an earlier subscriber from inside a callback shifts the live
//!   list; the subscriber right after the current one is skipped for that
//!   invocation (the index-walk behaviour of a plain list).

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{ReactiveError, Result};

type Callback<A> = Rc<dyn Fn(&A)>;

/// Handle identifying one registration on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Raw registration number.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ChannelInner<A> {
    label: String,
    next_id: u64,
    subscribers: Vec<(SubscriberId, Callback<A>)>,
}

impl<A> ChannelInner<A> {
    fn remove(&mut self, id: SubscriberId) -> Result<()> {
        match self.subscribers.iter().position(|(sid, _)| *sid == id) {
            Some(index) => {
                self.subscribers.remove(index);
                Ok(())
            }
            None => Err(ReactiveError::UnknownSubscriber {
                channel: self.label.clone(),
                id: id.raw(),
            }),
        }
    }
}

/// Type-erased removal, so a [`Subscription`] does not carry the argument type.
trait Detach {
    fn detach(&self, id: SubscriberId) -> Result<()>;
    fn holds(&self, id: SubscriberId) -> bool;
}

impl<A> Detach for RefCell<ChannelInner<A>> {
    fn detach(&self, id: SubscriberId) -> Result<()> {
        self.borrow_mut().remove(id)
    }

    fn holds(&self, id: SubscriberId) -> bool {
        self.borrow().subscribers.iter().any(|(sid, _)| *sid == id)
    }
}

/// Ordered list of subscriber callbacks.
///
/// Cloning an `EventChannel` creates a new handle to the **same** list.
pub struct EventChannel<A: 'static = ()> {
    inner: Rc<RefCell<ChannelInner<A>>>,
}

impl<A: 'static> Clone for EventChannel<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: 'static> fmt::Debug for EventChannel<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventChannel")
            .field("label", &inner.label)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<A: 'static> Default for EventChannel<A> {
    fn default() -> Self {
        Self::new("anonymous")
    }
}

impl<A: 'static> EventChannel<A> {
    /// Create an empty channel. The label shows up in errors and logs.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ChannelInner {
                label: label.into(),
                next_id: 1,
                subscribers: Vec::new(),
            })),
        }
    }

    /// The label given at construction.
    #[must_use]
    pub fn label(&self) -> String {
        self.inner.borrow().label.clone()
    }

    /// Append a subscriber and return its id.
    ///
    /// The caller is responsible for calling [`unsubscribe`](Self::unsubscribe)
    /// later; use [`subscribe_scoped`](Self::subscribe_scoped) for a guard that
    /// does it automatically.
    pub fn subscribe(&self, callback: impl Fn(&A) + 'static) -> SubscriberId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriberId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Rc::new(callback)));
        id
    }

    /// Append a subscriber and return a guard that removes it when dropped.
    #[must_use = "dropping the Subscription immediately unsubscribes"]
    pub fn subscribe_scoped(&self, callback: impl Fn(&A) + 'static) -> Subscription {
        let id = self.subscribe(callback);
        let weak: Weak<RefCell<ChannelInner<A>>> = Rc::downgrade(&self.inner);
        let channel: Weak<dyn Detach> = weak;
        Subscription {
            id,
            channel: Some(channel),
        }
    }

    /// Remove the registration `id`.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::UnknownSubscriber`] if `id` is not registered here,
    /// e.g. because it was already removed.
    pub fn unsubscribe(&self, id: SubscriberId) -> Result<()> {
        self.inner.borrow_mut().remove(id)
    }

    /// Call every current subscriber with `args`, in registration order.
    pub fn invoke(&self, args: &A) {
        let mut index = 0;
        loop {
            let callback = {
                let inner = self.inner.borrow();
                match inner.subscribers.get(index) {
                    Some((_, callback)) => Rc::clone(callback),
                    None => break,
                }
            };
            callback(args);
            index += 1;
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Whether `id` is currently registered.
    #[must_use]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.inner.borrow().subscribers.iter().any(|(sid, _)| *sid == id)
    }
}

/// RAII guard for one channel registration.
///
/// Dropping the guard removes the callback. If the channel itself is already
/// gone, dropping is a no-op.
#[must_use = "dropping the Subscription immediately unsubscribes"]
pub struct Subscription {
    id: SubscriberId,
    channel: Option<Weak<dyn Detach>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

impl Subscription {
    /// Id of the registration this guard owns.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether the channel still exists and still holds this registration.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.channel
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|channel| channel.holds(self.id))
    }

    /// Unsubscribe now, reporting a missing registration instead of logging it.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::UnknownSubscriber`] if the registration was removed
    /// behind this guard's back.
    pub fn cancel(mut self) -> Result<()> {
        match self.channel.take().and_then(|weak| weak.upgrade()) {
            Some(channel) => channel.detach(self.id),
            None => Ok(()),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(channel) = self.channel.take().and_then(|weak| weak.upgrade()) else {
            return;
        };
        if let Err(err) = channel.detach(self.id) {
            tracing::error!(subscriber = %self.id, error = %err, "subscription released twice");
            debug_assert!(
                std::thread::panicking(),
                "subscription released twice: {err}"
            );
        }
    }
}
