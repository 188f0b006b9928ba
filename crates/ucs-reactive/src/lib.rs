#![forbid(unsafe_code)]

//! Reactive world state for the UCS simulation core.
//!
//! This crate provides the change-propagation layer that lets decoupled
//! observers react to game-state changes:
//!
//! - [`EventChannel`]: ordered subscriber list with synchronous fan-out.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`ReactiveField`]: a named scalar that notifies when its value changes.
//! - [`ReactiveList`]: a named list that notifies on every mutation.
//! - [`StateDeclaration`] / [`StateStore`]: an explicitly constructed set of
//!   named fields addressed by typed keys.
//! - [`ReactionBinder`]: binds listener methods to dependency sets and ties
//!   the subscriptions to the listener's lifetime.
//!
//! # Architecture
//!
//! Everything here is single-threaded: shared ownership is `Rc<..>` with
//! interior mutability. Listeners are held by their reactions through `Weak`
//! references only, so a field never keeps a listener alive. The listener owns
//! its [`Reactions`] (inside a [`ReactionSlot`]); when the last strong
//! reference to the listener goes away, the slot is dropped and every
//! subscription it installed is removed from its field.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order, without deduplication.
//! 2. Scalar fields notify iff the stored value changed.
//! 3. List fields notify after every mutating call, even a no-op one.
//! 4. Notification is synchronous and depth-first: a handler that mutates
//!    another field runs that field's subscribers before returning.
//! 5. A listener has exactly one binding per declared reaction, and zero
//!    subscriptions once it has been dropped.
//!
//! # Failure Modes
//!
//! - **Cycles**: a handler that transitively re-triggers its own field
//!   recurses until a fixpoint or stack exhaustion. There is no detection.
//! - **Panicking handler**: unwinds through the `set`/mutation call that
//!   triggered it; subscribers after it in the list are not run.

pub mod binder;
pub mod channel;
pub mod error;
pub mod field;
pub mod list;
pub mod store;

pub use binder::{
    Dependency, DependencySet, ReactionArgs, ReactionBinder, ReactionSlot, Reactions,
    ReactiveListener, bind, bind_rc,
};
pub use channel::{EventChannel, SubscriberId, Subscription};
pub use error::{ReactiveError, Result};
pub use field::ReactiveField;
pub use list::ReactiveList;
pub use store::{FieldId, FieldKey, FieldKind, ListKey, StateDeclaration, StateStore};
