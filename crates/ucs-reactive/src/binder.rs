#![forbid(unsafe_code)]

//! Declarative reactions with listener-scoped lifetimes.
//!
//! A listener type implements [`ReactiveListener`]: it owns a
//! [`ReactionSlot`] and, in [`declare_reactions`](ReactiveListener::declare_reactions),
//! maps each of its handler methods to an explicit dependency set through a
//! [`ReactionBinder`]. [`bind`] wraps the listener in an `Rc`, runs the
//! declaration once and stores the resulting [`Reactions`] in the slot.
//!
//! # Architecture
//!
//! Each reaction becomes one aggregated handler. When any field of its set
//! changes, the handler reads the **current** value of every field in the set
//! and calls the method with them. The handler captures a `Weak` to the
//! listener, so fields never keep a listener alive. The subscriptions live in
//! the listener's own slot, so dropping the last `Rc` to the listener drops
//! every subscription it installed.
//!
//! ```text
//!   field ──on_changed──► handler ──Weak──► listener
//!     ▲                                        │
//!     └──────── Subscription (RAII) ◄── slot ──┘
//! ```
//!
//! # Invariants
//!
//! 1. One binding per (listener instance, reaction name); a second
//!    declaration of the same name fails with [`ReactiveError::DuplicateReaction`].
//! 2. A binding is subscribed to every distinct field of its set and to no
//!    other. Listing the same field twice in one set subscribes once.
//! 3. Binding does not call any handler; the first call happens on the first
//!    change after binding.
//! 4. Once the listener is dropped, none of its subscriptions remain on any
//!    field, and each was removed exactly once.
//!
//! # Failure Modes
//!
//! - A handler that panics unwinds through the `set` (or list mutation) that
//!   triggered it. Handlers are not isolated from each other.
//! - A handler that (transitively) mutates one of its own dependencies
//!   recurses. No cycle detection is performed.

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::channel::Subscription;
use crate::error::{ReactiveError, Result};
use crate::field::ReactiveField;
use crate::list::ReactiveList;

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

/// Something a reaction can depend on.
pub trait Dependency: Clone + 'static {
    /// What a handler receives for this dependency.
    type Value: 'static;

    /// Read the current value.
    fn read(&self) -> Self::Value;

    /// Register `callback` to run on every change.
    fn watch(&self, callback: Rc<dyn Fn()>) -> Subscription;

    /// Name used in logs and introspection.
    fn dependency_name(&self) -> &str;

    /// Identity of the underlying storage. Two handles to the same field
    /// return the same key.
    fn dependency_key(&self) -> usize;
}

impl<T: Clone + PartialEq + 'static> Dependency for ReactiveField<T> {
    type Value = T;

    fn read(&self) -> T {
        self.get()
    }

    fn watch(&self, callback: Rc<dyn Fn()>) -> Subscription {
        self.on_changed().subscribe_scoped(move |_| callback())
    }

    fn dependency_name(&self) -> &str {
        self.name()
    }

    fn dependency_key(&self) -> usize {
        self.identity()
    }
}

impl<T: Clone + 'static> Dependency for ReactiveList<T> {
    type Value = Vec<T>;

    fn read(&self) -> Vec<T> {
        self.get()
    }

    fn watch(&self, callback: Rc<dyn Fn()>) -> Subscription {
        self.on_changed().subscribe_scoped(move |_| callback())
    }

    fn dependency_name(&self) -> &str {
        self.name()
    }

    fn dependency_key(&self) -> usize {
        self.identity()
    }
}

/// Object-safe form of [`Dependency`] for heterogeneous sets.
trait ErasedDependency {
    fn name(&self) -> &str;
    fn key(&self) -> usize;
    fn read_any(&self) -> Box<dyn Any>;
    fn watch(&self, callback: Rc<dyn Fn()>) -> Subscription;
}

impl<D: Dependency> ErasedDependency for D {
    fn name(&self) -> &str {
        self.dependency_name()
    }

    fn key(&self) -> usize {
        self.dependency_key()
    }

    fn read_any(&self) -> Box<dyn Any> {
        Box::new(self.read())
    }

    fn watch(&self, callback: Rc<dyn Fn()>) -> Subscription {
        Dependency::watch(self, callback)
    }
}

/// Ordered mapping from parameter name to dependency.
///
/// Adding a parameter name that is already present replaces its dependency
/// in place.
#[derive(Default)]
pub struct DependencySet {
    entries: Vec<(String, Box<dyn ErasedDependency>)>,
}

impl fmt::Debug for DependencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(param, dep)| (param, dep.name())))
            .finish()
    }
}

impl DependencySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, param: impl Into<String>, dependency: impl Dependency) -> Self {
        self.insert(param, dependency);
        self
    }

    pub fn insert(&mut self, param: impl Into<String>, dependency: impl Dependency) {
        let param = param.into();
        let dependency: Box<dyn ErasedDependency> = Box::new(dependency);
        match self.entries.iter_mut().find(|(p, _)| *p == param) {
            Some(entry) => entry.1 = dependency,
            None => self.entries.push((param, dependency)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameter names in insertion order.
    pub fn params(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    fn read(&self) -> ReactionArgs {
        ReactionArgs {
            values: self
                .entries
                .iter()
                .map(|(param, dep)| (param.clone(), dep.read_any()))
                .collect(),
        }
    }
}

/// Current values of a [`DependencySet`], addressed by parameter name.
pub struct ReactionArgs {
    values: Vec<(String, Box<dyn Any>)>,
}

impl fmt::Debug for ReactionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(|(p, _)| p))
            .finish()
    }
}

impl ReactionArgs {
    /// Borrow the value bound to `param`, if present and of type `T`.
    ///
    /// List dependencies are read as `Vec<T>`.
    #[must_use]
    pub fn get<T: 'static>(&self, param: &str) -> Option<&T> {
        self.values
            .iter()
            .find(|(p, _)| p == param)
            .and_then(|(_, value)| value.downcast_ref::<T>())
    }

    /// Clone of the value bound to `param`.
    #[must_use]
    pub fn value<T: Clone + 'static>(&self, param: &str) -> Option<T> {
        self.get::<T>(param).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Binder
// ---------------------------------------------------------------------------

struct Binding {
    reaction: String,
    fields: Vec<String>,
    subscriptions: Vec<Subscription>,
}

/// Collects the reactions of one listener instance.
pub struct ReactionBinder<L> {
    listener: Weak<L>,
    listener_name: &'static str,
    bindings: Vec<Binding>,
}

impl<L> fmt::Debug for ReactionBinder<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactionBinder")
            .field("listener", &self.listener_name)
            .field("reactions", &self.bindings.len())
            .finish()
    }
}

impl<L: 'static> ReactionBinder<L> {
    /// Start binding reactions for `listener`. Only a `Weak` is kept.
    #[must_use]
    pub fn new(listener: &Rc<L>) -> Self {
        Self {
            listener: Rc::downgrade(listener),
            listener_name: short_type_name::<L>(),
            bindings: Vec::new(),
        }
    }

    /// React to one dependency.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::DuplicateReaction`] if `reaction` is already declared.
    pub fn react1<A: Dependency>(
        &mut self,
        reaction: &str,
        a: &A,
        handler: impl Fn(&L, A::Value) + 'static,
    ) -> Result<()> {
        let listener = self.listener.clone();
        let dep = a.clone();
        let run: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(listener) = listener.upgrade() {
                handler(&listener, dep.read());
            }
        });
        self.install(reaction, &[a as &dyn ErasedDependency], run)
    }

    /// React to two dependencies. Both are read fresh on every call.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::DuplicateReaction`] if `reaction` is already declared.
    pub fn react2<A: Dependency, B: Dependency>(
        &mut self,
        reaction: &str,
        a: &A,
        b: &B,
        handler: impl Fn(&L, A::Value, B::Value) + 'static,
    ) -> Result<()> {
        let listener = self.listener.clone();
        let (da, db) = (a.clone(), b.clone());
        let run: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(listener) = listener.upgrade() {
                handler(&listener, da.read(), db.read());
            }
        });
        self.install(reaction, &[a as &dyn ErasedDependency, b], run)
    }

    /// React to three dependencies.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::DuplicateReaction`] if `reaction` is already declared.
    pub fn react3<A: Dependency, B: Dependency, C: Dependency>(
        &mut self,
        reaction: &str,
        a: &A,
        b: &B,
        c: &C,
        handler: impl Fn(&L, A::Value, B::Value, C::Value) + 'static,
    ) -> Result<()> {
        let listener = self.listener.clone();
        let (da, db, dc) = (a.clone(), b.clone(), c.clone());
        let run: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(listener) = listener.upgrade() {
                handler(&listener, da.read(), db.read(), dc.read());
            }
        });
        self.install(reaction, &[a as &dyn ErasedDependency, b, c], run)
    }

    /// React to a named dependency set; the handler reads values by parameter
    /// name from [`ReactionArgs`].
    ///
    /// # Errors
    ///
    /// [`ReactiveError::DuplicateReaction`] if `reaction` is already declared.
    pub fn react(
        &mut self,
        reaction: &str,
        dependencies: DependencySet,
        handler: impl Fn(&L, &ReactionArgs) + 'static,
    ) -> Result<()> {
        let listener = self.listener.clone();
        let deps = Rc::new(dependencies);
        let read_from = Rc::clone(&deps);
        let run: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(listener) = listener.upgrade() {
                handler(&listener, &read_from.read());
            }
        });
        let erased: SmallVec<[&dyn ErasedDependency; 4]> =
            deps.entries.iter().map(|(_, dep)| dep.as_ref()).collect();
        self.install(reaction, &erased, run)
    }

    fn install(
        &mut self,
        reaction: &str,
        deps: &[&dyn ErasedDependency],
        run: Rc<dyn Fn()>,
    ) -> Result<()> {
        if self.bindings.iter().any(|b| b.reaction == reaction) {
            return Err(ReactiveError::DuplicateReaction {
                listener: self.listener_name,
                reaction: reaction.to_string(),
            });
        }

        let mut seen: SmallVec<[usize; 4]> = SmallVec::new();
        let mut fields = Vec::with_capacity(deps.len());
        let mut subscriptions = Vec::with_capacity(deps.len());
        for dep in deps {
            if seen.contains(&dep.key()) {
                continue;
            }
            seen.push(dep.key());
            fields.push(dep.name().to_string());
            subscriptions.push(dep.watch(Rc::clone(&run)));
        }

        tracing::debug!(
            listener = self.listener_name,
            reaction,
            fields = ?fields,
            "reaction bound"
        );
        self.bindings.push(Binding {
            reaction: reaction.to_string(),
            fields,
            subscriptions,
        });
        Ok(())
    }

    /// Finish binding and hand over the subscriptions.
    #[must_use]
    pub fn finish(self) -> Reactions {
        Reactions {
            listener_name: self.listener_name,
            bindings: self.bindings,
        }
    }
}

fn short_type_name<L>() -> &'static str {
    let full = type_name::<L>();
    full.rsplit("::").next().unwrap_or(full)
}

// ---------------------------------------------------------------------------
// Reactions
// ---------------------------------------------------------------------------

/// The installed reactions of one listener. Dropping this unsubscribes all
/// of them.
pub struct Reactions {
    listener_name: &'static str,
    bindings: Vec<Binding>,
}

impl fmt::Debug for Reactions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactions")
            .field("listener", &self.listener_name)
            .field("reactions", &self.reaction_names().collect::<Vec<_>>())
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

impl Reactions {
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn reaction_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.bindings.iter().map(|b| b.reaction.as_str())
    }

    /// Field names a reaction is subscribed to, in declaration order.
    #[must_use]
    pub fn fields_of(&self, reaction: &str) -> Option<&[String]> {
        self.bindings
            .iter()
            .find(|b| b.reaction == reaction)
            .map(|b| b.fields.as_slice())
    }

    /// Live subscriptions across all reactions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.bindings
            .iter()
            .flat_map(|b| &b.subscriptions)
            .filter(|s| s.is_live())
            .count()
    }

    /// Unsubscribe everything now, reporting the first inconsistency.
    ///
    /// Every subscription is released even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::UnknownSubscriber`] if a subscription was removed
    /// behind the binder's back.
    pub fn dispose(self) -> Result<()> {
        let mut first_err = None;
        for binding in self.bindings {
            for sub in binding.subscriptions {
                if let Err(err) = sub.cancel() {
                    first_err.get_or_insert(err);
                }
            }
        }
        tracing::debug!(listener = self.listener_name, "reactions disposed");
        first_err.map_or(Ok(()), Err)
    }
}

/// Storage for a listener's [`Reactions`].
#[derive(Default)]
pub struct ReactionSlot {
    reactions: RefCell<Option<Reactions>>,
}

impl fmt::Debug for ReactionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactionSlot")
            .field("bound", &self.is_bound())
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

impl ReactionSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `reactions`.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::AlreadyBound`] if the slot already holds reactions.
    pub fn install(&self, reactions: Reactions) -> Result<()> {
        let mut slot = self.reactions.borrow_mut();
        if slot.is_some() {
            return Err(ReactiveError::AlreadyBound {
                listener: reactions.listener_name,
            });
        }
        *slot = Some(reactions);
        Ok(())
    }

    /// Remove the reactions, e.g. to [`dispose`](Reactions::dispose) them explicitly.
    pub fn take(&self) -> Option<Reactions> {
        self.reactions.borrow_mut().take()
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.reactions.borrow().is_some()
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.reactions
            .borrow()
            .as_ref()
            .map_or(0, Reactions::subscription_count)
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A type whose instances react to state changes.
pub trait ReactiveListener: Sized + 'static {
    /// Where the bound reactions are kept.
    fn reaction_slot(&self) -> &ReactionSlot;

    /// Declare each reaction with its dependency set. Called once per instance.
    ///
    /// # Errors
    ///
    /// Propagates binder errors such as a duplicate reaction name.
    fn declare_reactions(&self, binder: &mut ReactionBinder<Self>) -> Result<()>;
}

/// Move `listener` into an `Rc` and bind its reactions.
///
/// # Errors
///
/// Whatever [`ReactiveListener::declare_reactions`] returns.
pub fn bind<L: ReactiveListener>(listener: L) -> Result<Rc<L>> {
    let listener = Rc::new(listener);
    bind_rc(&listener)?;
    Ok(listener)
}

/// Bind the reactions of a listener that is already shared.
///
/// # Errors
///
/// [`ReactiveError::AlreadyBound`] when called twice for one instance, or
/// whatever [`ReactiveListener::declare_reactions`] returns.
pub fn bind_rc<L: ReactiveListener>(listener: &Rc<L>) -> Result<()> {
    if listener.reaction_slot().is_bound() {
        return Err(ReactiveError::AlreadyBound {
            listener: short_type_name::<L>(),
        });
    }
    let mut binder = ReactionBinder::new(listener);
    listener.declare_reactions(&mut binder)?;
    let reactions = binder.finish();
    tracing::debug!(
        listener = reactions.listener_name,
        reactions = reactions.len(),
        subscriptions = reactions.subscription_count(),
        "listener bound"
    );
    listener.reaction_slot().install(reactions)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
