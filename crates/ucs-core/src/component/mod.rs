#![forbid(unsafe_code)]

//! Component registries and their per-frame systems.
//!
//! A component is a plain value attached to exactly one actor. Each kind
//! lives in its own flat [`Registry`], in attachment order, and is processed
//! by one system function per frame:
//!
//! | kind | system |
//! |------|--------|
//! | [`Collider`] | [`collision::update`] |
//! | [`Walker`] | [`walk::update`] |
//! | [`Mover`] | [`movement::update`] |
//! | [`Sprite`] | [`sprite::update`] |
//!
//! # Invariants
//!
//! 1. Every registration records its owning actor.
//! 2. Detaching an id that is not registered is a [`RegistryError`], never
//!    a silent no-op.
//! 3. After a scene destroys an actor, `owned_by(actor) == 0` in every
//!    registry (checked by the scene).
//! 4. Systems skip components whose owner is inactive or gone.

pub mod collision;
pub mod movement;
pub mod sprite;
pub mod walk;

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::actor::ActorId;
use crate::error::RegistryError;

pub use collision::{Collider, Contact};
pub use movement::Mover;
pub use sprite::Sprite;
pub use walk::{WalkDirection, Walker};

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// A kind of component with its own registry.
pub trait Component: 'static {
    /// Name used in errors and logs.
    const KIND: &'static str;
}

/// Typed handle to one registration.
pub struct ComponentId<T> {
    raw: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ComponentId<T> {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.raw
    }
}

impl<T> Clone for ComponentId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentId<T> {}

impl<T> PartialEq for ComponentId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for ComponentId<T> {}

impl<T> std::hash::Hash for ComponentId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: Component> fmt::Debug for ComponentId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", T::KIND, self.raw)
    }
}

struct Registration<T> {
    id: u64,
    owner: ActorId,
    value: T,
}

/// Flat, attachment-ordered collection of one component kind.
pub struct Registry<T> {
    entries: Vec<Registration<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Component + fmt::Debug> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|r| (r.id, (&r.owner, &r.value))))
            .finish()
    }
}

impl<T: Component> Registry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` as owned by `owner`.
    pub fn attach(&mut self, owner: ActorId, value: T) -> ComponentId<T> {
        let raw = NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed);
        self.entries.push(Registration {
            id: raw,
            owner,
            value,
        });
        tracing::trace!(kind = T::KIND, component = raw, actor = %owner, "component attached");
        ComponentId {
            raw,
            _marker: PhantomData,
        }
    }

    /// Remove the registration `id` and return its value.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownComponent`] if `id` is not registered, e.g.
    /// because it was already detached.
    pub fn detach(&mut self, id: ComponentId<T>) -> Result<T, RegistryError> {
        let index = self.position(id).ok_or(RegistryError::UnknownComponent {
            kind: T::KIND,
            id: id.raw,
        })?;
        let removed = self.entries.remove(index);
        tracing::trace!(kind = T::KIND, component = id.raw, actor = %removed.owner, "component detached");
        Ok(removed.value)
    }

    #[must_use]
    pub fn get(&self, id: ComponentId<T>) -> Option<&T> {
        self.position(id).map(|i| &self.entries[i].value)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: ComponentId<T>) -> Option<&mut T> {
        self.position(id).map(|i| &mut self.entries[i].value)
    }

    #[must_use]
    pub fn contains(&self, id: ComponentId<T>) -> bool {
        self.position(id).is_some()
    }

    #[must_use]
    pub fn owner_of(&self, id: ComponentId<T>) -> Option<ActorId> {
        self.position(id).map(|i| self.entries[i].owner)
    }

    /// Number of registrations owned by `actor`.
    #[must_use]
    pub fn owned_by(&self, actor: ActorId) -> usize {
        self.entries.iter().filter(|r| r.owner == actor).count()
    }

    /// Drop every registration owned by `actor`, returning how many there were.
    pub fn purge(&mut self, actor: ActorId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|r| r.owner != actor);
        before - self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registrations in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &T)> + '_ {
        self.entries.iter().map(|r| (r.owner, &r.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ActorId, &mut T)> + '_ {
        self.entries.iter_mut().map(|r| (r.owner, &mut r.value))
    }

    fn position(&self, id: ComponentId<T>) -> Option<usize> {
        self.entries.iter().position(|r| r.id == id.raw)
    }
}

/// The four registries the frame systems work on.
#[derive(Debug, Default)]
pub struct ComponentRegistries {
    pub colliders: Registry<Collider>,
    pub movers: Registry<Mover>,
    pub walkers: Registry<Walker>,
    pub sprites: Registry<Sprite>,
}

impl ComponentRegistries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrations owned by `actor` across all registries.
    #[must_use]
    pub fn owned_by(&self, actor: ActorId) -> usize {
        self.colliders.owned_by(actor)
            + self.movers.owned_by(actor)
            + self.walkers.owned_by(actor)
            + self.sprites.owned_by(actor)
    }

    /// Drop everything owned by `actor` in every registry.
    pub fn purge(&mut self, actor: ActorId) -> usize {
        self.colliders.purge(actor)
            + self.movers.purge(actor)
            + self.walkers.purge(actor)
            + self.sprites.purge(actor)
    }

    /// Total registrations across all registries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colliders.len() + self.movers.len() + self.walkers.len() + self.sprites.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
