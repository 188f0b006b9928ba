#![forbid(unsafe_code)]

//! Actors: identity, lifecycle and the per-tick hook.
//!
//! # Lifecycle
//!
//! ```text
//!   spawn ──► Active ──(own tick, or DestroyActorsAction)──► Inactive
//!                                                              │
//!            next scene pass observes it ─► detach ─► destroy ─┘
//! ```
//!
//! `Inactive` is terminal: [`ActorCore::deactivate`] never flips it back.

use std::any::{Any, type_name};
use std::fmt;

use bitflags::bitflags;

use crate::action::Action;
use crate::component::ComponentRegistries;
use crate::error::Result;
use crate::geometry::Position;
use crate::scene::TickContext;

/// Generational handle to an actor slot in a [`Scene`](crate::scene::Scene).
///
/// A handle outlives its actor safely: once the slot is reused the
/// generation differs and lookups return `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ActorId {
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActorState {
    #[default]
    Active,
    Inactive,
}

bitflags! {
    /// Team membership, used by collision contacts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TeamBits: u8 {
        const PLAYER = 1;
        const FRIEND = 2;
        const ENEMY = 4;
    }
}

/// The part of an actor the scene and the systems may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorCore {
    pub position: Position,
    pub team: TeamBits,
    state: ActorState,
}

impl ActorCore {
    #[must_use]
    pub fn new(position: Position, team: TeamBits) -> Self {
        Self {
            position,
            team,
            state: ActorState::Active,
        }
    }

    #[must_use]
    pub fn state(&self) -> ActorState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ActorState::Active
    }

    /// Move to `Inactive`. Returns whether the state changed.
    pub fn deactivate(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = ActorState::Inactive;
        was_active
    }
}

/// A simulated entity.
///
/// Implementors hold their own behaviour state and the ids of the components
/// they attached; position, team and lifecycle live in the [`ActorCore`]
/// kept next to them by the scene.
pub trait Actor: 'static {
    /// Advance one tick. May mutate the actor's own core and components and
    /// return at most one pending action.
    ///
    /// # Errors
    ///
    /// Any error aborts the current scene pass.
    fn tick(&mut self, cx: &mut TickContext<'_>) -> Result<Option<Box<dyn Action>>>;

    /// Release every component this actor attached.
    ///
    /// Called exactly once, after the actor was detached from its scene. The
    /// scene verifies that no registration owned by `id` is left afterwards.
    ///
    /// # Errors
    ///
    /// Registry errors (e.g. detaching twice) are propagated.
    fn destroy(&mut self, id: ActorId, components: &mut ComponentRegistries) -> Result<()> {
        let _ = (id, components);
        Ok(())
    }

    /// Short name for logs.
    fn name(&self) -> &'static str {
        let full = type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Downcast to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to the concrete type mutably.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A freshly built actor, ready to be placed in a scene.
pub struct Spawned {
    pub(crate) core: ActorCore,
    pub(crate) actor: Box<dyn Actor>,
}

impl Spawned {
    #[must_use]
    pub fn new(core: ActorCore, actor: impl Actor) -> Self {
        Self {
            core,
            actor: Box::new(actor),
        }
    }
}

impl fmt::Debug for Spawned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spawned")
            .field("actor", &self.actor.name())
            .field("core", &self.core)
            .finish()
    }
}

/// Builds one actor once its id is known, attaching its components.
pub type SpawnFn = Box<dyn FnOnce(ActorId, &mut ComponentRegistries) -> Result<Spawned>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deactivate_is_terminal() {
        let mut core = ActorCore::new(Position::new(0, 0), TeamBits::FRIEND);
        assert!(core.is_active());
        assert!(core.deactivate());
        assert!(!core.deactivate());
        assert_eq!(core.state(), ActorState::Inactive);
    }

    #[test]
    fn team_bits_combine() {
        let team = TeamBits::PLAYER | TeamBits::FRIEND;
        assert!(team.contains(TeamBits::PLAYER));
        assert!(!team.intersects(TeamBits::ENEMY));
    }

    #[test]
    fn actor_id_display() {
        let id = ActorId {
            index: 4,
            generation: 2,
        };
        assert_eq!(id.to_string(), "4v2");
    }
}
