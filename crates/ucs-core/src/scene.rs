#![forbid(unsafe_code)]

//! The actor arena and its tick pass.
//!
//! Actors live in generation-tagged slots. [`Scene::tick`] walks a snapshot
//! of the insertion order taken when the pass starts, and only afterwards
//! destroys the actors it found inactive.
//!
//! # Invariants
//!
//! 1. No actor is ticked twice in one pass.
//! 2. Actors spawned during a pass are first ticked by the next pass.
//! 3. An actor found `Inactive` (after its own tick, or already inactive
//!    when visited) is marked for removal and not ticked again.
//! 4. Marked actors are destroyed after the pass, in marking order: they are
//!    detached from the scene, then `destroy()` runs, then the scene checks
//!    that no component owned by them is still registered.
//! 5. A destroyed actor's slot is reused with a new generation, so stale
//!    [`ActorId`]s never resolve.
//!
//! # Failure Modes
//!
//! - An actor's `tick` error stops the pass. Actors already marked are still
//!   destroyed, then the error is returned.
//! - A `destroy` that leaves registrations behind yields
//!   [`SimError::ComponentLeak`]; the leftovers are purged so the registries
//!   stay consistent.

use std::fmt;
use std::time::Duration;

use crate::action::Action;
use crate::actor::{Actor, ActorCore, ActorId, SpawnFn, Spawned};
use crate::component::ComponentRegistries;
use crate::error::{Result, SimError};
use crate::geometry::Position;
use crate::input::Input;
use crate::world::World;

struct Entry {
    core: ActorCore,
    actor: Box<dyn Actor>,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

impl Slot {
    fn live(&self, id: ActorId) -> Option<&Entry> {
        (self.generation == id.generation)
            .then_some(self.entry.as_ref())
            .flatten()
    }

    fn live_mut(&mut self, id: ActorId) -> Option<&mut Entry> {
        if self.generation == id.generation {
            self.entry.as_mut()
        } else {
            None
        }
    }
}

fn live_entry(slots: &mut [Slot], id: ActorId) -> Option<&mut Entry> {
    slots
        .get_mut(id.index as usize)
        .and_then(|slot| slot.live_mut(id))
}

/// Shared inputs of one tick pass.
#[derive(Clone, Copy)]
pub struct TickEnv<'a> {
    pub input: &'a dyn Input,
    pub world: &'a dyn World,
    pub dt: Duration,
}

/// What an actor may touch while it ticks.
pub struct TickContext<'a> {
    id: ActorId,
    core: &'a mut ActorCore,
    components: &'a mut ComponentRegistries,
    input: &'a dyn Input,
    world: &'a dyn World,
    dt: Duration,
    spawns: &'a mut Vec<SpawnFn>,
}

impl TickContext<'_> {
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    #[must_use]
    pub fn core(&self) -> &ActorCore {
        self.core
    }

    pub fn core_mut(&mut self) -> &mut ActorCore {
        self.core
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.core.position
    }

    /// Mark this actor inactive; the scene removes it after the pass.
    pub fn deactivate(&mut self) -> bool {
        self.core.deactivate()
    }

    #[must_use]
    pub fn components(&self) -> &ComponentRegistries {
        self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentRegistries {
        self.components
    }

    #[must_use]
    pub fn input(&self) -> &dyn Input {
        self.input
    }

    #[must_use]
    pub fn world(&self) -> &dyn World {
        self.world
    }

    #[must_use]
    pub fn dt(&self) -> Duration {
        self.dt
    }

    /// Queue a new actor. It joins the scene right after this actor's tick
    /// and is first ticked by the next pass.
    pub fn spawn(
        &mut self,
        factory: impl FnOnce(ActorId, &mut ComponentRegistries) -> Result<Spawned> + 'static,
    ) {
        self.spawns.push(Box::new(factory));
    }
}

/// Read/write access to actor cores, for the component systems.
pub struct Cores<'a> {
    slots: &'a mut [Slot],
}

impl Cores<'_> {
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&ActorCore> {
        self.slots
            .get(id.index as usize)
            .and_then(|slot| slot.live(id))
            .map(|entry| &entry.core)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut ActorCore> {
        live_entry(self.slots, id).map(|entry| &mut entry.core)
    }
}

/// Outcome of one [`Scene::tick`].
#[derive(Default)]
pub struct PassReport {
    /// Actions returned by actors, in visit order.
    pub actions: Vec<Box<dyn Action>>,
    pub ticked: usize,
    pub spawned: usize,
    /// Destroyed actors, in destruction order.
    pub destroyed: Vec<ActorId>,
}

impl fmt::Debug for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassReport")
            .field(
                "actions",
                &self.actions.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field("ticked", &self.ticked)
            .field("spawned", &self.spawned)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

/// Ordered owner of all live actors and their component registries.
#[derive(Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<ActorId>,
    components: ComponentRegistries,
    passes: u64,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actors: Vec<_> = self
            .order
            .iter()
            .filter_map(|id| {
                let entry = self.slots.get(id.index as usize)?.live(*id)?;
                Some((id.to_string(), entry.actor.name(), entry.core.state()))
            })
            .collect();
        f.debug_struct("Scene")
            .field("actors", &actors)
            .field("components", &self.components.len())
            .field("passes", &self.passes)
            .finish()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an actor built by `factory`, which receives the new id so it can
    /// attach components.
    ///
    /// # Errors
    ///
    /// Whatever `factory` returns. Components it attached before failing are
    /// purged and the slot is released.
    pub fn spawn(
        &mut self,
        factory: impl FnOnce(ActorId, &mut ComponentRegistries) -> Result<Spawned>,
    ) -> Result<ActorId> {
        let id = self.reserve();
        match factory(id, &mut self.components) {
            Ok(Spawned { core, actor }) => {
                tracing::debug!(actor = %id, name = actor.name(), position = %core.position, "actor spawned");
                if let Some(slot) = self.slots.get_mut(id.index as usize) {
                    slot.entry = Some(Entry { core, actor });
                }
                self.order.push(id);
                Ok(id)
            }
            Err(err) => {
                self.components.purge(id);
                self.release(id);
                Err(err)
            }
        }
    }

    fn reserve(&mut self) -> ActorId {
        if let Some(index) = self.free.pop() {
            let generation = self.slots[index as usize].generation;
            return ActorId { index, generation };
        }
        self.slots.push(Slot {
            generation: 0,
            entry: None,
        });
        ActorId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    fn release(&mut self, id: ActorId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize) {
            slot.entry = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[ActorId] {
        &self.order
    }

    #[must_use]
    pub fn contains(&self, id: ActorId) -> bool {
        self.entry(id).is_some()
    }

    /// Number of completed [`tick`](Self::tick) passes.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    fn entry(&self, id: ActorId) -> Option<&Entry> {
        self.slots.get(id.index as usize)?.live(id)
    }

    #[must_use]
    pub fn core(&self, id: ActorId) -> Option<&ActorCore> {
        self.entry(id).map(|e| &e.core)
    }

    pub fn core_mut(&mut self, id: ActorId) -> Option<&mut ActorCore> {
        live_entry(&mut self.slots, id).map(|e| &mut e.core)
    }

    /// The actor `id`, if it exists and is an `A`.
    #[must_use]
    pub fn actor<A: Actor>(&self, id: ActorId) -> Option<&A> {
        self.entry(id)?.actor.as_any().downcast_ref::<A>()
    }

    pub fn actor_mut<A: Actor>(&mut self, id: ActorId) -> Option<&mut A> {
        live_entry(&mut self.slots, id)?
            .actor
            .as_any_mut()
            .downcast_mut::<A>()
    }

    /// Run `f` with the actor `id` as an `A`, its core and the registries.
    ///
    /// Returns `None` if the actor is gone or is not an `A`.
    pub fn with_actor_mut<A: Actor, R>(
        &mut self,
        id: ActorId,
        f: impl FnOnce(&mut A, &mut ActorCore, &mut ComponentRegistries) -> R,
    ) -> Option<R> {
        let entry = live_entry(&mut self.slots, id)?;
        let actor = entry.actor.as_any_mut().downcast_mut::<A>()?;
        Some(f(actor, &mut entry.core, &mut self.components))
    }

    /// Set the actor inactive; it is removed by the next pass.
    ///
    /// Returns `false` if the actor is gone or already inactive.
    pub fn deactivate(&mut self, id: ActorId) -> bool {
        self.core_mut(id).is_some_and(ActorCore::deactivate)
    }

    #[must_use]
    pub fn components(&self) -> &ComponentRegistries {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentRegistries {
        &mut self.components
    }

    /// Borrow the registries and the actor cores at the same time.
    pub fn split_mut(&mut self) -> (&mut ComponentRegistries, Cores<'_>) {
        (
            &mut self.components,
            Cores {
                slots: &mut self.slots,
            },
        )
    }

    /// Run one pass over the actors present when it starts.
    ///
    /// # Errors
    ///
    /// The first error from an actor's tick, a spawn factory, or a destroy.
    pub fn tick(&mut self, env: &TickEnv<'_>) -> Result<PassReport> {
        let snapshot = self.order.clone();
        let mut report = PassReport::default();
        let mut marked = Vec::new();
        let mut staged: Vec<SpawnFn> = Vec::new();
        let mut failure: Option<SimError> = None;

        for id in snapshot {
            let Some(entry) = live_entry(&mut self.slots, id) else {
                continue;
            };
            if !entry.core.is_active() {
                marked.push(id);
                continue;
            }

            let outcome = {
                let mut cx = TickContext {
                    id,
                    core: &mut entry.core,
                    components: &mut self.components,
                    input: env.input,
                    world: env.world,
                    dt: env.dt,
                    spawns: &mut staged,
                };
                entry.actor.tick(&mut cx)
            };
            report.ticked += 1;
            if !entry.core.is_active() {
                tracing::trace!(actor = %id, "actor deactivated");
                marked.push(id);
            }
            match outcome {
                Ok(Some(action)) => report.actions.push(action),
                Ok(None) => {}
                Err(err) => failure = Some(err),
            }

            for factory in staged.drain(..) {
                match self.spawn(factory) {
                    Ok(_) => report.spawned += 1,
                    Err(err) => {
                        failure.get_or_insert(err);
                    }
                }
            }
            if failure.is_some() {
                break;
            }
        }

        for id in marked {
            match self.destroy(id) {
                Ok(()) => report.destroyed.push(id),
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }

        self.passes += 1;
        if let Some(err) = failure {
            tracing::warn!(pass = self.passes, error = %err, "scene pass aborted");
            return Err(err);
        }
        Ok(report)
    }

    fn destroy(&mut self, id: ActorId) -> Result<()> {
        let mut entry = self
            .slots
            .get_mut(id.index as usize)
            .and_then(|slot| {
                if slot.generation == id.generation {
                    slot.entry.take()
                } else {
                    None
                }
            })
            .ok_or(SimError::UnknownActor(id))?;
        self.order.retain(|other| *other != id);

        let destroyed = entry.actor.destroy(id, &mut self.components);
        let remaining = self.components.owned_by(id);
        if remaining > 0 {
            self.components.purge(id);
        }
        self.release(id);

        destroyed?;
        if remaining > 0 {
            tracing::error!(actor = %id, name = entry.actor.name(), remaining, "actor leaked components");
            return Err(SimError::ComponentLeak {
                actor: id,
                remaining,
            });
        }
        tracing::debug!(actor = %id, name = entry.actor.name(), "actor destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::TeamBits;
    use crate::component::Collider;
    use crate::driver::TIME_STEP;
    use crate::input::KeyboardState;
    use crate::world::GridWorld;
    use std::any::Any;
    use tracing_test::traced_test;

    /// Retires on its first tick and never detaches its collider. With `fail`
    /// the tick errors instead.
    struct Stub {
        fail: bool,
    }

    impl Actor for Stub {
        fn tick(&mut self, cx: &mut TickContext<'_>) -> Result<Option<Box<dyn Action>>> {
            if self.fail {
                return Err(SimError::action("stub failed"));
            }
            cx.deactivate();
            Ok(None)
        }

        fn destroy(&mut self, _id: ActorId, _components: &mut ComponentRegistries) -> Result<()> {
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn stub(fail: bool) -> impl FnOnce(ActorId, &mut ComponentRegistries) -> Result<Spawned> {
        move |id, components| {
            let _leaked = components.colliders.attach(id, Collider::new(16));
            Ok(Spawned::new(
                ActorCore::new(Position::new(0, 0), TeamBits::FRIEND),
                Stub { fail },
            ))
        }
    }

    fn pass(scene: &mut Scene) -> Result<PassReport> {
        let world = GridWorld::new(4, 4, 16, 16)?;
        scene.tick(&TickEnv {
            input: &KeyboardState::new(),
            world: &world,
            dt: TIME_STEP,
        })
    }

    #[test]
    #[traced_test]
    fn leak_is_logged_with_the_remaining_count() {
        let mut scene = Scene::new();
        scene.spawn(stub(false)).unwrap();

        assert!(matches!(
            pass(&mut scene),
            Err(SimError::ComponentLeak { remaining: 1, .. })
        ));
        assert!(logs_contain("actor leaked components"));
        assert!(logs_contain("remaining=1"));
        assert!(logs_contain("scene pass aborted"));
        assert!(scene.components().is_empty());
    }

    #[test]
    #[traced_test]
    fn tick_error_aborts_the_pass_with_a_warning() {
        let mut scene = Scene::new();
        scene.spawn(stub(true)).unwrap();

        let err = pass(&mut scene).unwrap_err();
        assert!(matches!(err, SimError::Action { .. }));
        assert!(logs_contain("scene pass aborted"));
        assert!(!logs_contain("actor leaked components"));
        assert_eq!(scene.len(), 1);
    }
}
