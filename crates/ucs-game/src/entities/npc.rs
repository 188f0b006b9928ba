//! Non-player characters with pluggable behaviour.
//!
//! An NPC watches a sight area. The first time an actor enters it, the
//! behaviour's `on_sight` may return an action; otherwise `on_idle` is asked.
//! While an action the NPC returned is still queued, the NPC does nothing.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use ucs_core::{
    Action, ActionContext, Actor, ActorCore, ActorId, Collider, ComponentId, ComponentRegistries,
    Contact, Position, Rect, Result, Spawned, TeamBits, TickContext,
};

use crate::humanoid::Humanoid;

pub const SIGHT_SIZE: i32 = 20;

/// What an NPC does.
pub trait NpcBehavior: 'static {
    /// `seen` entered the sight area for the first time.
    fn on_sight(&mut self, cx: &mut TickContext<'_>, seen: Contact) -> Option<Box<dyn Action>>;

    /// Nothing new was seen this frame.
    fn on_idle(&mut self, _cx: &mut TickContext<'_>) -> Option<Box<dyn Action>> {
        None
    }
}

/// Clears the NPC's busy flag once the wrapped action leaves the queue:
/// finished, failed or cancelled.
struct Tracked {
    inner: Box<dyn Action>,
    done: Rc<Cell<bool>>,
}

impl Action for Tracked {
    fn invoke(&mut self, cx: &mut ActionContext<'_>) -> Result<bool> {
        self.inner.invoke(cx)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.done.set(true);
    }
}

pub struct Npc {
    pub humanoid: Humanoid,
    sight: ComponentId<Collider>,
    seen: Vec<ActorId>,
    behavior: Box<dyn NpcBehavior>,
    pending: Option<Rc<Cell<bool>>>,
}

impl Npc {
    pub fn spawn(
        position: Position,
        body_frame: Rect,
        behavior: impl NpcBehavior,
    ) -> impl FnOnce(ActorId, &mut ComponentRegistries) -> Result<Spawned> {
        move |id, components| {
            let npc = Npc {
                humanoid: Humanoid::attach(id, body_frame, components),
                sight: components.colliders.attach(id, Collider::new(SIGHT_SIZE)),
                seen: Vec::new(),
                behavior: Box::new(behavior),
                pending: None,
            };
            Ok(Spawned::new(ActorCore::new(position, TeamBits::FRIEND), npc))
        }
    }

    /// Actors seen so far, in order.
    #[must_use]
    pub fn seen(&self) -> &[ActorId] {
        &self.seen
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending.as_ref().is_some_and(|done| !done.get())
    }
}

impl Actor for Npc {
    fn tick(&mut self, cx: &mut TickContext<'_>) -> Result<Option<Box<dyn Action>>> {
        if self.is_busy() {
            return Ok(None);
        }
        self.pending = None;

        let mut action = None;
        let contact = cx.components().colliders.get(self.sight).and_then(|c| c.contact);
        if let Some(contact) = contact
            && !self.seen.contains(&contact.actor)
        {
            tracing::debug!(npc = %cx.id(), seen = %contact.actor, "npc saw actor");
            self.seen.push(contact.actor);
            action = self.behavior.on_sight(cx, contact);
        }
        if action.is_none() {
            action = self.behavior.on_idle(cx);
        }

        Ok(action.map(|inner| {
            let done = Rc::new(Cell::new(false));
            self.pending = Some(Rc::clone(&done));
            Box::new(Tracked { inner, done }) as Box<dyn Action>
        }))
    }

    fn destroy(&mut self, _id: ActorId, components: &mut ComponentRegistries) -> Result<()> {
        self.humanoid.detach(components)?;
        components.colliders.detach(self.sight)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
