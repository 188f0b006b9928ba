//! Items lying on the floor.

use std::any::Any;

use ucs_core::{
    Action, Actor, ActorCore, ActorId, Collider, ComponentId, ComponentRegistries, Offset,
    Position, Result, Spawned, Sprite, TeamBits, TickContext,
};
use ucs_reactive::ReactiveList;

use crate::actions::WieldItemAction;
use crate::items::Item;

pub const COLLIDER_SIZE: i32 = 16;

/// Handed to the first player that touches it.
#[derive(Debug)]
pub struct Pickup {
    item: Item,
    pickups: ReactiveList<String>,
    collider: ComponentId<Collider>,
    sprite: ComponentId<Sprite>,
}

impl Pickup {
    /// `pickups` is the world-state list the item name is appended to.
    pub fn spawn(
        position: Position,
        item: Item,
        pickups: ReactiveList<String>,
    ) -> impl FnOnce(ActorId, &mut ComponentRegistries) -> Result<Spawned> {
        move |id, components| {
            let pickup = Pickup {
                item,
                pickups,
                collider: components.colliders.attach(id, Collider::new(COLLIDER_SIZE)),
                sprite: components
                    .sprites
                    .attach(id, Sprite::new(Some(item.frame()), Offset::default())),
            };
            Ok(Spawned::new(ActorCore::new(position, TeamBits::empty()), pickup))
        }
    }

    #[must_use]
    pub fn item(&self) -> Item {
        self.item
    }
}

impl Actor for Pickup {
    fn tick(&mut self, cx: &mut TickContext<'_>) -> Result<Option<Box<dyn Action>>> {
        let contact = cx.components().colliders.get(self.collider).and_then(|c| c.contact);
        let Some(contact) = contact.filter(|c| c.team.contains(TeamBits::PLAYER)) else {
            return Ok(None);
        };
        cx.deactivate();
        tracing::info!(item = %self.item, player = %contact.actor, "item picked up");
        Ok(Some(Box::new(WieldItemAction::new(
            contact.actor,
            self.item,
            self.pickups.clone(),
        ))))
    }

    fn destroy(&mut self, _id: ActorId, components: &mut ComponentRegistries) -> Result<()> {
        components.colliders.detach(self.collider)?;
        components.sprites.detach(self.sprite)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
