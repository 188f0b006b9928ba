//! Game-specific actions.

use ucs_core::{Action, ActionContext, ActorId, Result, SimError};
use ucs_reactive::ReactiveList;

use crate::entities::Player;
use crate::items::Item;

/// Puts an item in the player's hand and records the pickup in the world
/// state. Finishes on the first invocation.
#[derive(Debug)]
pub struct WieldItemAction {
    player: ActorId,
    item: Item,
    pickups: ReactiveList<String>,
}

impl WieldItemAction {
    #[must_use]
    pub fn new(player: ActorId, item: Item, pickups: ReactiveList<String>) -> Self {
        Self {
            player,
            item,
            pickups,
        }
    }
}

impl Action for WieldItemAction {
    fn invoke(&mut self, cx: &mut ActionContext<'_>) -> Result<bool> {
        let item = self.item;
        cx.scene_mut()
            .with_actor_mut::<Player, _>(self.player, |player, _core, components| {
                player.humanoid.wield(item, components)
            })
            .ok_or(SimError::UnknownActor(self.player))?;
        // Recorded even when both hands were full.
        self.pickups.push(item.name().to_string());
        Ok(true)
    }
}
