#![forbid(unsafe_code)]

//! The tutorial level.
//!
//! ```text
//!   player walks up to the NPC ─► "It's dangerous to go alone!"
//!        ─► shield and sword spawn on either side of the NPC
//!        ─► both picked up ─► "Now, defeat these mobs!"
//! ```
//!
//! [`Tutorial`] is the level's reactive listener: it watches the `pickups`
//! and `hp` world-state fields and queues actions for the driver.

use std::cell::Cell;

use ucs_core::{
    Action, ActionQueue, ActorId, Contact, Driver, GridWorld, Offset, Rect, SequenceAction,
    ShowMessageAction, SpawnActorsAction, TickContext, Tile, World,
};
use ucs_reactive::{ReactionBinder, ReactionSlot, ReactiveField, ReactiveList, ReactiveListener};

use crate::config::Controls;
use crate::entities::{Npc, NpcBehavior, Pickup, Player};
use crate::error::Result;
use crate::items::Item;
use crate::state::{Condition, GameState};

pub const CAVE_DUDE: Rect = Rect::new(0, 104, 16, 16);
pub const CAVE_BABE: Rect = Rect::new(17, 86, 16, 16);

pub const GREETING: &str = "It's dangerous to go alone!\nTake these!";
pub const CHALLENGE: &str = "Now, defeat these mobs!";

/// Level size in tiles.
pub const LEVEL_SIZE: (i32, i32) = (60, 50);
pub const ENTRY_TILE: Tile = Tile::new(44, 39);
pub const NPC_TILE: Tile = Tile::new(48, 39);

/// Build the level grid: a walled room with the entry on [`ENTRY_TILE`].
///
/// # Errors
///
/// A setup error for a non-positive tile size.
pub fn tutorial_world(tile_size: i32) -> Result<GridWorld> {
    let (cols, rows) = LEVEL_SIZE;
    let mut world = GridWorld::new(cols, rows, tile_size, tile_size)?.with_entry(ENTRY_TILE);
    for col in 0..cols {
        world.set_obstacle(Tile::new(col, 0), true);
        world.set_obstacle(Tile::new(col, rows - 1), true);
    }
    for row in 0..rows {
        world.set_obstacle(Tile::new(0, row), true);
        world.set_obstacle(Tile::new(cols - 1, row), true);
    }
    Ok(world)
}

/// Greets the first visitor and hands out a shield and a sword.
#[derive(Debug)]
pub struct TutorialNpc {
    /// Horizontal distance from the NPC to each item.
    spacing: i32,
    pickups: ReactiveList<String>,
}

impl TutorialNpc {
    #[must_use]
    pub fn new(spacing: i32, pickups: ReactiveList<String>) -> Self {
        Self { spacing, pickups }
    }
}

impl NpcBehavior for TutorialNpc {
    fn on_sight(&mut self, cx: &mut TickContext<'_>, _seen: Contact) -> Option<Box<dyn Action>> {
        let at = cx.position();
        let spawn = SpawnActorsAction::new()
            .with(Pickup::spawn(
                at + Offset::new(-self.spacing, 0),
                Item::Shield,
                self.pickups.clone(),
            ))
            .with(Pickup::spawn(
                at + Offset::new(self.spacing, 0),
                Item::Sword,
                self.pickups.clone(),
            ));
        Some(Box::new(
            SequenceAction::default()
                .then(ShowMessageAction::new(GREETING))
                .then(spawn),
        ))
    }
}

/// Ids of the actors placed by [`Tutorial::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cast {
    pub player: ActorId,
    pub npc: ActorId,
}

/// Level listener reacting to the world state.
///
/// Two recorded pickups queue the challenge message once. `hp` reaching zero
/// sets `condition` to defeat; so does any negative value, since a single hit
/// can skip past zero.
pub struct Tutorial {
    hp: ReactiveField<i32>,
    condition: ReactiveField<Condition>,
    pickups: ReactiveList<String>,
    queue: ActionQueue,
    challenged: Cell<bool>,
    slot: ReactionSlot,
}

impl Tutorial {
    #[must_use]
    pub fn new(state: &GameState, queue: ActionQueue) -> Self {
        Self {
            hp: state.hp.clone(),
            condition: state.condition.clone(),
            pickups: state.pickups.clone(),
            queue,
            challenged: Cell::new(false),
            slot: ReactionSlot::new(),
        }
    }

    /// Place the player on the level entry and the NPC on [`NPC_TILE`].
    ///
    /// # Errors
    ///
    /// Spawn errors from the scene.
    pub fn enter(&self, driver: &mut Driver, controls: Controls) -> Result<Cast> {
        let entry = driver.world().entry();
        let npc_at = driver.world().tile_to_pixels(NPC_TILE);
        let (tile_width, _) = driver.world().tile_size();
        let behavior = TutorialNpc::new(2 * tile_width, self.pickups.clone());

        let scene = driver.scene_mut();
        let player = scene.spawn(Player::spawn(entry, controls, CAVE_DUDE))?;
        let npc = scene.spawn(Npc::spawn(npc_at, CAVE_BABE, behavior))?;
        tracing::info!(%player, %npc, entry = %entry, "tutorial entered");
        Ok(Cast { player, npc })
    }

    /// Whether the closing challenge has been queued.
    #[must_use]
    pub fn challenged(&self) -> bool {
        self.challenged.get()
    }

    fn on_pickups(&self, pickups: Vec<String>) {
        if pickups.len() == 2 && !self.challenged.replace(true) {
            self.queue.push(ShowMessageAction::new(CHALLENGE));
        }
    }

    fn on_hp(&self, hp: i32) {
        if hp <= 0 && self.condition.set(Condition::Defeat) {
            tracing::info!(hp, "player defeated");
        }
    }
}

impl ReactiveListener for Tutorial {
    fn reaction_slot(&self) -> &ReactionSlot {
        &self.slot
    }

    fn declare_reactions(
        &self,
        binder: &mut ReactionBinder<Self>,
    ) -> ucs_reactive::Result<()> {
        binder.react1("on_pickups", &self.pickups, Self::on_pickups)?;
        binder.react1("on_hp", &self.hp, Self::on_hp)
    }
}
