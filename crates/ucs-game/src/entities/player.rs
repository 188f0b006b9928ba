//! The player-controlled hero.

use std::any::Any;

use ucs_core::{
    Action, Actor, ActorCore, ActorId, Collider, ComponentId, ComponentRegistries, Input,
    Position, Rect, Result, Spawned, TeamBits, TickContext, WalkDirection, Walker,
};

use crate::config::Controls;
use crate::humanoid::Humanoid;

pub const COLLIDER_SIZE: i32 = 16;
/// Pixels per frame.
pub const WALK_SPEED: i32 = 1;

#[derive(Debug)]
pub struct Player {
    controls: Controls,
    pub humanoid: Humanoid,
    collider: ComponentId<Collider>,
    walker: ComponentId<Walker>,
}

impl Player {
    /// Factory for [`Scene::spawn`](ucs_core::Scene::spawn).
    pub fn spawn(
        position: Position,
        controls: Controls,
        body_frame: Rect,
    ) -> impl FnOnce(ActorId, &mut ComponentRegistries) -> Result<Spawned> {
        move |id, components| {
            let player = Player {
                controls,
                humanoid: Humanoid::attach(id, body_frame, components),
                collider: components.colliders.attach(id, Collider::new(COLLIDER_SIZE)),
                walker: components.walkers.attach(id, Walker::new(WALK_SPEED)),
            };
            Ok(Spawned::new(
                ActorCore::new(position, TeamBits::PLAYER),
                player,
            ))
        }
    }

    #[must_use]
    pub fn controls(&self) -> Controls {
        self.controls
    }

    /// Direction requested by the held keys. Earlier keys in the control map
    /// win when several are down.
    fn requested_direction(&self, input: &dyn Input) -> WalkDirection {
        let c = &self.controls;
        [
            (c.up, WalkDirection::North),
            (c.down, WalkDirection::South),
            (c.left, WalkDirection::West),
            (c.right, WalkDirection::East),
        ]
        .into_iter()
        .find(|(key, _)| input.is_key_down(*key))
        .map_or(WalkDirection::Stop, |(_, direction)| direction)
    }
}

impl Actor for Player {
    fn tick(&mut self, cx: &mut TickContext<'_>) -> Result<Option<Box<dyn Action>>> {
        let direction = self.requested_direction(cx.input());
        if let Some(walker) = cx.components_mut().walkers.get_mut(self.walker) {
            walker.direction = direction;
        }
        Ok(None)
    }

    fn destroy(&mut self, _id: ActorId, components: &mut ComponentRegistries) -> Result<()> {
        self.humanoid.detach(components)?;
        components.colliders.detach(self.collider)?;
        components.walkers.detach(self.walker)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
