//! Free pixel movement blocked by unwalkable tiles.

use crate::component::{Component, Registry};
use crate::geometry::{Offset, Rect};
use crate::scene::Cores;
use crate::world::World;

/// Per-frame velocity with a footprint rect relative to the owner's position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mover {
    pub vel_x: i32,
    pub vel_y: i32,
    pub rect: Rect,
}

impl Mover {
    #[must_use]
    pub fn new(rect: Rect) -> Self {
        Self {
            vel_x: 0,
            vel_y: 0,
            rect,
        }
    }
}

impl Component for Mover {
    const KIND: &'static str = "mover";
}

/// Move each owner by its velocity when all four footprint corners land on
/// walkable tiles; otherwise leave it where it is.
pub fn update(movers: &Registry<Mover>, cores: &mut Cores<'_>, world: &dyn World) {
    for (owner, mover) in movers.iter() {
        if mover.vel_x == 0 && mover.vel_y == 0 {
            continue;
        }
        let Some(core) = cores.get_mut(owner).filter(|core| core.is_active()) else {
            continue;
        };
        let next = core.position + Offset::new(mover.vel_x, mover.vel_y);
        let blocked = mover
            .rect
            .translated(next)
            .corners()
            .iter()
            .any(|corner| !world.is_walkable(world.pixels_to_tile(*corner)));
        if !blocked {
            core.position = next;
        }
    }
}
