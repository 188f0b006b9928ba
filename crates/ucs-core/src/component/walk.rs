//! Tile-to-tile walking.
//!
//! A walker with no destination and a direction other than
//! [`WalkDirection::Stop`] picks the adjacent tile in that direction, if it
//! is walkable. Each frame it spends up to `speed` pixels moving toward the
//! destination. On arrival it stops if the direction is `Stop`, otherwise it
//! chains to the next tile with whatever energy is left.

use crate::component::{Component, Registry};
use crate::geometry::Tile;
use crate::scene::Cores;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WalkDirection {
    #[default]
    Stop,
    North,
    South,
    East,
    West,
}

impl WalkDirection {
    /// The tile one step away, or `None` for `Stop`.
    #[must_use]
    pub fn step(self, from: Tile) -> Option<Tile> {
        let (dc, dr) = match self {
            Self::Stop => return None,
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        };
        Some(Tile::new(from.col + dc, from.row + dr))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walker {
    pub direction: WalkDirection,
    /// Pixels per frame.
    pub speed: i32,
    pub dst: Option<Tile>,
}

impl Walker {
    #[must_use]
    pub fn new(speed: i32) -> Self {
        Self {
            direction: WalkDirection::Stop,
            speed,
            dst: None,
        }
    }

    #[must_use]
    pub fn is_walking(&self) -> bool {
        self.dst.is_some()
    }
}

impl Component for Walker {
    const KIND: &'static str = "walker";
}

fn adjacent(from: Tile, direction: WalkDirection, world: &dyn World) -> Option<Tile> {
    direction.step(from).filter(|tile| world.is_walkable(*tile))
}

pub fn update(walkers: &mut Registry<Walker>, cores: &mut Cores<'_>, world: &dyn World) {
    for (owner, walker) in walkers.iter_mut() {
        let Some(core) = cores.get_mut(owner).filter(|core| core.is_active()) else {
            continue;
        };

        if walker.dst.is_none() {
            let here = world.pixels_to_tile(core.position);
            walker.dst = adjacent(here, walker.direction, world);
        }

        let mut energy = walker.speed;
        while let Some(dst) = walker.dst
            && energy > 0
        {
            let target = world.tile_to_pixels(dst);
            let dx = (target.x - core.position.x).abs().min(energy);
            let dy = (target.y - core.position.y).abs().min(energy - dx);
            core.position.x += dx * (target.x - core.position.x).signum();
            core.position.y += dy * (target.y - core.position.y).signum();
            energy -= dx + dy;

            if core.position == target {
                walker.dst = adjacent(dst, walker.direction, world);
            }
        }
    }
}
