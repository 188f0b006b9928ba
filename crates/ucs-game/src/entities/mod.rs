//! Tutorial actors.

pub mod npc;
pub mod pickup;
pub mod player;

pub use npc::{Npc, NpcBehavior};
pub use pickup::Pickup;
pub use player::Player;
