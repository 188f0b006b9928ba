#![forbid(unsafe_code)]

//! The tutorial level of the UCS game, built on `ucs-core` and
//! `ucs-reactive`.
//!
//! # Layout
//!
//! - [`state`]: the declared `world` state (`hp`, `condition`, `pickups`).
//! - [`entities`]: player, NPC and pickup actors.
//! - [`humanoid`]: body and hand sprites shared by player and NPC.
//! - [`tutorial`]: the level grid, the tutorial NPC and the level listener.
//! - [`game`]: a driver wired to all of the above.
//! - [`script`] and [`cli`]: the headless `ucs-demo` runner.
//!
//! # Example
//!
//! ```
//! use ucs_game::{Game, SimConfig};
//!
//! let mut game = Game::new(&SimConfig::default()).unwrap();
//! let report = game.step().unwrap();
//! assert_eq!(report.ticked, 2);
//! ```

pub mod actions;
pub mod cli;
pub mod config;
pub mod entities;
pub mod error;
pub mod game;
pub mod humanoid;
pub mod items;
pub mod script;
pub mod state;
pub mod tutorial;

pub use actions::WieldItemAction;
pub use cli::{Cli, RunSummary, run, run_from_env};
pub use config::{ControlMap, Controls, LogFormat, Overrides, SimConfig};
pub use entities::{Npc, NpcBehavior, Pickup, Player};
pub use error::{GameError, Result};
pub use game::Game;
pub use humanoid::{Hand, Humanoid};
pub use items::Item;
pub use script::{Script, Segment};
pub use state::{Condition, GameState};
pub use tutorial::{Cast, Tutorial, TutorialNpc};
