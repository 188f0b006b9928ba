#![forbid(unsafe_code)]

//! Actor scene, resumable actions and per-frame systems for the UCS
//! simulation core.
//!
//! # Architecture
//!
//! - [`Scene`] owns every live actor in a generation-tagged arena and runs
//!   one tick pass per frame over a snapshot of its insertion order.
//! - [`Actor`] is the per-entity behaviour hook; its position, team and
//!   lifecycle live in an [`ActorCore`] held next to it.
//! - [`component`] holds the flat registries (collision, movement, walk,
//!   sprite) and the system function that processes each one.
//! - [`Action`] is a unit of work that may span frames; [`ActionQueue`] holds
//!   the pending ones.
//! - [`Driver`] steps all of the above against the external surfaces:
//!   [`World`], [`Input`], [`Ui`], [`Clock`] and [`RenderContext`].
//!
//! Everything is single-threaded and cooperative. Nothing here blocks; an
//! action waits by reporting "not finished" across frames.

pub mod action;
pub mod actor;
pub mod clock;
pub mod component;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod input;
pub mod render;
pub mod scene;
pub mod ui;
pub mod world;

pub use action::{
    Action, ActionContext, ActionQueue, DestroyActorsAction, FuncAction, SequenceAction,
    ShowMessageAction, SpawnActorsAction, WaitAction,
};
pub use actor::{Actor, ActorCore, ActorId, ActorState, SpawnFn, Spawned, TeamBits};
pub use clock::{Clock, LabClock, SystemClock};
pub use component::{
    Collider, Component, ComponentId, ComponentRegistries, Contact, Mover, Registry, Sprite,
    WalkDirection, Walker,
};
pub use driver::{Driver, FrameReport, TIME_STEP};
pub use error::{RegistryError, Result, SimError};
pub use geometry::{Offset, Position, Rect, Tile};
pub use input::{Input, Key, KeyboardState};
pub use render::{DrawCommand, RenderContext, RenderStage};
pub use scene::{Cores, PassReport, Scene, TickContext, TickEnv};
pub use ui::{MessageUi, Ui};
pub use world::{GridWorld, World};
