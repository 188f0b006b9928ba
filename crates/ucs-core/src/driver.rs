#![forbid(unsafe_code)]

//! Fixed-timestep frame driver.
//!
//! [`Driver::step`] runs one frame in a fixed order:
//!
//! ```text
//!   prompt inactive?  ── yes ─► scene pass ─► queue returned actions
//!        │                         └─► collision ─► walk ─► movement
//!        └──────────────────────────────┐
//!                                       ▼
//!                      pending actions (rounds until none are new)
//!                                       ▼
//!                        sprites ─► RenderContext ─► input.end_frame()
//! ```
//!
//! While the UI shows a prompt the scene and its systems are frozen; pending
//! actions still run so the action that showed the prompt can see it close.
//!
//! # Failure Modes
//!
//! The first error of a frame aborts it and is returned. The caller is
//! expected to stop the loop.

use std::fmt;
use std::time::Duration;

use crate::action::{ActionContext, ActionQueue};
use crate::actor::ActorId;
use crate::clock::{Clock, SystemClock};
use crate::component::{collision, movement, sprite, walk};
use crate::error::Result;
use crate::input::{Input, KeyboardState};
use crate::render::RenderContext;
use crate::scene::{Scene, TickEnv};
use crate::ui::{MessageUi, Ui};
use crate::world::{GridWorld, World};

/// Default simulation step: 60 frames per second.
pub const TIME_STEP: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// What happened during one [`Driver::step`].
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame: u64,
    /// Whether a UI prompt froze the scene this frame.
    pub prompt_active: bool,
    pub ticked: usize,
    pub spawned: usize,
    pub destroyed: Vec<ActorId>,
    pub actions_finished: usize,
    /// Actions still pending after the frame.
    pub pending_actions: usize,
    pub render: RenderContext,
}

/// Owns a scene and the external surfaces it runs against.
pub struct Driver<W: World = GridWorld, I: Input = KeyboardState, U: Ui = MessageUi> {
    scene: Scene,
    world: W,
    input: I,
    ui: U,
    clock: Box<dyn Clock>,
    queue: ActionQueue,
    dt: Duration,
    frame: u64,
}

impl<W: World, I: Input, U: Ui> fmt::Debug for Driver<W, I, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("scene", &self.scene)
            .field("queue", &self.queue)
            .field("dt", &self.dt)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl<W: World, I: Input, U: Ui> Driver<W, I, U> {
    /// A driver on the system clock with [`TIME_STEP`].
    pub fn new(world: W, input: I, ui: U) -> Self {
        Self {
            scene: Scene::new(),
            world,
            input,
            ui,
            clock: Box::new(SystemClock),
            queue: ActionQueue::new(),
            dt: TIME_STEP,
            frame: 0,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_time_step(mut self, dt: Duration) -> Self {
        self.dt = dt;
        self
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[must_use]
    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    #[must_use]
    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    #[must_use]
    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    /// Handle to the pending-action queue.
    #[must_use]
    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    #[must_use]
    pub fn time_step(&self) -> Duration {
        self.dt
    }

    /// Number of frames stepped so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run one frame.
    ///
    /// # Errors
    ///
    /// The first error from the scene pass or a pending action.
    pub fn step(&mut self) -> Result<FrameReport> {
        self.frame += 1;
        let prompt_active = self.ui.prompt_active();
        let mut ticked = 0;
        let mut spawned = 0;
        let mut destroyed = Vec::new();

        if !prompt_active {
            let env = TickEnv {
                input: &self.input,
                world: &self.world,
                dt: self.dt,
            };
            let pass = self.scene.tick(&env)?;
            ticked = pass.ticked;
            spawned = pass.spawned;
            destroyed = pass.destroyed;
            for action in pass.actions {
                self.queue.push_boxed(action);
            }

            let (components, mut cores) = self.scene.split_mut();
            collision::update(&mut components.colliders, &cores);
            walk::update(&mut components.walkers, &mut cores, &self.world);
            movement::update(&components.movers, &mut cores, &self.world);
        }

        let actions_finished = {
            let mut cx =
                ActionContext::new(&mut self.scene, &mut self.ui, &*self.clock, &self.queue);
            self.queue.run(&mut cx)?
        };

        let mut render = RenderContext::new();
        {
            let (components, cores) = self.scene.split_mut();
            sprite::update(&components.sprites, &cores, &mut render);
        }
        self.input.end_frame();

        let report = FrameReport {
            frame: self.frame,
            prompt_active,
            ticked,
            spawned,
            destroyed,
            actions_finished,
            pending_actions: self.queue.len(),
            render,
        };
        tracing::debug!(
            frame = report.frame,
            ticked = report.ticked,
            destroyed = report.destroyed.len(),
            pending = report.pending_actions,
            prompt = report.prompt_active,
            "frame stepped"
        );
        Ok(report)
    }
}
