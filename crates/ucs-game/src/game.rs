#![forbid(unsafe_code)]

//! A running tutorial: driver, world state and the bound level listener.
//!
//! # Invariants
//!
//! - The lab clock advances by exactly one time step after every frame, so
//!   timed actions see simulated time, not wall time.
//! - The tutorial listener stays bound for the life of the game; dropping the
//!   game drops its subscriptions.

use std::rc::Rc;

use ucs_core::{Driver, FrameReport, KeyboardState, LabClock, MessageUi, Position};
use ucs_reactive::bind;

use crate::config::{Controls, SimConfig};
use crate::entities::Player;
use crate::error::Result;
use crate::humanoid::Hand;
use crate::items::Item;
use crate::state::GameState;
use crate::tutorial::{Cast, Tutorial, tutorial_world};

pub struct Game {
    driver: Driver,
    state: GameState,
    tutorial: Rc<Tutorial>,
    cast: Cast,
    controls: Controls,
    clock: LabClock,
}

impl Game {
    /// Validate `config`, build the level and place the cast.
    ///
    /// # Errors
    ///
    /// Configuration, declaration and spawn errors.
    pub fn new(config: &SimConfig) -> Result<Self> {
        config.validate()?;
        let controls = config.controls(0)?;
        let clock = LabClock::new();
        let world = tutorial_world(config.tile_size)?;
        let mut driver = Driver::new(world, KeyboardState::new(), MessageUi::new())
            .with_clock(clock.clone())
            .with_time_step(config.time_step());

        let state = GameState::declare()?;
        let tutorial = bind(Tutorial::new(&state, driver.queue().clone()))?;
        let cast = tutorial.enter(&mut driver, controls)?;
        Ok(Self {
            driver,
            state,
            tutorial,
            cast,
            controls,
            clock,
        })
    }

    /// Run one frame, then move simulated time forward.
    ///
    /// # Errors
    ///
    /// The first error of the frame.
    pub fn step(&mut self) -> Result<FrameReport> {
        let report = self.driver.step()?;
        self.clock.advance(self.driver.time_step());
        Ok(report)
    }

    #[must_use]
    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Driver {
        &mut self.driver
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn tutorial(&self) -> &Tutorial {
        &self.tutorial
    }

    #[must_use]
    pub fn cast(&self) -> Cast {
        self.cast
    }

    #[must_use]
    pub fn controls(&self) -> Controls {
        self.controls
    }

    #[must_use]
    pub fn clock(&self) -> &LabClock {
        &self.clock
    }

    #[must_use]
    pub fn player_position(&self) -> Option<Position> {
        self.driver.scene().core(self.cast.player).map(|core| core.position)
    }

    /// Items in the player's hands, left first.
    #[must_use]
    pub fn held_items(&self) -> Vec<Item> {
        self.driver
            .scene()
            .actor::<Player>(self.cast.player)
            .map(|player| {
                [Hand::Left, Hand::Right]
                    .into_iter()
                    .filter_map(|hand| player.humanoid.held(hand))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every message shown so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        self.driver.ui().history()
    }
}
