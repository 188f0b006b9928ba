#![forbid(unsafe_code)]

//! UCS public facade crate.
//!
//! Re-exports the reactive state layer, the simulation core and, with the
//! default `game` feature, the tutorial level.

pub mod prelude {
    pub use ucs_core as sim;
    #[cfg(feature = "game")]
    pub use ucs_game as game;
    pub use ucs_reactive as reactive;

    pub use ucs_core::{
        Action, ActionContext, ActionQueue, Actor, ActorCore, ActorId, ComponentRegistries,
        Driver, FrameReport, Scene, SequenceAction, ShowMessageAction, SimError, SpawnActorsAction,
        TickContext, WaitAction,
    };
    pub use ucs_reactive::{
        ReactionBinder, ReactionSlot, ReactiveError, ReactiveField, ReactiveList,
        ReactiveListener, StateDeclaration, StateStore, bind,
    };

    #[cfg(feature = "game")]
    pub use ucs_game::{Game, GameError, SimConfig};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_covers_a_headless_frame() {
        let mut driver: Driver = Driver::new(
            sim::GridWorld::new(4, 4, 16, 16).unwrap(),
            sim::KeyboardState::new(),
            sim::MessageUi::new(),
        );
        driver.queue().push(ShowMessageAction::new("hi"));
        let report = driver.step().unwrap();
        assert_eq!(report.pending_actions, 1);
        assert!(driver.ui().history().iter().any(|m| m == "hi"));
    }

    #[cfg(feature = "game")]
    #[test]
    fn game_is_reachable_from_the_prelude() {
        let game = Game::new(&SimConfig::default()).unwrap();
        assert_eq!(game.driver().scene().len(), 2);
    }
}
