#![forbid(unsafe_code)]

//! Scripted input for headless runs.
//!
//! A [`Script`] is a list of walk segments. Before each frame it holds the
//! key for the current segment's direction and closes any message that has
//! been up for `prompt_frames` frames.
//!
//! # Invariants
//!
//! - Segments only count frames in which the scene actually ran; frames
//!   frozen behind a prompt do not use up a segment.
//! - After the last segment every movement key is released.

use ucs_core::{FrameReport, Key, Ui, WalkDirection};

use crate::config::Controls;
use crate::error::Result;
use crate::game::Game;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub direction: WalkDirection,
    pub frames: u64,
}

impl Segment {
    #[must_use]
    pub const fn new(direction: WalkDirection, frames: u64) -> Self {
        Self { direction, frames }
    }
}

#[derive(Debug, Clone)]
pub struct Script {
    segments: Vec<Segment>,
    cursor: usize,
    /// Unfrozen frames spent in the current segment.
    spent: u64,
    prompt_frames: u64,
    /// Frames the current message has been up.
    prompt_age: u64,
}

impl Script {
    #[must_use]
    pub fn new(segments: Vec<Segment>, prompt_frames: u64) -> Self {
        Self {
            segments,
            cursor: 0,
            spent: 0,
            prompt_frames,
            prompt_age: 0,
        }
    }

    /// Walk east past the NPC to the sword, then back west to the shield.
    #[must_use]
    pub fn tutorial(prompt_frames: u64) -> Self {
        Self::new(
            vec![
                Segment::new(WalkDirection::East, 100),
                Segment::new(WalkDirection::West, 120),
            ],
            prompt_frames,
        )
    }

    /// The segment driving the next frame, if any.
    #[must_use]
    pub fn current(&self) -> Option<Segment> {
        self.segments.get(self.cursor).copied()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.segments.len()
    }

    fn key_for(direction: WalkDirection, controls: &Controls) -> Option<Key> {
        match direction {
            WalkDirection::Stop => None,
            WalkDirection::North => Some(controls.up),
            WalkDirection::South => Some(controls.down),
            WalkDirection::West => Some(controls.left),
            WalkDirection::East => Some(controls.right),
        }
    }

    /// Prepare the input and UI, then run one frame of `game`.
    ///
    /// # Errors
    ///
    /// The first error of the frame.
    pub fn step(&mut self, game: &mut Game) -> Result<FrameReport> {
        let controls = game.controls();
        let driver = game.driver_mut();

        if driver.ui().prompt_active() {
            if self.prompt_age >= self.prompt_frames {
                if let Some(text) = driver.ui_mut().dismiss() {
                    tracing::debug!(message = %text, frames = self.prompt_age, "prompt dismissed");
                }
                self.prompt_age = 0;
            } else {
                self.prompt_age += 1;
            }
        }

        let key = self
            .current()
            .and_then(|segment| Self::key_for(segment.direction, &controls));
        driver.input_mut().set_down(key);

        let report = game.step()?;
        if !report.prompt_active {
            self.advance();
        }
        Ok(report)
    }

    fn advance(&mut self) {
        let Some(segment) = self.current() else {
            return;
        };
        self.spent += 1;
        if self.spent >= segment.frames {
            self.cursor += 1;
            self.spent = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use ucs_core::Input;

    fn holds(game: &Game, key: Key) -> bool {
        game.driver().input().is_key_down(key)
    }

    #[test]
    fn segments_advance_on_unfrozen_frames() {
        let mut game = Game::new(&SimConfig::default()).unwrap();
        let mut script = Script::new(
            vec![
                Segment::new(WalkDirection::East, 2),
                Segment::new(WalkDirection::Stop, 1),
            ],
            0,
        );

        script.step(&mut game).unwrap();
        assert!(holds(&game, game.controls().right));
        script.step(&mut game).unwrap();
        assert_eq!(script.current(), Some(Segment::new(WalkDirection::Stop, 1)));
        script.step(&mut game).unwrap();
        assert!(script.is_finished());
        assert!(!holds(&game, game.controls().right));
    }

    #[test]
    fn prompt_is_dismissed_after_its_frames() {
        let mut game = Game::new(&SimConfig::default()).unwrap();
        game.driver_mut().ui_mut().show_message("hello");
        let mut script = Script::new(vec![Segment::new(WalkDirection::East, 1)], 2);

        assert!(script.step(&mut game).unwrap().prompt_active);
        assert!(script.step(&mut game).unwrap().prompt_active);
        assert_eq!(script.current(), Some(Segment::new(WalkDirection::East, 1)));

        let report = script.step(&mut game).unwrap();
        assert!(!report.prompt_active);
        assert!(script.is_finished());
    }
}
