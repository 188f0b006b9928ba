#![forbid(unsafe_code)]

//! Keyboard state consumed by actor control logic.
//!
//! An external poller feeds key transitions into a [`KeyboardState`] once per
//! frame; the driver calls [`Input::end_frame`] after the frame so edge
//! queries (`pressed`/`released`) only report the frame they happened in.

use std::collections::HashSet;
use std::fmt;

/// A key code. The named constants follow the common desktop key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(pub u16);

impl Key {
    pub const SPACE: Key = Key(32);
    pub const A: Key = Key(65);
    pub const D: Key = Key(68);
    pub const E: Key = Key(69);
    pub const J: Key = Key(74);
    pub const K: Key = Key(75);
    pub const Q: Key = Key(81);
    pub const S: Key = Key(83);
    pub const W: Key = Key(87);
    pub const RIGHT: Key = Key(262);
    pub const LEFT: Key = Key(263);
    pub const DOWN: Key = Key(264);
    pub const UP: Key = Key(265);

    /// Look a key up by its name (`"w"`, `"up"`, `"space"`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Key> {
        let key = match name.to_ascii_lowercase().as_str() {
            "space" => Self::SPACE,
            "a" => Self::A,
            "d" => Self::D,
            "e" => Self::E,
            "j" => Self::J,
            "k" => Self::K,
            "q" => Self::Q,
            "s" => Self::S,
            "w" => Self::W,
            "right" => Self::RIGHT,
            "left" => Self::LEFT,
            "down" => Self::DOWN,
            "up" => Self::UP,
            _ => return None,
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key:{}", self.0)
    }
}

/// Boolean key queries for the current frame.
pub trait Input {
    /// Held down right now.
    fn is_key_down(&self, key: Key) -> bool;

    /// Went down this frame.
    fn is_key_pressed(&self, key: Key) -> bool;

    /// Went up this frame.
    fn is_key_released(&self, key: Key) -> bool;

    /// Called by the driver once the frame is over.
    fn end_frame(&mut self) {}
}

#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    down: HashSet<Key>,
    previous: HashSet<Key>,
}

impl KeyboardState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        self.down.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.down.remove(&key);
    }

    /// Replace the set of held keys.
    pub fn set_down(&mut self, keys: impl IntoIterator<Item = Key>) {
        self.down = keys.into_iter().collect();
    }

    pub fn release_all(&mut self) {
        self.down.clear();
    }
}

impl Input for KeyboardState {
    fn is_key_down(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    fn is_key_pressed(&self, key: Key) -> bool {
        self.down.contains(&key) && !self.previous.contains(&key)
    }

    fn is_key_released(&self, key: Key) -> bool {
        !self.down.contains(&key) && self.previous.contains(&key)
    }

    fn end_frame(&mut self) {
        self.previous.clone_from(&self.down);
    }
}
