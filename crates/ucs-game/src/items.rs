//! Items that can be picked up and wielded.

use std::fmt;

use ucs_core::{Offset, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    Sword,
    Shield,
}

impl Item {
    /// Region of the sprite sheet.
    #[must_use]
    pub const fn frame(self) -> Rect {
        match self {
            Self::Sword => Rect::new(748, 123, 5, 10),
            Self::Shield => Rect::new(652, 74, 16, 16),
        }
    }

    /// Offset from the holding hand to the item sprite.
    #[must_use]
    pub const fn equip_offset(self) -> Offset {
        match self {
            Self::Sword => Offset::new(-3, -8),
            Self::Shield => Offset::new(-5, -6),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sword => "sword",
            Self::Shield => "shield",
        }
    }

    #[must_use]
    pub const fn is_weapon(self) -> bool {
        matches!(self, Self::Sword)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
