#![forbid(unsafe_code)]

//! The world state shared by every listener of the tutorial.

use std::fmt;

use ucs_reactive::{ReactiveField, ReactiveList, StateDeclaration, StateStore};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Condition {
    #[default]
    Alive,
    Defeat,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Alive => "alive",
            Self::Defeat => "defeat",
        })
    }
}

/// Declared `world` state plus resolved handles to its fields.
#[derive(Debug)]
pub struct GameState {
    store: StateStore,
    pub hp: ReactiveField<i32>,
    pub condition: ReactiveField<Condition>,
    /// Names of the items picked up so far.
    pub pickups: ReactiveList<String>,
}

impl GameState {
    pub const SCOPE: &'static str = "world";
    pub const START_HP: i32 = 50;

    /// # Errors
    ///
    /// Declaration errors from the state store.
    pub fn declare() -> Result<Self> {
        let mut decl = StateDeclaration::new(Self::SCOPE);
        let hp = decl.scalar("hp", Self::START_HP)?;
        let condition = decl.scalar("condition", Condition::Alive)?;
        let pickups = decl.list::<String>("pickups")?;
        let store = decl.build();
        Ok(Self {
            hp: store.field(hp)?,
            condition: store.field(condition)?,
            pickups: store.list(pickups)?,
            store,
        })
    }

    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.store
    }
}
