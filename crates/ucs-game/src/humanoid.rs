#![forbid(unsafe_code)]

//! Body-plus-two-hands sprite composite.
//!
//! A humanoid is not a registry of its own: it owns one body sprite and up
//! to two hand sprites in the shared sprite registry, and releases them all
//! in [`Humanoid::detach`].
//!
//! # Invariants
//!
//! 1. The left hand is filled before the right one.
//! 2. Once both hands hold an item, `wield` refuses and registers nothing.
//! 3. After `detach`, the owner has no sprite registered by this humanoid.

use ucs_core::{ActorId, ComponentId, ComponentRegistries, Offset, Rect, Sprite};

use crate::items::Item;

const LEFT_HAND: Offset = Offset::new(0, 3);
const RIGHT_HAND: Offset = Offset::new(10, 3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

#[derive(Debug)]
struct Held {
    item: Item,
    sprite: ComponentId<Sprite>,
}

#[derive(Debug)]
pub struct Humanoid {
    owner: ActorId,
    body: Option<ComponentId<Sprite>>,
    left: Option<Held>,
    right: Option<Held>,
}

impl Humanoid {
    /// Register the body sprite, centred on the owner's position.
    pub fn attach(owner: ActorId, body_frame: Rect, components: &mut ComponentRegistries) -> Self {
        let offset = Offset::new(-body_frame.w / 2, -body_frame.h / 2);
        let body = components
            .sprites
            .attach(owner, Sprite::new(Some(body_frame), offset));
        Self {
            owner,
            body: Some(body),
            left: None,
            right: None,
        }
    }

    /// Put `item` in the first free hand. Returns the hand, or `None` when
    /// both are full.
    pub fn wield(&mut self, item: Item, components: &mut ComponentRegistries) -> Option<Hand> {
        let (slot, hand, anchor) = if self.left.is_none() {
            (&mut self.left, Hand::Left, LEFT_HAND)
        } else if self.right.is_none() {
            (&mut self.right, Hand::Right, RIGHT_HAND)
        } else {
            tracing::warn!(actor = %self.owner, %item, "no free hand for the item");
            return None;
        };
        let sprite = components.sprites.attach(
            self.owner,
            Sprite::new(Some(item.frame()), anchor + item.equip_offset()),
        );
        *slot = Some(Held { item, sprite });
        tracing::debug!(actor = %self.owner, %item, ?hand, "item wielded");
        Some(hand)
    }

    #[must_use]
    pub fn held(&self, hand: Hand) -> Option<Item> {
        match hand {
            Hand::Left => self.left.as_ref(),
            Hand::Right => self.right.as_ref(),
        }
        .map(|held| held.item)
    }

    #[must_use]
    pub fn has_weapon(&self) -> bool {
        [Hand::Left, Hand::Right]
            .into_iter()
            .filter_map(|hand| self.held(hand))
            .any(Item::is_weapon)
    }

    /// Release every sprite this humanoid registered.
    ///
    /// # Errors
    ///
    /// A registry error if a sprite was already detached elsewhere.
    pub fn detach(&mut self, components: &mut ComponentRegistries) -> ucs_core::Result<()> {
        for held in [self.left.take(), self.right.take()].into_iter().flatten() {
            components.sprites.detach(held.sprite)?;
        }
        if let Some(body) = self.body.take() {
            components.sprites.detach(body)?;
        }
        Ok(())
    }
}
