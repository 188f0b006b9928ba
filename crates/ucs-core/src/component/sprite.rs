//! Sprite frames drawn at the owner's position.

use crate::component::{Component, Registry};
use crate::geometry::{Offset, Rect};
use crate::render::{DrawCommand, RenderContext, RenderStage};
use crate::scene::Cores;

/// Ordering key of sprite draw commands within the masked stage.
pub const SPRITE_ORDER: u32 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sprite {
    /// Region of the sprite sheet; `None` draws nothing.
    pub frame: Option<Rect>,
    pub offset: Offset,
}

impl Sprite {
    #[must_use]
    pub fn new(frame: Option<Rect>, offset: Offset) -> Self {
        Self { frame, offset }
    }
}

impl Component for Sprite {
    const KIND: &'static str = "sprite";
}

/// Append one masked draw command per visible sprite of an active owner.
pub fn update(sprites: &Registry<Sprite>, cores: &Cores<'_>, ctx: &mut RenderContext) {
    for (owner, sprite) in sprites.iter() {
        let Some(frame) = sprite.frame else { continue };
        let Some(core) = cores.get(owner).filter(|core| core.is_active()) else {
            continue;
        };
        ctx.push(DrawCommand {
            order: SPRITE_ORDER,
            stage: RenderStage::Masked,
            frame,
            position: core.position + sprite.offset,
        });
    }
}
