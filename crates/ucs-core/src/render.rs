#![forbid(unsafe_code)]

//! Per-frame draw command list.
//!
//! Systems append [`DrawCommand`]s; a renderer outside this crate executes
//! them in [`RenderContext::sorted`] order (stage first, then order key).

use crate::geometry::{Position, Rect};

/// Render pass a command belongs to. Stages run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderStage {
    Default,
    /// Sprites hidden behind foreground tiles.
    Masked,
    Ui,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCommand {
    pub order: u32,
    pub stage: RenderStage,
    /// Source region of the texture.
    pub frame: Rect,
    /// Destination in world pixels.
    pub position: Position,
}

#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    commands: Vec<DrawCommand>,
}

impl RenderContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands in append order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands in execution order. Ties keep append order.
    #[must_use]
    pub fn sorted(&self) -> Vec<&DrawCommand> {
        let mut out: Vec<_> = self.commands.iter().collect();
        out.sort_by_key(|c| (c.stage, c.order));
        out
    }
}
