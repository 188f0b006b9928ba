#![forbid(unsafe_code)]

//! Resumable units of deferred work.
//!
//! An [`Action`] is invoked once per frame until it reports `true`. Whatever
//! progress it needs to resume (elapsed time, a sub-action cursor) lives in
//! the action value itself; nothing is reset between invocations.
//!
//! # Invariants
//!
//! 1. [`SequenceAction`] advances at most one sub-action per invocation, so
//!    the next sub-action starts the frame after the previous one finished.
//! 2. An empty sequence finishes on its first invocation.
//! 3. Spawn and destroy actions always finish on their first invocation.
//!
//! # Failure Modes
//!
//! - A sub-action error propagates out of its composite unchanged. There is
//!   no retry; the driver drops the failing action and returns the error.

use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

use crate::actor::{ActorId, SpawnFn, Spawned};
use crate::clock::Clock;
use crate::component::ComponentRegistries;
use crate::error::Result;
use crate::scene::Scene;
use crate::ui::Ui;

/// What an action may touch while it runs.
pub struct ActionContext<'a> {
    scene: &'a mut Scene,
    ui: &'a mut dyn Ui,
    clock: &'a dyn Clock,
    queue: &'a ActionQueue,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        scene: &'a mut Scene,
        ui: &'a mut dyn Ui,
        clock: &'a dyn Clock,
        queue: &'a ActionQueue,
    ) -> Self {
        Self {
            scene,
            ui,
            clock,
            queue,
        }
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        self.scene
    }

    #[must_use]
    pub fn ui(&self) -> &dyn Ui {
        self.ui
    }

    pub fn ui_mut(&mut self) -> &mut dyn Ui {
        self.ui
    }

    #[must_use]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// The pending-action queue this action was taken from.
    #[must_use]
    pub fn queue(&self) -> &ActionQueue {
        self.queue
    }
}

/// A unit of work that may span several frames.
pub trait Action {
    /// Advance one frame. Returns `true` once finished.
    ///
    /// # Errors
    ///
    /// Any error ends the action; composites pass it through unchanged.
    fn invoke(&mut self, cx: &mut ActionContext<'_>) -> Result<bool>;

    /// Short name for logs.
    fn name(&self) -> &'static str {
        let full = type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl fmt::Debug for dyn Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Action").field(&self.name()).finish()
    }
}

// ----------------------------------------------------------------------------
// Composites
// ----------------------------------------------------------------------------

/// Runs its sub-actions one after another.
#[derive(Debug, Default)]
pub struct SequenceAction {
    actions: Vec<Box<dyn Action>>,
    cursor: usize,
}

impl SequenceAction {
    #[must_use]
    pub fn new(actions: Vec<Box<dyn Action>>) -> Self {
        Self { actions, cursor: 0 }
    }

    /// Append a sub-action.
    #[must_use]
    pub fn then(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Sub-actions that have finished so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Action for SequenceAction {
    fn invoke(&mut self, cx: &mut ActionContext<'_>) -> Result<bool> {
        let Some(current) = self.actions.get_mut(self.cursor) else {
            return Ok(true);
        };
        if current.invoke(cx)? {
            tracing::trace!(step = self.cursor, action = current.name(), "sequence step finished");
            self.cursor += 1;
        }
        Ok(self.cursor >= self.actions.len())
    }
}

/// Finishes once `duration` has elapsed since its first invocation.
#[derive(Debug, Clone)]
pub struct WaitAction {
    duration: Duration,
    started: Option<Instant>,
}

impl WaitAction {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: None,
        }
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Action for WaitAction {
    fn invoke(&mut self, cx: &mut ActionContext<'_>) -> Result<bool> {
        let now = cx.now();
        let started = *self.started.get_or_insert(now);
        Ok(now.saturating_duration_since(started) >= self.duration)
    }
}

// ----------------------------------------------------------------------------
// Scene membership
// ----------------------------------------------------------------------------

/// Adds actors to the scene. Finishes on the first invocation.
#[derive(Default)]
pub struct SpawnActorsAction {
    factories: Vec<SpawnFn>,
    spawned: Vec<ActorId>,
}

impl SpawnActorsAction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(
        mut self,
        factory: impl FnOnce(ActorId, &mut ComponentRegistries) -> Result<Spawned> + 'static,
    ) -> Self {
        self.factories.push(Box::new(factory));
        self
    }

    /// Ids of the actors spawned by the invocation.
    #[must_use]
    pub fn spawned(&self) -> &[ActorId] {
        &self.spawned
    }
}

impl fmt::Debug for SpawnActorsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnActorsAction")
            .field("pending", &self.factories.len())
            .field("spawned", &self.spawned)
            .finish()
    }
}

impl Action for SpawnActorsAction {
    fn invoke(&mut self, cx: &mut ActionContext<'_>) -> Result<bool> {
        for factory in self.factories.drain(..) {
            let id = cx.scene_mut().spawn(factory)?;
            self.spawned.push(id);
        }
        Ok(true)
    }
}

/// Marks actors inactive; the next scene pass destroys them.
#[derive(Debug, Clone, Default)]
pub struct DestroyActorsAction {
    actors: Vec<ActorId>,
}

impl DestroyActorsAction {
    #[must_use]
    pub fn new(actors: impl IntoIterator<Item = ActorId>) -> Self {
        Self {
            actors: actors.into_iter().collect(),
        }
    }
}

impl Action for DestroyActorsAction {
    fn invoke(&mut self, cx: &mut ActionContext<'_>) -> Result<bool> {
        for &id in &self.actors {
            if !cx.scene_mut().deactivate(id) {
                tracing::debug!(actor = %id, "destroy target already gone or inactive");
            }
        }
        Ok(true)
    }
}

// ----------------------------------------------------------------------------
// Leaf actions
// ----------------------------------------------------------------------------

/// Runs a closure each frame until it returns `true`.
pub struct FuncAction<F> {
    func: F,
}

impl<F> FuncAction<F>
where
    F: FnMut(&mut ActionContext<'_>) -> Result<bool>,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Action for FuncAction<F>
where
    F: FnMut(&mut ActionContext<'_>) -> Result<bool>,
{
    fn invoke(&mut self, cx: &mut ActionContext<'_>) -> Result<bool> {
        (self.func)(cx)
    }
}

/// Shows a message, then waits until the prompt is dismissed.
#[derive(Debug, Clone)]
pub struct ShowMessageAction {
    text: String,
    shown: bool,
}

impl ShowMessageAction {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            shown: false,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Action for ShowMessageAction {
    fn invoke(&mut self, cx: &mut ActionContext<'_>) -> Result<bool> {
        if !self.shown {
            cx.ui_mut().show_message(&self.text);
            self.shown = true;
            return Ok(false);
        }
        Ok(!cx.ui().prompt_active())
    }
}

// ----------------------------------------------------------------------------
// Queue
// ----------------------------------------------------------------------------

/// Shared handle over the pending-action list.
///
/// Clones point at the same list, so a reaction can hold one and enqueue
/// work for the driver.
#[derive(Clone, Default)]
pub struct ActionQueue {
    pending: Rc<RefCell<Vec<Box<dyn Action>>>>,
}

impl ActionQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, action: impl Action + 'static) {
        self.push_boxed(Box::new(action));
    }

    pub fn push_boxed(&self, action: Box<dyn Action>) {
        tracing::trace!(action = action.name(), "action queued");
        self.pending.borrow_mut().push(action);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Names of the pending actions, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.pending.borrow().iter().map(|a| a.name()).collect()
    }

    /// Remove and return everything pending.
    pub fn take_all(&self) -> Vec<Box<dyn Action>> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    /// Put `kept` back in front of anything queued since it was taken.
    pub fn restore(&self, kept: Vec<Box<dyn Action>>) {
        let mut pending = self.pending.borrow_mut();
        let newer = std::mem::replace(&mut *pending, kept);
        pending.extend(newer);
    }

    /// Invoke every pending action once, including actions queued while
    /// this runs, and keep the unfinished ones in order.
    ///
    /// # Errors
    ///
    /// The first action error. The failing action is dropped; every other
    /// pending action stays queued.
    pub fn run(&self, cx: &mut ActionContext<'_>) -> Result<usize> {
        let mut kept = Vec::new();
        let mut finished = 0;
        loop {
            let batch = self.take_all();
            if batch.is_empty() {
                break;
            }
            let mut batch = batch.into_iter();
            while let Some(mut action) = batch.next() {
                match action.invoke(cx) {
                    Ok(true) => {
                        tracing::trace!(action = action.name(), "action finished");
                        finished += 1;
                    }
                    Ok(false) => kept.push(action),
                    Err(err) => {
                        tracing::warn!(action = action.name(), error = %err, "action failed");
                        kept.extend(batch);
                        self.restore(kept);
                        return Err(err);
                    }
                }
            }
        }
        self.restore(kept);
        Ok(finished)
    }
}

impl fmt::Debug for ActionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionQueue")
            .field("pending", &self.names())
            .finish()
    }
}
