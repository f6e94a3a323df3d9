// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node action queues driven by `enterframe`.
//!
//! A [`Timeline`] belongs to one node and is created on first use. Adding an
//! action activates it: the timeline subscribes to its node's `enterframe`
//! and, on every frame, ticks the head of its queue by 1 (frame-based) or by
//! the frame's elapsed milliseconds (time-based). When the head finishes, it
//! is dequeued and whatever part of the tick it did not consume is handed to
//! the new head in the same frame. An empty queue deactivates the timeline.
//!
//! While a timeline is ticking it is checked out of the graph. Calls made
//! against it from inside its own listeners are queued and applied, in
//! order, as soon as the tick returns; [`skip`](TimelineRef::skip) and
//! [`next`](TimelineRef::next) cannot be deferred and fail with
//! [`SceneError::TimelineBusy`] instead.

mod action;
mod easing;
mod handle;
mod tween;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use tracing::{debug, trace, warn};

pub use action::{Action, Callback, callback};
pub use easing::Easing;
pub use handle::TimelineRef;
pub use tween::{Tween, TweenTarget};

use self::action::{ActionKind, Step};
use crate::error::{Result, SceneError};
use crate::event::{Event, EventType};
use crate::node::{NodeId, SceneGraph};
use crate::target::{EventTarget, Listener, listener};

/// Storage of a node's timeline.
pub(crate) enum TimelineSlot {
    /// Never used, or dropped with its node.
    Vacant,
    Ready(Box<Timeline>),
    /// Checked out by a running tick. Holds calls to replay afterwards.
    Busy(Vec<Deferred>),
}

/// A timeline call made while the timeline was checked out.
pub(crate) enum Deferred {
    Add(Action),
    And,
    Clear,
    Pause,
    Resume,
    Looped(bool),
    FrameBased(bool),
    Listen(EventType, Listener),
}

/// A node's action queue.
pub struct Timeline {
    node: NodeId,
    queue: VecDeque<Action>,
    paused: bool,
    looped: bool,
    frame_based: bool,
    /// The next [`add`](Self::add) joins the parallel action at the tail.
    parallel_pending: bool,
    target: EventTarget,
    /// `enterframe` subscription on the node while active.
    frame_listener: Option<Listener>,
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("node", &self.node)
            .field("queue", &self.queue)
            .field("paused", &self.paused)
            .field("looped", &self.looped)
            .field("frame_based", &self.frame_based)
            .field("active", &self.frame_listener.is_some())
            .finish_non_exhaustive()
    }
}

impl Timeline {
    fn new(node: NodeId, frame_based: bool) -> Self {
        Self {
            node,
            queue: VecDeque::new(),
            paused: false,
            looped: false,
            frame_based,
            parallel_pending: false,
            target: EventTarget::new(),
            frame_listener: None,
        }
    }

    // -- Queries --

    /// The node this timeline animates.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Number of queued actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The action that receives the next tick.
    #[must_use]
    pub fn head(&self) -> Option<&Action> {
        self.queue.front()
    }

    /// Queued actions, head first.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.queue.iter()
    }

    /// Returns whether ticks are ignored.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Returns whether finished actions are re-queued.
    #[must_use]
    pub fn is_looped(&self) -> bool {
        self.looped
    }

    /// Returns whether a frame counts as 1 rather than its elapsed time.
    #[must_use]
    pub fn is_frame_based(&self) -> bool {
        self.frame_based
    }

    /// Returns whether the timeline listens to its node's frames.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.frame_listener.is_some()
    }

    // -- Activation --

    fn activate(&mut self, g: &mut SceneGraph) {
        if self.frame_listener.is_some() || !g.is_alive(self.node) {
            return;
        }
        let node = self.node;
        let on_frame = listener(move |g, e| g.tick_timeline(node, e));
        g.add_event_listener(node, EventType::EnterFrame, Rc::clone(&on_frame));
        self.frame_listener = Some(on_frame);
        trace!(?node, "timeline activated");
    }

    fn deactivate(&mut self, g: &mut SceneGraph) {
        let Some(on_frame) = self.frame_listener.take() else {
            return;
        };
        if g.is_alive(self.node) {
            g.remove_event_listener(self.node, &EventType::EnterFrame, &on_frame);
        }
        trace!(node = ?self.node, "timeline deactivated");
    }

    // -- Queue operations --

    /// Queues `action` and activates the timeline.
    ///
    /// After [`and`](Self::and), the action joins the parallel action at the
    /// tail instead. Dispatches `addedtotimeline` on the action and
    /// `actionadded` on the timeline.
    fn add(&mut self, g: &mut SceneGraph, mut action: Action) -> Result<()> {
        self.activate(g);
        action.added(g, self.node)?;
        let pending = core::mem::take(&mut self.parallel_pending);
        let rest = match self.queue.back_mut() {
            Some(tail) if pending => tail.join(action).err(),
            _ => Some(action),
        };
        if let Some(action) = rest {
            self.queue.push_back(action);
        }

        let mut added = Event::new(EventType::ActionAdded).with_timeline(self.node);
        added.target = Some(self.node);
        let calls = self.target.snapshot(added.kind());
        calls.run(g, &mut added)
    }

    /// Makes the next added action run alongside the last queued one.
    fn and(&mut self) {
        let Some(last) = self.queue.pop_back() else {
            debug!(node = ?self.node, "and: empty timeline, ignoring");
            return;
        };
        let parallel = if matches!(last.kind, ActionKind::Parallel { .. }) {
            last
        } else {
            // A running head keeps its progress inside the wrapper.
            let started = last.started;
            let mut parallel = Action::parallel(alloc::vec![last]);
            parallel.started = started;
            parallel
        };
        self.queue.push_back(parallel);
        self.parallel_pending = true;
    }

    /// Drops every action, dispatching `removedfromtimeline` on each, and
    /// deactivates.
    fn clear(&mut self, g: &mut SceneGraph) -> Result<()> {
        let queue = core::mem::take(&mut self.queue);
        self.parallel_pending = false;
        self.deactivate(g);
        for mut action in queue {
            action.removed(g, self.node)?;
        }
        Ok(())
    }

    /// Ticks the head unless paused.
    fn tick(&mut self, g: &mut SceneGraph, elapsed: f64) -> Result<()> {
        if self.paused {
            return Ok(());
        }
        self.run(g, elapsed)
    }

    /// Dequeues the head, then keeps ticking new heads with overshoot.
    fn next(&mut self, g: &mut SceneGraph) -> Result<()> {
        match self.advance(g, 0.0)? {
            Some(carry) => self.run(g, carry),
            None => Ok(()),
        }
    }

    /// Ticks heads until one is still running, the queue empties, or no
    /// time is left to hand over.
    fn run(&mut self, g: &mut SceneGraph, elapsed: f64) -> Result<()> {
        let node = self.node;
        let mut elapsed = elapsed;
        // Consecutive zero-duration completions within this call.
        let mut instant = 0_usize;
        loop {
            let Some(head) = self.queue.front_mut() else {
                return Ok(());
            };
            if !head.started {
                head.start(g, node)?;
                if !g.is_alive(node) {
                    return Ok(());
                }
            }
            let Some(head) = self.queue.front_mut() else {
                return Ok(());
            };
            let zero = head.time == Some(0.0);
            let step = head.tick(g, node, elapsed)?;
            if !g.is_alive(node) {
                return Ok(());
            }
            let Step::Finished(overshoot) = step else {
                return Ok(());
            };
            trace!(?node, overshoot, "action finished");

            instant = if zero { instant + 1 } else { 0 };
            let Some(carry) = self.advance(g, overshoot)? else {
                return Ok(());
            };
            if self.looped && instant >= self.queue.len() {
                warn!(?node, "looped timeline holds only zero-duration actions; stopping for this frame");
                return Ok(());
            }
            elapsed = carry;
        }
    }

    /// Dequeues the head, dispatching `actionend` and `removedfromtimeline`,
    /// and re-queues it when looped.
    ///
    /// Returns the time to hand to the new head in the same frame: the
    /// overshoot when positive, or zero when the new head takes no time.
    fn advance(&mut self, g: &mut SceneGraph, remaining: f64) -> Result<Option<f64>> {
        if let Some(mut action) = self.queue.pop_front() {
            if self.queue.is_empty() {
                self.parallel_pending = false;
            }
            action.end(g, self.node)?;
            if self.looped {
                self.add(g, action)?;
            }
        }
        if self.queue.is_empty() {
            self.deactivate(g);
            return Ok(None);
        }
        let instant = self.queue.front().is_some_and(|a| a.time == Some(0.0));
        Ok((remaining > 0.0 || instant).then_some(remaining))
    }

    fn apply(&mut self, g: &mut SceneGraph, op: Deferred) -> Result<()> {
        match op {
            Deferred::Add(action) => self.add(g, action),
            Deferred::And => {
                self.and();
                Ok(())
            }
            Deferred::Clear => self.clear(g),
            Deferred::Pause => {
                self.paused = true;
                Ok(())
            }
            Deferred::Resume => {
                self.paused = false;
                Ok(())
            }
            Deferred::Looped(looped) => {
                self.looped = looped;
                Ok(())
            }
            Deferred::FrameBased(frame_based) => {
                self.frame_based = frame_based;
                Ok(())
            }
            Deferred::Listen(kind, l) => {
                self.target.add_event_listener(kind, l);
                Ok(())
            }
        }
    }
}

impl SceneGraph {
    /// Returns the node's timeline, if it was ever used and is not ticking.
    #[must_use]
    pub fn timeline(&self, node: NodeId) -> Option<&Timeline> {
        self.validate(node);
        match &self.timelines[node.idx as usize] {
            TimelineSlot::Ready(tl) => Some(tl),
            TimelineSlot::Vacant | TimelineSlot::Busy(_) => None,
        }
    }

    /// Returns a handle for building and driving the node's timeline.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn tl(&mut self, node: NodeId) -> TimelineRef<'_> {
        self.validate(node);
        TimelineRef::new(self, node)
    }

    /// Runs `f` with the node's timeline checked out, creating it if needed,
    /// then replays calls deferred while it ran.
    pub(crate) fn with_timeline<R>(
        &mut self,
        node: NodeId,
        f: impl FnOnce(&mut Self, &mut Timeline) -> Result<R>,
    ) -> Result<R> {
        let i = node.idx as usize;
        let mut tl = match core::mem::replace(&mut self.timelines[i], TimelineSlot::Busy(Vec::new())) {
            TimelineSlot::Ready(tl) => tl,
            TimelineSlot::Vacant => {
                Box::new(Timeline::new(node, self.config.frame_based_timelines))
            }
            busy @ TimelineSlot::Busy(_) => {
                self.timelines[i] = busy;
                return Err(SceneError::TimelineBusy(node));
            }
        };

        let result = f(self, &mut tl);

        if !self.is_alive(node) {
            // Freed while checked out; its slot belongs to someone else now.
            return result;
        }
        let deferred = match core::mem::replace(&mut self.timelines[i], TimelineSlot::Ready(tl)) {
            TimelineSlot::Busy(ops) => ops,
            TimelineSlot::Ready(_) | TimelineSlot::Vacant => Vec::new(),
        };
        let out = result?;
        if !deferred.is_empty() {
            self.replay_deferred(node, deferred)?;
        }
        Ok(out)
    }

    /// Applies calls queued while the node's timeline was checked out.
    ///
    /// Calls made during the replay are deferred again and replayed by the
    /// nested checkout.
    fn replay_deferred(&mut self, node: NodeId, ops: Vec<Deferred>) -> Result<()> {
        debug!(?node, count = ops.len(), "replaying deferred timeline calls");
        self.with_timeline(node, |g, tl| {
            for op in ops {
                tl.apply(g, op)?;
            }
            Ok(())
        })
    }

    /// Applies `op` now, or queues it if the timeline is ticking.
    pub(crate) fn timeline_op(&mut self, node: NodeId, op: Deferred) -> Result<()> {
        if let TimelineSlot::Busy(ops) = &mut self.timelines[node.idx as usize] {
            ops.push(op);
            return Ok(());
        }
        self.with_timeline(node, |g, tl| tl.apply(g, op))
    }

    /// Advances the node's timeline for one `enterframe`.
    pub(crate) fn tick_timeline(&mut self, node: NodeId, frame: &Event) -> Result<()> {
        self.with_timeline(node, |g, tl| {
            let mut event = frame.clone();
            let calls = tl.target.snapshot(event.kind());
            calls.run(g, &mut event)?;
            let elapsed = if tl.frame_based {
                1.0
            } else {
                frame.require_elapsed()?
            };
            tl.tick(g, elapsed)
        })
    }

    /// Clears the node's timeline as part of [`remove`](Self::remove).
    pub(crate) fn clear_timeline_on_remove(&mut self, node: NodeId) -> Result<()> {
        match &self.timelines[node.idx as usize] {
            TimelineSlot::Vacant => Ok(()),
            TimelineSlot::Ready(_) | TimelineSlot::Busy(_) => {
                self.timeline_op(node, Deferred::Clear)
            }
        }
    }

    /// Ticks `frames` times of 1 (frame-based) or once by `frames`
    /// (time-based).
    pub(crate) fn skip_timeline(&mut self, node: NodeId, frames: u32) -> Result<()> {
        self.with_timeline(node, |g, tl| {
            if tl.frame_based {
                for _ in 0..frames {
                    tl.tick(g, 1.0)?;
                }
                Ok(())
            } else {
                tl.tick(g, f64::from(frames))
            }
        })
    }

    /// Dequeues the head of the node's timeline.
    pub(crate) fn next_timeline(&mut self, node: NodeId) -> Result<()> {
        self.with_timeline(node, |g, tl| tl.next(g))
    }
}
