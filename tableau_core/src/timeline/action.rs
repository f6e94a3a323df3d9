// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Queue entries of a timeline.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use super::tween::Tween;
use crate::error::Result;
use crate::event::{Event, EventType};
use crate::node::{NodeId, SceneGraph};
use crate::target::{EventTarget, Listener, listener};

/// A callback run against the node that owns the timeline.
pub type Callback = Rc<dyn Fn(&mut SceneGraph, NodeId) -> Result<()>>;

/// Wraps a closure as a [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&mut SceneGraph, NodeId) -> Result<()> + 'static,
{
    Rc::new(f)
}

/// Outcome of one `actiontick`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Step {
    /// Still running.
    Running,
    /// Finished, with the unconsumed part of the tick.
    Finished(f64),
}

pub(crate) enum ActionKind {
    Basic,
    Tween(Tween),
    Parallel {
        /// Children still running.
        actions: Vec<Action>,
        /// Children that finished, restored when the parallel is re-queued.
        ended: Vec<Action>,
    },
}

/// A unit of timeline work.
///
/// A timed action finishes once its accumulated `frame` reaches `time`; an
/// open-ended one runs until the timeline is advanced externally or a tick
/// listener calls [`Event::request_next`]. Actions are event targets: they
/// receive `addedtotimeline`, `actionstart`, `actiontick`, `actionend` and
/// `removedfromtimeline`, with `timeline` set to the owning node.
pub struct Action {
    pub(crate) time: Option<f64>,
    pub(crate) frame: f64,
    pub(crate) started: bool,
    pub(crate) kind: ActionKind,
    target: EventTarget,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            ActionKind::Basic => "basic",
            ActionKind::Tween(_) => "tween",
            ActionKind::Parallel { .. } => "parallel",
        };
        f.debug_struct("Action")
            .field("kind", &kind)
            .field("time", &self.time)
            .field("frame", &self.frame)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl Action {
    /// Creates an action lasting `time` (frames or milliseconds, depending
    /// on the timeline), or open-ended for `None`.
    #[must_use]
    pub fn new(time: Option<f64>) -> Self {
        Self::with_kind(time, ActionKind::Basic)
    }

    /// Creates an action lasting `time`.
    #[must_use]
    pub fn timed(time: f64) -> Self {
        Self::new(Some(time))
    }

    /// Creates an action that only ends when advanced.
    #[must_use]
    pub fn open_ended() -> Self {
        Self::new(None)
    }

    /// Creates an action that runs `actions` side by side and ends when the
    /// last of them does.
    #[must_use]
    pub fn parallel(actions: Vec<Self>) -> Self {
        Self::with_kind(
            None,
            ActionKind::Parallel {
                actions,
                ended: Vec::new(),
            },
        )
    }

    pub(crate) fn with_kind(time: Option<f64>, kind: ActionKind) -> Self {
        Self {
            time,
            frame: 0.0,
            started: false,
            kind,
            target: EventTarget::new(),
        }
    }

    /// Fills the direct handler slot for `kind`. Runs before listeners.
    #[must_use]
    pub fn with_handler(mut self, kind: EventType, handler: Listener) -> Self {
        self.target.set_handler(kind, Some(handler));
        self
    }

    /// Adds a listener for `kind`.
    #[must_use]
    pub fn with_listener(mut self, kind: EventType, listener: Listener) -> Self {
        self.target.add_event_listener(kind, listener);
        self
    }

    /// Runs `callback` on every tick.
    #[must_use]
    pub fn on_tick(self, callback: Callback) -> Self {
        self.with_handler(
            EventType::ActionTick,
            listener(move |g, e| callback(g, e.require_timeline()?)),
        )
    }

    /// Returns the listener registry.
    pub fn target_mut(&mut self) -> &mut EventTarget {
        &mut self.target
    }

    /// Duration, or `None` for open-ended actions.
    #[must_use]
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    /// Progress accumulated so far.
    #[must_use]
    pub fn frame(&self) -> f64 {
        self.frame
    }

    /// Returns whether `actionstart` was delivered since the action was
    /// queued.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Children of a parallel action that are still running.
    #[must_use]
    pub fn parallel_actions(&self) -> &[Self] {
        match &self.kind {
            ActionKind::Parallel { actions, .. } => actions,
            _ => &[],
        }
    }

    /// Adds `action` to a parallel action's running children. Other kinds
    /// hand it back.
    pub(crate) fn join(&mut self, action: Self) -> Result<(), Self> {
        match &mut self.kind {
            ActionKind::Parallel { actions, .. } => {
                actions.push(action);
                Ok(())
            }
            ActionKind::Basic | ActionKind::Tween(_) => Err(action),
        }
    }

    // -- Lifecycle --

    fn emit(&self, g: &mut SceneGraph, node: NodeId, event: &mut Event) -> Result<()> {
        event.target = Some(node);
        event.timeline = Some(node);
        let calls = self.target.snapshot(event.kind());
        calls.run(g, event)
    }

    /// `addedtotimeline`: rewinds the action.
    pub(crate) fn added(&mut self, g: &mut SceneGraph, node: NodeId) -> Result<()> {
        self.emit(g, node, &mut Event::new(EventType::AddedToTimeline))?;
        self.frame = 0.0;
        self.started = false;
        if let ActionKind::Parallel { actions, .. } = &mut self.kind {
            for a in actions {
                a.added(g, node)?;
            }
        }
        Ok(())
    }

    /// `removedfromtimeline`: rewinds the action. A parallel action gets its
    /// finished children back, ahead of any that never finished.
    pub(crate) fn removed(&mut self, g: &mut SceneGraph, node: NodeId) -> Result<()> {
        self.emit(g, node, &mut Event::new(EventType::RemovedFromTimeline))?;
        self.frame = 0.0;
        self.started = false;
        if let ActionKind::Parallel { actions, ended } = &mut self.kind {
            let mut remaining = core::mem::take(actions);
            for a in &mut remaining {
                a.frame = 0.0;
                a.started = false;
            }
            *actions = core::mem::take(ended);
            actions.extend(remaining);
        }
        Ok(())
    }

    /// `actionstart`, fanned out to parallel children.
    pub(crate) fn start(&mut self, g: &mut SceneGraph, node: NodeId) -> Result<()> {
        self.started = true;
        self.emit(g, node, &mut Event::new(EventType::ActionStart))?;
        match &mut self.kind {
            ActionKind::Basic => Ok(()),
            ActionKind::Tween(tween) => {
                tween.capture(g, node);
                Ok(())
            }
            ActionKind::Parallel { actions, .. } => {
                for a in actions {
                    a.start(g, node)?;
                }
                Ok(())
            }
        }
    }

    /// `actionend` followed by `removedfromtimeline`.
    pub(crate) fn end(&mut self, g: &mut SceneGraph, node: NodeId) -> Result<()> {
        self.emit(g, node, &mut Event::new(EventType::ActionEnd))?;
        self.removed(g, node)
    }

    /// One `actiontick` of `elapsed`.
    ///
    /// Listeners run first, then the kind's own work, then the frame
    /// bookkeeping. The action finishes when `time` is exhausted, when a
    /// listener requested it, or, for a parallel action, when every child has
    /// finished.
    pub(crate) fn tick(&mut self, g: &mut SceneGraph, node: NodeId, elapsed: f64) -> Result<Step> {
        let mut event = Event::new(EventType::ActionTick).with_elapsed(elapsed);
        self.emit(g, node, &mut event)?;
        if !g.is_alive(node) {
            return Ok(Step::Running);
        }

        let mut drained = false;
        match &mut self.kind {
            ActionKind::Basic => {}
            ActionKind::Tween(tween) => {
                if let Some(time) = self.time {
                    tween.apply(g, node, time, self.frame, elapsed);
                }
            }
            ActionKind::Parallel { actions, ended } => {
                let mut i = 0;
                while i < actions.len() {
                    // Children queued after the parent started begin here.
                    if !actions[i].started {
                        actions[i].start(g, node)?;
                    }
                    match actions[i].tick(g, node, elapsed)? {
                        Step::Running => i += 1,
                        Step::Finished(_) => {
                            let mut done = actions.remove(i);
                            done.end(g, node)?;
                            ended.push(done);
                        }
                    }
                }
                drained = actions.is_empty();
            }
        }

        let Some(time) = self.time else {
            self.frame += elapsed;
            return Ok(if drained || event.next_requested() {
                Step::Finished(0.0)
            } else {
                Step::Running
            });
        };
        let remaining = time - (self.frame + elapsed);
        if remaining <= 0.0 {
            self.frame = time;
            Ok(Step::Finished(if remaining < 0.0 { -remaining } else { 0.0 }))
        } else {
            self.frame += elapsed;
            Ok(if event.next_requested() {
                Step::Finished(0.0)
            } else {
                Step::Running
            })
        }
    }
}
