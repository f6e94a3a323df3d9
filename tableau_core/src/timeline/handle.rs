// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chainable access to a node's timeline.

use alloc::vec::Vec;

use super::action::{Action, Callback, callback};
use super::easing::Easing;
use super::tween::Tween;
use super::Deferred;
use crate::error::Result;
use crate::event::EventType;
use crate::node::{NodeId, NodeProperty, SceneGraph};
use crate::target::{Listener, listener};

/// A borrowed handle on one node's timeline, from [`SceneGraph::tl`].
///
/// Every builder returns the handle again so calls chain:
///
/// ```
/// # use tableau_core::{Easing, HeadlessPlatform, SceneGraph, StageConfig};
/// # fn main() -> tableau_core::Result<()> {
/// let mut g = SceneGraph::new(Box::new(HeadlessPlatform::new()), StageConfig::default());
/// let bear = g.create_entity();
/// g.tl(bear)
///     .move_by(100.0, 0.0, 30.0, Easing::QuadOut)?
///     .and()?
///     .fade_out(30.0, Easing::Linear)?
///     .remove_from_scene()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TimelineRef<'g> {
    graph: &'g mut SceneGraph,
    node: NodeId,
}

impl<'g> TimelineRef<'g> {
    pub(crate) fn new(graph: &'g mut SceneGraph, node: NodeId) -> Self {
        Self { graph, node }
    }

    fn op(&mut self, op: Deferred) -> Result<&mut Self> {
        self.graph.timeline_op(self.node, op)?;
        Ok(self)
    }

    // -- Queue control --

    /// Queues an action, or a [`Tween`].
    pub fn add(&mut self, action: impl Into<Action>) -> Result<&mut Self> {
        self.op(Deferred::Add(action.into()))
    }

    /// Runs the next added action alongside the last queued one.
    pub fn and(&mut self) -> Result<&mut Self> {
        self.op(Deferred::And)
    }

    /// Drops every queued action.
    pub fn clear(&mut self) -> Result<&mut Self> {
        self.op(Deferred::Clear)
    }

    /// Ignores frames until [`resume`](Self::resume).
    pub fn pause(&mut self) -> Result<&mut Self> {
        self.op(Deferred::Pause)
    }

    /// Undoes [`pause`](Self::pause).
    pub fn resume(&mut self) -> Result<&mut Self> {
        self.op(Deferred::Resume)
    }

    /// Re-queues each action as it finishes.
    pub fn set_looped(&mut self, looped: bool) -> Result<&mut Self> {
        self.op(Deferred::Looped(looped))
    }

    /// Counts every frame as 1.
    pub fn set_frame_based(&mut self) -> Result<&mut Self> {
        self.op(Deferred::FrameBased(true))
    }

    /// Counts every frame as its elapsed milliseconds.
    pub fn set_time_based(&mut self) -> Result<&mut Self> {
        self.op(Deferred::FrameBased(false))
    }

    /// Listens on the timeline itself (`actionadded`, `enterframe`).
    pub fn add_event_listener(&mut self, kind: EventType, listener: Listener) -> Result<&mut Self> {
        self.op(Deferred::Listen(kind, listener))
    }

    /// Ends the head now and lets the following heads run.
    ///
    /// # Errors
    ///
    /// [`SceneError::TimelineBusy`](crate::SceneError::TimelineBusy) when
    /// called from inside the timeline's own tick.
    pub fn next(&mut self) -> Result<&mut Self> {
        self.graph.next_timeline(self.node)?;
        Ok(self)
    }

    /// Advances `frames` frames at once, or `frames` milliseconds on a
    /// time-based timeline. Does nothing while paused.
    ///
    /// # Errors
    ///
    /// [`SceneError::TimelineBusy`](crate::SceneError::TimelineBusy) when
    /// called from inside the timeline's own tick.
    pub fn skip(&mut self, frames: u32) -> Result<&mut Self> {
        self.graph.skip_timeline(self.node, frames)?;
        Ok(self)
    }

    // -- Scheduling --

    /// Waits `time`.
    pub fn delay(&mut self, time: f64) -> Result<&mut Self> {
        self.add(Action::timed(time))
    }

    /// Runs `f` once, taking no time.
    pub fn then<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: Fn(&mut SceneGraph, NodeId) -> Result<()> + 'static,
    {
        self.add(Action::timed(0.0).on_tick(callback(f)))
    }

    /// Runs each callback once its time since the cue was queued has passed.
    pub fn cue(&mut self, cues: impl IntoIterator<Item = (f64, Callback)>) -> Result<&mut Self> {
        let mut cues: Vec<_> = cues.into_iter().collect();
        cues.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut prev = 0.0;
        for (time, f) in cues {
            self.delay(time - prev)?;
            self.add(Action::timed(0.0).on_tick(f))?;
            prev = time;
        }
        Ok(self)
    }

    /// Runs `f` on every frame for `time`.
    pub fn repeat<F>(&mut self, f: F, time: f64) -> Result<&mut Self>
    where
        F: Fn(&mut SceneGraph, NodeId) -> Result<()> + 'static,
    {
        self.add(Action::timed(time).on_tick(callback(f)))
    }

    /// Holds the queue until `pred` returns `true`, checked every frame.
    pub fn wait_until<F>(&mut self, pred: F) -> Result<&mut Self>
    where
        F: Fn(&mut SceneGraph, NodeId) -> Result<bool> + 'static,
    {
        let check = listener(move |g, e| {
            if pred(g, e.require_timeline()?)? {
                e.request_next();
            }
            Ok(())
        });
        self.add(Action::open_ended().with_listener(EventType::ActionTick, check))
    }

    /// Queues a tween.
    pub fn tween(&mut self, tween: Tween) -> Result<&mut Self> {
        self.add(tween)
    }

    // -- Motion --

    /// Moves to `(x, y)`.
    pub fn move_to(&mut self, x: f64, y: f64, time: f64, easing: Easing) -> Result<&mut Self> {
        self.tween(
            Tween::new(time)
                .easing(easing)
                .to(NodeProperty::X, x)
                .to(NodeProperty::Y, y),
        )
    }

    /// Moves by `(dx, dy)`.
    pub fn move_by(&mut self, dx: f64, dy: f64, time: f64, easing: Easing) -> Result<&mut Self> {
        self.tween(
            Tween::new(time)
                .easing(easing)
                .by(NodeProperty::X, dx)
                .by(NodeProperty::Y, dy),
        )
    }

    /// Moves horizontally to `x`.
    pub fn move_x(&mut self, x: f64, time: f64, easing: Easing) -> Result<&mut Self> {
        self.tween(Tween::new(time).easing(easing).to(NodeProperty::X, x))
    }

    /// Moves vertically to `y`.
    pub fn move_y(&mut self, y: f64, time: f64, easing: Easing) -> Result<&mut Self> {
        self.tween(Tween::new(time).easing(easing).to(NodeProperty::Y, y))
    }

    /// Scales to `(sx, sy)`.
    pub fn scale_to(&mut self, sx: f64, sy: f64, time: f64, easing: Easing) -> Result<&mut Self> {
        self.tween(
            Tween::new(time)
                .easing(easing)
                .to(NodeProperty::ScaleX, sx)
                .to(NodeProperty::ScaleY, sy),
        )
    }

    /// Multiplies the scale by `(sx, sy)`.
    pub fn scale_by(&mut self, sx: f64, sy: f64, time: f64, easing: Easing) -> Result<&mut Self> {
        self.tween(
            Tween::new(time)
                .easing(easing)
                .times(NodeProperty::ScaleX, sx)
                .times(NodeProperty::ScaleY, sy),
        )
    }

    /// Rotates to `degrees`.
    pub fn rotate_to(&mut self, degrees: f64, time: f64, easing: Easing) -> Result<&mut Self> {
        self.tween(Tween::new(time).easing(easing).to(NodeProperty::Rotation, degrees))
    }

    /// Rotates by `degrees`.
    pub fn rotate_by(&mut self, degrees: f64, time: f64, easing: Easing) -> Result<&mut Self> {
        self.tween(Tween::new(time).easing(easing).by(NodeProperty::Rotation, degrees))
    }

    /// Fades to `opacity`.
    pub fn fade_to(&mut self, opacity: f64, time: f64, easing: Easing) -> Result<&mut Self> {
        self.tween(Tween::new(time).easing(easing).to(NodeProperty::Opacity, opacity))
    }

    /// Fades to fully opaque.
    pub fn fade_in(&mut self, time: f64, easing: Easing) -> Result<&mut Self> {
        self.fade_to(1.0, time, easing)
    }

    /// Fades to fully transparent.
    pub fn fade_out(&mut self, time: f64, easing: Easing) -> Result<&mut Self> {
        self.fade_to(0.0, time, easing)
    }

    /// Makes the node opaque, taking no time.
    pub fn show(&mut self) -> Result<&mut Self> {
        self.then(|g, n| {
            g.set_opacity(n, 1.0);
            Ok(())
        })
    }

    /// Makes the node transparent, taking no time.
    pub fn hide(&mut self) -> Result<&mut Self> {
        self.then(|g, n| {
            g.set_opacity(n, 0.0);
            Ok(())
        })
    }

    /// Removes the node from its parent. This clears the timeline too, so it
    /// is normally the last call of a chain.
    pub fn remove_from_scene(&mut self) -> Result<&mut Self> {
        self.then(|g, n| g.remove(n))
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};

    use super::*;
    use crate::event::Event;
    use crate::headless::test_graph;

    fn frames(g: &mut SceneGraph, node: NodeId, n: usize) {
        for _ in 0..n {
            let mut e = Event::new(EventType::EnterFrame).with_elapsed(1.0);
            g.dispatch_event(node, &mut e).unwrap();
        }
    }

    #[test]
    fn cue_fires_in_time_order() {
        let mut g = test_graph();
        let node = g.create_entity();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let record = |tag: u32| {
            let hits = Rc::clone(&hits);
            callback(move |_, _| {
                hits.borrow_mut().push(tag);
                Ok(())
            })
        };
        g.tl(node).cue(vec![(5.0, record(5)), (2.0, record(2))]).unwrap();
        frames(&mut g, node, 1);
        assert!(hits.borrow().is_empty());
        frames(&mut g, node, 1);
        assert_eq!(*hits.borrow(), [2]);
        frames(&mut g, node, 3);
        assert_eq!(*hits.borrow(), [2, 5]);
    }

    #[test]
    fn repeat_runs_every_frame_for_its_duration() {
        let mut g = test_graph();
        let node = g.create_entity();
        g.tl(node)
            .repeat(
                |g, n| {
                    g.move_by(n, 1.0, 0.0);
                    Ok(())
                },
                3.0,
            )
            .unwrap();
        frames(&mut g, node, 5);
        assert_eq!(g.props(node).x, 3.0);
    }

    #[test]
    fn wait_until_holds_the_queue() {
        let mut g = test_graph();
        let node = g.create_entity();
        let go = Rc::new(Cell::new(false));
        let flag = Rc::clone(&go);
        g.tl(node)
            .wait_until(move |_, _| Ok(flag.get()))
            .unwrap()
            .hide()
            .unwrap();
        frames(&mut g, node, 4);
        assert_eq!(g.props(node).opacity, 1.0);
        go.set(true);
        frames(&mut g, node, 1);
        assert_eq!(g.props(node).opacity, 0.0, "hide runs in the releasing frame");
        assert!(g.timeline(node).unwrap().is_empty());
    }

    #[test]
    fn scale_by_multiplies() {
        let mut g = test_graph();
        let node = g.create_entity();
        g.set_scale_x(node, 2.0);
        g.tl(node).scale_by(3.0, 0.5, 2.0, Easing::Linear).unwrap();
        frames(&mut g, node, 2);
        let p = g.props(node);
        assert!((p.scale_x - 6.0).abs() < 1e-12);
        assert!((p.scale_y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rotate_and_move_helpers_compose() {
        let mut g = test_graph();
        let node = g.create_entity();
        g.tl(node)
            .move_to(10.0, 20.0, 2.0, Easing::Linear)
            .unwrap()
            .move_x(0.0, 1.0, Easing::Linear)
            .unwrap()
            .and()
            .unwrap()
            .rotate_by(90.0, 1.0, Easing::Linear)
            .unwrap();
        frames(&mut g, node, 3);
        let p = g.props(node);
        assert_eq!((p.x, p.y, p.rotation), (0.0, 20.0, 90.0));
    }

    #[test]
    fn remove_from_scene_detaches_and_stops() {
        let mut g = test_graph();
        let group = g.create_group();
        let node = g.create_entity();
        g.add_child(group, node).unwrap();
        g.tl(node)
            .fade_out(1.0, Easing::Linear)
            .unwrap()
            .remove_from_scene()
            .unwrap()
            .delay(5.0)
            .unwrap();
        frames(&mut g, node, 1);
        assert_eq!(g.parent(node), None);
        assert!(g.timeline(node).unwrap().is_empty(), "remove clears the rest");
    }

    #[test]
    fn time_based_switch_uses_elapsed() {
        let mut g = test_graph();
        let node = g.create_entity();
        g.tl(node)
            .set_time_based()
            .unwrap()
            .move_x(100.0, 100.0, Easing::Linear)
            .unwrap();
        let mut e = Event::new(EventType::EnterFrame).with_elapsed(25.0);
        g.dispatch_event(node, &mut e).unwrap();
        assert_eq!(g.props(node).x, 25.0);
        assert!(!g.timeline(node).unwrap().is_frame_based());
    }
}
