// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event dispatch on nodes and on the stage.

use super::id::{INVALID, NodeId};
use super::store::{NodeType, SceneGraph};
use crate::error::Result;
use crate::event::{Event, EventType};

impl SceneGraph {
    /// Delivers `event` to one node.
    ///
    /// Sets `event.target`, brings the node's coordinates up to date and
    /// fills `local_x`/`local_y` for touch events, runs the direct handler
    /// and then a snapshot of the listeners, and finally the node kind's
    /// built-in reaction (layer routing, scene membership, touch forwarding,
    /// rendering). There are no capture or bubble phases; forwarding is an
    /// explicit re-dispatch.
    ///
    /// # Errors
    ///
    /// The first listener or built-in error stops the dispatch and is
    /// returned.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn dispatch_event(&mut self, id: NodeId, event: &mut Event) -> Result<()> {
        self.validate(id);
        event.target = Some(id);
        if event.kind().is_touch() {
            self.update_coordinate(id.idx);
            let offset = self.offset[id.idx as usize];
            event.local_x = event.x - offset.x;
            event.local_y = event.y - offset.y;
        }

        let calls = self.targets[id.idx as usize].snapshot(event.kind());
        calls.run(self, event)?;

        // Listeners may have destroyed the receiver.
        if self.is_alive(id) {
            self.builtin(id, event)?;
        }
        Ok(())
    }

    /// Delivers `event` to the stage-level listeners.
    pub fn dispatch_stage_event(&mut self, event: &mut Event) -> Result<()> {
        event.target = None;
        let calls = self.stage_target.snapshot(event.kind());
        calls.run(self, event)
    }

    fn builtin(&mut self, id: NodeId, event: &mut Event) -> Result<()> {
        let ty = self.node_type(id);
        let kind = event.kind().clone();
        match kind {
            EventType::ChildAdded => {
                let child = event.require_node()?;
                match ty {
                    NodeType::Scene => self.route_child(id, child, event.next),
                    NodeType::Layer(_) => self.layer_attach(id, child, event.next),
                    NodeType::Group if self.managers[id.idx as usize].is_some() => {
                        self.dom_attach(id.idx, child.idx, event.next.map(|n| n.idx))
                    }
                    _ => Ok(()),
                }
            }
            EventType::ChildRemoved => {
                let child = event.require_node()?;
                match ty {
                    NodeType::Scene => self.unroute_child(child),
                    NodeType::Layer(_) => self.layer_detach(id, child),
                    NodeType::Group if self.managers[id.idx as usize].is_some() => {
                        self.dom_detach(id.idx, child.idx)
                    }
                    _ => Ok(()),
                }
            }
            EventType::AddedToScene | EventType::RemovedFromScene
                if ty == NodeType::Group =>
            {
                let scene = self.scene[id.idx as usize];
                for kid in self.child_indices(id.idx) {
                    let kid = self.id_at(kid);
                    if !self.is_alive(kid) {
                        continue;
                    }
                    self.scene[kid.idx as usize] = scene;
                    let mut forwarded = Event::new(kind.clone());
                    self.dispatch_event(kid, &mut forwarded)?;
                }
                Ok(())
            }
            EventType::TouchStart | EventType::TouchMove | EventType::TouchEnd => {
                let up = match ty {
                    NodeType::Scene => INVALID,
                    NodeType::Layer(_) => self.scene[id.idx as usize],
                    _ => self.parent[id.idx as usize],
                };
                match self.handle(up) {
                    Some(up) => self.dispatch_event(up, event),
                    None => Ok(()),
                }
            }
            EventType::Enter if ty == NodeType::Scene => self.scene_enter(id),
            EventType::Exit if ty == NodeType::Scene => self.scene_exit(id),
            EventType::ExitFrame if matches!(ty, NodeType::Layer(_)) => {
                if self.is_rendering(id.idx) {
                    self.render_layer(id.idx)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};

    use super::*;
    use crate::headless::test_graph;
    use crate::target::{Listener, listener};

    #[test]
    fn listener_removing_itself_keeps_snapshot_delivery() {
        let mut g = test_graph();
        let node = g.create_entity();
        let hits = Rc::new(Cell::new(0));

        let slot: Rc<RefCell<Option<Listener>>> = Rc::default();
        let self_ref = Rc::clone(&slot);
        let counter = Rc::clone(&hits);
        let remover = listener(move |g, e| {
            counter.set(counter.get() + 1);
            if let Some(me) = self_ref.borrow().as_ref() {
                let target = e.target.expect("dispatch sets target");
                g.remove_event_listener(target, &EventType::Render, me);
            }
            Ok(())
        });
        *slot.borrow_mut() = Some(Rc::clone(&remover));

        let counter = Rc::clone(&hits);
        g.add_event_listener(
            node,
            EventType::Render,
            listener(move |_, _| {
                counter.set(counter.get() + 10);
                Ok(())
            }),
        );
        // Registered last, so it runs first and removes itself mid-dispatch.
        g.add_event_listener(node, EventType::Render, remover);

        g.dispatch_event(node, &mut Event::new(EventType::Render)).unwrap();
        assert_eq!(hits.get(), 11, "both snapshotted listeners ran");
        g.dispatch_event(node, &mut Event::new(EventType::Render)).unwrap();
        assert_eq!(hits.get(), 21, "the remover is gone on the next dispatch");
    }

    #[test]
    fn listener_error_stops_dispatch() {
        let mut g = test_graph();
        let node = g.create_entity();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        g.add_event_listener(
            node,
            EventType::Render,
            listener(move |_, _| {
                flag.set(true);
                Ok(())
            }),
        );
        g.add_event_listener(
            node,
            EventType::Render,
            listener(|_, e| e.require_elapsed().map(|_| ())),
        );
        let err = g.dispatch_event(node, &mut Event::new(EventType::Render));
        assert!(err.is_err());
        assert!(!ran.get(), "later listeners do not run after an error");
    }

    #[test]
    fn touch_sets_local_coordinates_and_forwards_to_parent() {
        let mut g = test_graph();
        let group = g.create_group();
        let leaf = g.create_entity();
        g.add_child(group, leaf).unwrap();
        g.move_to(group, 10.0, 20.0);
        g.move_to(leaf, 5.0, 5.0);

        let seen = Rc::new(RefCell::new(Vec::new()));
        for id in [group, leaf] {
            let seen = Rc::clone(&seen);
            g.add_event_listener(
                id,
                EventType::TouchStart,
                listener(move |_, e| {
                    seen.borrow_mut().push((e.target, e.local_x, e.local_y));
                    Ok(())
                }),
            );
        }

        let mut e = Event::new(EventType::TouchStart).with_position(16.0, 27.0);
        g.dispatch_event(leaf, &mut e).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![(Some(leaf), 1.0, 2.0), (Some(group), 6.0, 7.0)]
        );
    }

    #[test]
    fn stage_events_have_no_target() {
        let mut g = test_graph();
        let hit = Rc::new(Cell::new(false));
        let flag = Rc::clone(&hit);
        g.stage_target_mut().add_event_listener(
            EventType::ExitFrame,
            listener(move |_, e| {
                flag.set(e.target.is_none());
                Ok(())
            }),
        );
        g.dispatch_stage_event(&mut Event::new(EventType::ExitFrame))
            .unwrap();
        assert!(hit.get());
    }
}
