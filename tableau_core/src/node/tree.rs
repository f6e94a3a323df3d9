// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child add/insert/remove protocol and node teardown.

use alloc::vec::Vec;

use tracing::debug;

use super::id::{INVALID, NodeId};
use super::store::{NodeKind, SceneGraph};
use crate::error::{Result, SceneError};
use crate::event::{Event, EventType};

impl SceneGraph {
    // -- Topology API --

    /// Appends `child` to `parent`.
    ///
    /// See [`insert_child`](Self::insert_child).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_child(parent, child, None)
    }

    /// Inserts `child` into `parent` right before `reference`.
    ///
    /// See [`insert_child`](Self::insert_child).
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<()> {
        self.insert_child(parent, child, Some(reference))
    }

    /// Inserts `child` into `parent` before `reference`, or appends it.
    ///
    /// A child that already has a parent is removed from it first. Then:
    ///
    /// 1. `childadded` (with `node` and `next`) is dispatched on `parent`.
    /// 2. `added` is dispatched on `child`.
    /// 3. If `parent` belongs to a scene, `child` joins it and receives
    ///    `addedtoscene`, which groups forward to their subtree.
    ///
    /// # Errors
    ///
    /// Fails before touching the graph if `parent` cannot own children, if
    /// `child` is a scene or layer, if `child` is `parent` or one of its
    /// ancestors, or if `reference` is not a child of `parent`. Under a
    /// scene, `reference` must also be routed to the same layer backend as
    /// `child`. Listener
    /// errors propagate after the structural change has been made.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.validate(parent);
        self.validate(child);
        if let Some(r) = reference {
            self.validate(r);
        }
        let (p, c) = (parent.idx, child.idx);

        if matches!(self.kind[p as usize], NodeKind::Entity) {
            return Err(SceneError::NotAGroup(parent));
        }
        if matches!(
            self.kind[c as usize],
            NodeKind::Scene(_) | NodeKind::Layer(_)
        ) {
            return Err(SceneError::SceneAsChild(child));
        }
        if self.is_ancestor_or_self(c, p) {
            return Err(SceneError::CycleDetected { parent, child });
        }
        self.check_reference(parent, child, reference)?;

        if self.parent[c as usize] != INVALID {
            let old = self.id_at(self.parent[c as usize]);
            self.remove_child(old, child)?;
            // Listeners of the removal may have moved the reference.
            self.check_reference(parent, child, reference)?;
        }

        self.link(p, c, reference.map(|r| r.idx));
        self.mark_dirty(c);

        let mut added = Event::new(EventType::ChildAdded)
            .with_node(child)
            .with_next(reference);
        self.dispatch_event(parent, &mut added)?;
        self.dispatch_event(child, &mut Event::new(EventType::Added))?;

        let scene = self.scene_index(p);
        if scene != INVALID && self.is_alive(child) {
            self.scene[c as usize] = scene;
            self.dispatch_event(child, &mut Event::new(EventType::AddedToScene))?;
        }
        Ok(())
    }

    /// Detaches `child` from `parent`.
    ///
    /// Dispatches `childremoved` on `parent`, `removed` on `child`, and, if
    /// the child was in a scene, `removedfromscene` on its subtree. Removing
    /// a node that is not a child of `parent` does nothing.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.validate(parent);
        self.validate(child);
        let c = child.idx;
        if self.parent[c as usize] != parent.idx {
            debug!(?parent, ?child, "remove_child: not a child, ignoring");
            return Ok(());
        }

        self.unlink(c);
        self.mark_dirty(c);

        let mut removed = Event::new(EventType::ChildRemoved).with_node(child);
        self.dispatch_event(parent, &mut removed)?;
        self.dispatch_event(child, &mut Event::new(EventType::Removed))?;

        if self.scene[c as usize] != INVALID && self.is_alive(child) {
            self.scene[c as usize] = INVALID;
            self.dispatch_event(child, &mut Event::new(EventType::RemovedFromScene))?;
        }
        Ok(())
    }

    /// Tears a node out of the graph without freeing it.
    ///
    /// Detaches the node from its parent, removes every descendant the same
    /// way (last child first), clears all listeners and handlers, and clears
    /// the node's timeline so no per-frame subscription outlives it. If the
    /// timeline is ticking right now, the clear happens when the tick returns.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.validate(id);
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id)?;
        }
        if !self.is_alive(id) {
            return Ok(());
        }
        let kids: Vec<NodeId> = self.children(id).collect();
        for kid in kids.into_iter().rev() {
            if self.is_alive(kid) {
                self.remove(kid)?;
            }
        }
        self.targets[id.idx as usize].clear();
        self.clear_timeline_on_remove(id)
    }

    /// Removes a node and frees it and its subtree.
    ///
    /// A scene also frees its layers. Every handle into the freed subtree
    /// becomes stale.
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        self.validate(id);
        let mut doomed = self.subtree(id.idx);
        if let NodeKind::Scene(state) = &self.kind[id.idx as usize] {
            doomed.extend(state.layers.iter().flatten().map(|l| l.idx));
        }
        self.remove(id)?;
        for idx in doomed {
            if self.is_alive(self.id_at(idx)) {
                self.drop_managers(idx);
                self.free_slot(idx);
            }
        }
        Ok(())
    }

    // -- Internal helpers --

    fn check_reference(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let Some(r) = reference else {
            return Ok(());
        };
        let misplaced = r == child || self.parent[r.idx as usize] != parent.idx;
        // Scene children are painted by per-backend layers; a hint can only
        // order siblings within one of them.
        let crosses_layers = matches!(self.kind[parent.idx as usize], NodeKind::Scene(_))
            && self.routed_backend(r.idx) != self.routed_backend(child.idx);
        if misplaced || crosses_layers {
            return Err(SceneError::InvalidInsertionPoint {
                parent,
                reference: r,
            });
        }
        Ok(())
    }

    /// The scene a node under `idx` would join, or [`INVALID`].
    pub(crate) fn scene_index(&self, idx: u32) -> u32 {
        match self.kind[idx as usize] {
            NodeKind::Scene(_) => idx,
            _ => self.scene[idx as usize],
        }
    }

    /// Links `c` under `p`, before `before` or last.
    fn link(&mut self, p: u32, c: u32, before: Option<u32>) {
        self.parent[c as usize] = p;
        match before {
            Some(s) => {
                let prev = self.prev_sibling[s as usize];
                self.next_sibling[c as usize] = s;
                self.prev_sibling[c as usize] = prev;
                if prev != INVALID {
                    self.next_sibling[prev as usize] = c;
                } else {
                    // `s` was the first child.
                    self.first_child[p as usize] = c;
                }
                self.prev_sibling[s as usize] = c;
            }
            None => {
                self.next_sibling[c as usize] = INVALID;
                self.prev_sibling[c as usize] = INVALID;
                if self.first_child[p as usize] == INVALID {
                    self.first_child[p as usize] = c;
                } else {
                    // Walk to last child.
                    let mut last = self.first_child[p as usize];
                    while self.next_sibling[last as usize] != INVALID {
                        last = self.next_sibling[last as usize];
                    }
                    self.next_sibling[last as usize] = c;
                    self.prev_sibling[c as usize] = last;
                }
            }
        }
    }

    /// Removes `idx` from its parent's child list.
    fn unlink(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use core::cell::RefCell;

    use super::*;
    use crate::headless::test_graph;
    use crate::target::listener;

    type Log = Rc<RefCell<Vec<String>>>;

    fn record(g: &mut SceneGraph, id: NodeId, kind: EventType, tag: &'static str, log: &Log) {
        let log = Rc::clone(log);
        g.add_event_listener(
            id,
            kind,
            listener(move |_, e| {
                log.borrow_mut().push(alloc::format!("{tag}:{}", e.kind()));
                Ok(())
            }),
        );
    }

    #[test]
    fn single_parent_invariant() {
        let mut g = test_graph();
        let p1 = g.create_group();
        let p2 = g.create_group();
        let child = g.create_entity();
        g.add_child(p1, child).unwrap();
        g.add_child(p2, child).unwrap();
        assert_eq!(g.parent(child), Some(p2));
        assert!(g.children(p1).next().is_none());
        assert_eq!(g.children(p2).collect::<Vec<_>>(), vec![child]);
    }

    #[test]
    fn insert_before_works() {
        let mut g = test_graph();
        let p = g.create_group();
        let a = g.create_entity();
        let b = g.create_entity();
        let c = g.create_entity();
        g.add_child(p, a).unwrap();
        g.add_child(p, c).unwrap();
        g.insert_before(p, b, c).unwrap();
        assert_eq!(g.children(p).collect::<Vec<_>>(), vec![a, b, c]);

        // Reordering within the same parent.
        g.insert_before(p, c, a).unwrap();
        assert_eq!(g.children(p).collect::<Vec<_>>(), vec![c, a, b]);
    }

    #[test]
    fn structural_misuse_is_rejected() {
        let mut g = test_graph();
        let group = g.create_group();
        let inner = g.create_group();
        let leaf = g.create_entity();
        let stranger = g.create_entity();
        g.add_child(group, inner).unwrap();

        assert!(matches!(
            g.add_child(leaf, stranger),
            Err(SceneError::NotAGroup(n)) if n == leaf
        ));
        assert!(matches!(
            g.add_child(inner, group),
            Err(SceneError::CycleDetected { .. })
        ));
        assert!(matches!(
            g.add_child(group, group),
            Err(SceneError::CycleDetected { .. })
        ));
        assert!(matches!(
            g.insert_before(group, leaf, stranger),
            Err(SceneError::InvalidInsertionPoint { reference, .. }) if reference == stranger
        ));
        assert_eq!(g.parent(leaf), None, "rejected insert leaves the graph alone");
    }

    #[test]
    fn removing_a_non_child_is_a_noop() {
        let mut g = test_graph();
        let p = g.create_group();
        let other = g.create_group();
        let child = g.create_entity();
        g.add_child(p, child).unwrap();
        g.remove_child(other, child).unwrap();
        assert_eq!(g.parent(child), Some(p));
    }

    #[test]
    fn add_dispatches_in_protocol_order() {
        let mut g = test_graph();
        let log: Log = Rc::default();
        let p = g.create_group();
        let child = g.create_entity();
        record(&mut g, p, EventType::ChildAdded, "parent", &log);
        record(&mut g, child, EventType::Added, "child", &log);
        record(&mut g, p, EventType::ChildRemoved, "parent", &log);
        record(&mut g, child, EventType::Removed, "child", &log);

        g.add_child(p, child).unwrap();
        g.remove_child(p, child).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                "parent:childadded".to_string(),
                "child:added".to_string(),
                "parent:childremoved".to_string(),
                "child:removed".to_string(),
            ]
        );
    }

    #[test]
    fn childadded_carries_next_reference() {
        let mut g = test_graph();
        let p = g.create_group();
        let a = g.create_entity();
        let b = g.create_entity();
        g.add_child(p, a).unwrap();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        g.add_event_listener(
            p,
            EventType::ChildAdded,
            listener(move |_, e| {
                *sink.borrow_mut() = Some((e.require_node()?, e.next));
                Ok(())
            }),
        );
        g.insert_before(p, b, a).unwrap();
        assert_eq!(*seen.borrow(), Some((b, Some(a))));
    }

    #[test]
    fn remove_recurses_and_clears_listeners() {
        let mut g = test_graph();
        let root = g.create_group();
        let mid = g.create_group();
        let leaf = g.create_entity();
        g.add_child(root, mid).unwrap();
        g.add_child(mid, leaf).unwrap();
        g.add_event_listener(leaf, EventType::Render, listener(|_, _| Ok(())));

        g.remove(mid).unwrap();
        assert_eq!(g.parent(mid), None);
        assert_eq!(g.parent(leaf), None);
        assert!(g.children(root).next().is_none());
        assert_eq!(g.target_mut(leaf).listener_count(&EventType::Render), 0);
    }

    #[test]
    fn destroy_frees_whole_subtree() {
        let mut g = test_graph();
        let root = g.create_group();
        let leaf = g.create_entity();
        g.add_child(root, leaf).unwrap();
        g.destroy(root).unwrap();
        assert!(!g.is_alive(root));
        assert!(!g.is_alive(leaf));
        assert_eq!(g.node_count(), 0);
    }
}
