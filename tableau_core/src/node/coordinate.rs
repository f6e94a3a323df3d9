// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy world-transform resolution and overlap tests.

use alloc::vec;

use kurbo::{Affine, Vec2};

use super::id::{INVALID, NodeId};
use super::store::SceneGraph;
use crate::matrix::{MatrixStack, make_transform_matrix, multiply, offset_of};

impl SceneGraph {
    /// Returns the node's world matrix, recomputing the dirty spine first.
    pub fn matrix(&mut self, id: NodeId) -> Affine {
        self.validate(id);
        self.update_coordinate(id.idx);
        self.world[id.idx as usize]
    }

    /// Returns the node's world offset: how far its origin moved from its
    /// local position. Treated as the top-left of its box by hit tests.
    pub fn offset(&mut self, id: NodeId) -> Vec2 {
        self.validate(id);
        self.update_coordinate(id.idx);
        self.offset[id.idx as usize]
    }

    /// Returns whether the offset boxes of `a` and `b` overlap.
    pub fn intersect(&mut self, a: NodeId, b: NodeId) -> bool {
        let (oa, ob) = (self.offset(a), self.offset(b));
        let (pa, pb) = (self.props(a), self.props(b));
        oa.x < ob.x + pb.width
            && ob.x < oa.x + pa.width
            && oa.y < ob.y + pb.height
            && ob.y < oa.y + pa.height
    }

    /// Returns whether the box centers of `a` and `b` are closer than
    /// `distance`.
    ///
    /// Without a distance, the mean of the four half-extents is used.
    pub fn within(&mut self, a: NodeId, b: NodeId, distance: Option<f64>) -> bool {
        let (oa, ob) = (self.offset(a), self.offset(b));
        let (pa, pb) = (self.props(a), self.props(b));
        let distance =
            distance.unwrap_or((pa.width + pa.height + pb.width + pb.height) / 4.0);
        let dx = oa.x - ob.x + (pa.width - pb.width) / 2.0;
        let dy = oa.y - ob.y + (pa.height - pb.height) / 2.0;
        dx * dx + dy * dy < distance * distance
    }

    /// Recomputes the world matrix and offset of `idx` and of every dirty
    /// ancestor on the way up.
    ///
    /// The climb stops at the first clean node; its cached matrix is the
    /// base the spine is composed onto. A dirty root is recomputed from the
    /// identity. A clean `idx` costs nothing.
    pub(crate) fn update_coordinate(&mut self, idx: u32) {
        let mut spine = vec![idx];
        let mut node = idx;
        while self.dirty[node as usize] && self.parent[node as usize] != INVALID {
            node = self.parent[node as usize];
            spine.push(node);
        }

        let mut stack = MatrixStack::new();
        let mut todo = spine.len();
        if !self.dirty[node as usize] {
            stack.push(self.world[node as usize]);
            todo -= 1;
        }

        for &i in spine[..todo].iter().rev() {
            let props = &self.props[i as usize];
            let world = multiply(stack.top(), make_transform_matrix(props));
            self.offset[i as usize] = offset_of(world, props);
            self.world[i as usize] = world;
            self.dirty[i as usize] = false;
            stack.push(world);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::test_graph;

    const EPS: f64 = 1e-9;

    #[test]
    fn nested_translation_composes() {
        let mut g = test_graph();
        let outer = g.create_group();
        let inner = g.create_group();
        let leaf = g.create_entity();
        g.add_child(outer, inner).unwrap();
        g.add_child(inner, leaf).unwrap();
        g.move_to(outer, 100.0, 0.0);
        g.move_to(inner, 0.0, 50.0);
        g.move_to(leaf, 1.0, 2.0);

        let off = g.offset(leaf);
        assert!((off.x - 101.0).abs() < EPS && (off.y - 52.0).abs() < EPS, "got {off:?}");
        assert!(!g.is_dirty(outer), "spine is resolved");
    }

    #[test]
    fn clean_read_is_idempotent() {
        let mut g = test_graph();
        let parent = g.create_group();
        let leaf = g.create_entity();
        g.add_child(parent, leaf).unwrap();
        g.set_rotation(parent, 45.0);
        g.set_size(leaf, 10.0, 10.0);

        let first = g.matrix(leaf);
        let first_offset = g.offset(leaf);
        // Corrupt the parent's cache: a clean leaf must not climb to it.
        g.world[parent.idx as usize] = Affine::scale(100.0);
        let second = g.matrix(leaf);
        assert_eq!(first, second);
        assert_eq!(first_offset, g.offset(leaf));
        assert!(!g.is_dirty(leaf) && !g.is_dirty(parent));
    }

    #[test]
    fn climb_stops_at_clean_ancestor() {
        let mut g = test_graph();
        let root = g.create_group();
        let leaf = g.create_entity();
        g.add_child(root, leaf).unwrap();
        g.move_to(root, 3.0, 4.0);
        let _ = g.matrix(root);

        g.move_to(leaf, 1.0, 1.0);
        assert!(g.is_dirty(leaf) && !g.is_dirty(root));
        let off = g.offset(leaf);
        assert!((off.x - 4.0).abs() < EPS && (off.y - 5.0).abs() < EPS, "got {off:?}");
    }

    #[test]
    fn overlap_tests_use_offsets() {
        let mut g = test_graph();
        let a = g.create_entity();
        let b = g.create_entity();
        g.set_size(a, 10.0, 10.0);
        g.set_size(b, 10.0, 10.0);
        g.move_to(b, 9.0, 9.0);
        assert!(g.intersect(a, b));
        assert!(g.within(a, b, Some(13.0)));
        assert!(!g.within(a, b, None), "default distance is 10");

        g.move_to(b, 10.0, 0.0);
        assert!(!g.intersect(a, b), "touching edges do not overlap");
    }
}
