// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canvas layer: immediate-mode redraw and geometric hit testing.

use alloc::rc::Rc;

use kurbo::{Point, Rect};

use super::LayerBackend;
use crate::error::Result;
use crate::event::{Event, EventType};
use crate::matrix::{MatrixStack, make_transform_matrix, multiply, offset_of};
use crate::node::{NodeId, SceneGraph};
use crate::platform::ElementId;

/// Determinants below this are treated as degenerate.
const MIN_DETERMINANT: f64 = 1e-12;

pub(crate) struct CanvasLayer;

impl LayerBackend for CanvasLayer {
    fn attach(_graph: &mut SceneGraph, _layer: u32, _child: u32, _next: Option<u32>) -> Result<()> {
        // The child is drawn from the paint list on the next render.
        Ok(())
    }

    fn detach(_graph: &mut SceneGraph, _layer: u32, _child: u32) -> Result<()> {
        Ok(())
    }

    fn render(graph: &mut SceneGraph, layer: u32) -> Result<()> {
        let Some(canvas) = graph.layer_state(layer).map(|s| s.element) else {
            return Ok(());
        };
        graph.platform.clear(canvas);
        let mut stack = MatrixStack::new();
        graph.render_canvas_node(canvas, layer, 1.0, &mut stack)
    }

    fn hit_target(graph: &mut SceneGraph, layer: u32, point: Point) -> Option<NodeId> {
        graph.canvas_hit(layer, point).map(|i| graph.id_at(i))
    }
}

impl SceneGraph {
    /// Draws `idx` and, if visible, its subtree.
    fn render_canvas_node(
        &mut self,
        canvas: ElementId,
        idx: u32,
        alpha: f64,
        stack: &mut MatrixStack,
    ) -> Result<()> {
        let id = self.id_at(idx);
        let i = idx as usize;
        self.platform.save(canvas);
        self.dispatch_event(id, &mut Event::new(EventType::Render))?;
        if !self.is_alive(id) {
            self.platform.restore(canvas);
            return Ok(());
        }

        let world = if self.dirty[i] {
            let world = multiply(stack.top(), make_transform_matrix(&self.props[i]));
            self.world[i] = world;
            self.offset[i] = offset_of(world, &self.props[i]);
            self.dirty[i] = false;
            world
        } else {
            self.world[i]
        };
        self.transform_changed[i] = false;
        stack.push(world);
        self.platform.set_transform(canvas, world);

        let props = &self.props[i];
        if props.visible {
            let alpha = alpha * props.opacity;
            self.platform.set_global_alpha(canvas, alpha);
            if let Some(color) = &props.background_color {
                let rect = Rect::new(0.0, 0.0, props.width, props.height);
                self.platform.fill_rect(canvas, rect, color);
            }
            if let Some(renderer) = self.renderer[i].as_ref().map(Rc::clone) {
                renderer.canvas_render(&self.props[i], canvas, &mut *self.platform);
            }
            for child in self.paint_children(idx) {
                self.render_canvas_node(canvas, child, alpha, stack)?;
            }
        }

        stack.pop();
        self.platform.restore(canvas);
        Ok(())
    }

    /// Returns the top-most visible, touchable node under `point`.
    ///
    /// Walks in reverse paint order, so later siblings and children win over
    /// what they are drawn on top of. Invisible nodes hide their subtree.
    pub(crate) fn canvas_hit(&mut self, idx: u32, point: Point) -> Option<u32> {
        for child in self.paint_children(idx).into_iter().rev() {
            if !self.props[child as usize].visible {
                continue;
            }
            if let Some(hit) = self.canvas_hit(child, point) {
                return Some(hit);
            }
            if self.contains_point(child, point) {
                return Some(child);
            }
        }
        None
    }

    fn contains_point(&mut self, idx: u32, point: Point) -> bool {
        let p = &self.props[idx as usize];
        if !p.touch_enabled || p.width <= 0.0 || p.height <= 0.0 {
            return false;
        }
        self.update_coordinate(idx);
        let world = self.world[idx as usize];
        if world.determinant().abs() < MIN_DETERMINANT {
            return false;
        }
        let local = world.inverse() * point;
        let p = &self.props[idx as usize];
        (0.0..=p.width).contains(&local.x) && (0.0..=p.height).contains(&local.y)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec;
    use alloc::vec::Vec;

    use kurbo::Affine;

    use super::*;
    use crate::headless::{CanvasCommand, test_graph_with_probe};
    use crate::layer::Backend;

    fn filled(commands: &[CanvasCommand]) -> Vec<(Rect, String)> {
        commands
            .iter()
            .filter_map(|c| match c {
                CanvasCommand::FillRect(r, color) => Some((*r, color.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn render_walks_in_paint_order_with_balanced_state() {
        let (mut g, probe) = test_graph_with_probe();
        let scene = g.create_scene().unwrap();
        let a = g.create_entity();
        let b = g.create_entity();
        for (n, color) in [(a, "red"), (b, "blue")] {
            g.set_size(n, 4.0, 4.0);
            g.set_background_color(n, Some(color.to_string()));
            g.add_child(scene, n).unwrap();
        }
        let layer = g.layer(scene, Backend::Canvas).unwrap();
        let canvas = g.layer_element(layer).unwrap();
        g.render_layer(layer.idx).unwrap();

        let cmds = probe.commands(canvas);
        assert_eq!(cmds.first(), Some(&CanvasCommand::Clear));
        let colors: Vec<_> = filled(&cmds).into_iter().map(|(_, c)| c).collect();
        assert_eq!(colors, vec!["red".to_string(), "blue".to_string()]);
        let saves = cmds.iter().filter(|c| **c == CanvasCommand::Save).count();
        let restores = cmds.iter().filter(|c| **c == CanvasCommand::Restore).count();
        assert_eq!(saves, 3, "layer plus two children");
        assert_eq!(saves, restores);
    }

    #[test]
    fn hidden_subtree_is_skipped_and_alpha_compounds() {
        let (mut g, probe) = test_graph_with_probe();
        let scene = g.create_scene().unwrap();
        let group = g.create_group();
        let leaf = g.create_entity();
        g.set_size(leaf, 2.0, 2.0);
        g.set_background_color(leaf, Some("green".to_string()));
        g.add_child(group, leaf).unwrap();
        g.add_child(scene, group).unwrap();
        g.set_opacity(group, 0.5);
        g.set_opacity(leaf, 0.5);
        let layer = g.layer(scene, Backend::Canvas).unwrap();
        let canvas = g.layer_element(layer).unwrap();

        g.render_layer(layer.idx).unwrap();
        let cmds = probe.commands(canvas);
        assert!(cmds.contains(&CanvasCommand::GlobalAlpha(0.25)));

        probe.clear_commands();
        g.set_visible(group, false);
        g.render_layer(layer.idx).unwrap();
        assert!(filled(&probe.commands(canvas)).is_empty());
    }

    #[test]
    fn child_transform_composes_with_layer() {
        let (mut g, probe) = test_graph_with_probe();
        let scene = g.create_scene().unwrap();
        let leaf = g.create_entity();
        g.add_child(scene, leaf).unwrap();
        g.move_to(scene, 10.0, 0.0);
        g.move_to(leaf, 0.0, 5.0);
        let layer = g.layer(scene, Backend::Canvas).unwrap();
        let canvas = g.layer_element(layer).unwrap();
        g.render_layer(layer.idx).unwrap();

        assert!(
            probe
                .commands(canvas)
                .contains(&CanvasCommand::SetTransform(Affine::translate((10.0, 5.0)))),
            "leaf drawn at layer offset plus its own"
        );
    }

    #[test]
    fn hit_test_prefers_topmost_and_respects_rotation() {
        let (mut g, _probe) = test_graph_with_probe();
        let scene = g.create_scene().unwrap();
        let below = g.create_entity();
        let above = g.create_entity();
        g.set_size(below, 100.0, 100.0);
        g.set_size(above, 10.0, 10.0);
        g.move_to(above, 20.0, 20.0);
        g.add_child(scene, below).unwrap();
        g.add_child(scene, above).unwrap();

        assert_eq!(g.determine_event_target(scene, Point::new(25.0, 25.0)), above);
        assert_eq!(g.determine_event_target(scene, Point::new(60.0, 60.0)), below);
        assert_eq!(g.determine_event_target(scene, Point::new(150.0, 5.0)), scene);

        // Rotated 45 degrees about its center, the box corner moves out.
        g.set_rotation(above, 45.0);
        assert_eq!(g.determine_event_target(scene, Point::new(20.5, 20.5)), below);
        assert_eq!(g.determine_event_target(scene, Point::new(25.0, 18.0)), above);

        g.set_touch_enabled(above, false);
        assert_eq!(g.determine_event_target(scene, Point::new(25.0, 25.0)), below);
    }
}
