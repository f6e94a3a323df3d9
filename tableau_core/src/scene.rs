// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenes: display roots that route children to backend layers.
//!
//! A scene owns a container element and up to one layer per [`Backend`].
//! Layers are created lazily, the first time a child needs them, and are
//! inserted into the container by priority so the DOM layer always sits
//! above the canvas layer.
//!
//! Children stay linked under the scene in the node tree; the scene
//! additionally records them in exactly one layer's paint list. A child with
//! a native element goes to the DOM layer, anything else to the canvas layer.
//! The choice is made once, when the child is added.

use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::Point;
use tracing::debug;

use crate::error::{Result, SceneError};
use crate::event::{Event, EventType};
use crate::layer::dom::{DomManager, Manager};
use crate::layer::{Backend, LayerState};
use crate::node::{INVALID, NodeId, NodeKind, SceneGraph, pixel_extent};
use crate::platform::ElementId;
use crate::target::{Listener, listener};

/// State carried by scene nodes.
pub(crate) struct SceneState {
    pub(crate) element: ElementId,
    /// Layers indexed by [`Backend::priority`].
    pub(crate) layers: [Option<NodeId>; 2],
    pub(crate) entered: bool,
    /// Stage `exitframe` subscription while the scene is entered.
    pub(crate) exit_frame: Option<Listener>,
}

impl SceneState {
    fn new(element: ElementId) -> Self {
        Self {
            element,
            layers: [None; 2],
            entered: false,
            exit_frame: None,
        }
    }
}

impl SceneGraph {
    /// Creates a scene sized to the stage, with no layers yet.
    pub fn create_scene(&mut self) -> Result<NodeId> {
        let element = self.platform.create_element("div")?;
        self.platform.set_style(element, "position", "absolute");
        self.platform.set_style(element, "overflow", "hidden");
        let id = self.alloc(NodeKind::Scene(SceneState::new(element)));
        let (w, h) = (self.config.width, self.config.height);
        self.set_size(id, w, h);
        debug!(?id, ?element, "scene created");
        Ok(id)
    }

    /// Returns the container element of a scene.
    #[must_use]
    pub fn scene_element(&self, scene: NodeId) -> Option<ElementId> {
        self.validate(scene);
        self.scene_state(scene.idx).map(|s| s.element)
    }

    /// Returns the scene's layer for `backend`, if it was created.
    #[must_use]
    pub fn layer(&self, scene: NodeId, backend: Backend) -> Option<NodeId> {
        self.validate(scene);
        self.scene_state(scene.idx)?.layers[backend.priority()]
    }

    /// Returns the scene's layer for `backend`, creating it if needed.
    ///
    /// A new layer copies the scene's geometry and is inserted into the
    /// scene container below every higher-priority layer. If the scene is
    /// entered, the layer starts rendering right away.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAScene`] if `scene` is not a scene, or a platform
    /// error if the layer element cannot be created.
    pub fn add_layer(&mut self, scene: NodeId, backend: Backend) -> Result<NodeId> {
        self.validate(scene);
        let Some(state) = self.scene_state(scene.idx) else {
            return Err(SceneError::NotAScene(scene));
        };
        if let Some(existing) = state.layers[backend.priority()] {
            return Ok(existing);
        }
        let container = state.element;
        let entered = state.entered;
        let above = state.layers[backend.priority() + 1..]
            .iter()
            .flatten()
            .next()
            .copied();

        let s = scene.idx as usize;
        let element = match backend {
            Backend::Dom => self.platform.create_element("div")?,
            Backend::Canvas => self.platform.create_canvas(
                pixel_extent(self.props[s].width),
                pixel_extent(self.props[s].height),
            )?,
        };
        self.platform.set_style(element, "position", "absolute");

        let layer = self.alloc(NodeKind::Layer(LayerState::new(backend, element)));
        let l = layer.idx as usize;
        self.scene[l] = scene.idx;
        let geometry = self.props[s].clone();
        let props = &mut self.props[l];
        props.x = geometry.x;
        props.y = geometry.y;
        props.scale_x = geometry.scale_x;
        props.scale_y = geometry.scale_y;
        props.rotation = geometry.rotation;
        props.origin_x = geometry.origin_x;
        props.origin_y = geometry.origin_y;
        props.width = geometry.width;
        props.height = geometry.height;

        if backend == Backend::Dom {
            self.platform.set_style(element, "transform-origin", "0px 0px");
            self.managers[l] = Some(Manager::Dom(DomManager::new(element, false, Some(layer))));
        }

        let reference = above.and_then(|a| self.layer_state(a.idx).map(|st| st.element));
        self.platform.insert_before(container, element, reference);
        if let Some(state) = self.scene_state_mut(scene.idx) {
            state.layers[backend.priority()] = Some(layer);
        }
        debug!(?scene, ?layer, ?backend, "layer created");

        if entered {
            self.start_rendering(layer.idx)?;
        }
        Ok(layer)
    }

    /// Resolves the node a pointer at `point` targets.
    ///
    /// Layers are asked from the top down; if none reports a hit, the scene
    /// itself is the target.
    pub fn determine_event_target(&mut self, scene: NodeId, point: Point) -> NodeId {
        self.validate(scene);
        let layers = self
            .scene_state(scene.idx)
            .map(|s| s.layers)
            .unwrap_or_default();
        layers
            .iter()
            .rev()
            .flatten()
            .find_map(|layer| self.layer_hit_target(layer.idx, point))
            .unwrap_or(scene)
    }

    // -- Internal helpers --

    fn scene_state(&self, idx: u32) -> Option<&SceneState> {
        match &self.kind[idx as usize] {
            NodeKind::Scene(state) => Some(state),
            _ => None,
        }
    }

    fn scene_state_mut(&mut self, idx: u32) -> Option<&mut SceneState> {
        match &mut self.kind[idx as usize] {
            NodeKind::Scene(state) => Some(state),
            _ => None,
        }
    }

    /// Raw indices of a scene's layers, lowest priority first. Empty for
    /// anything that is not a scene.
    pub(crate) fn scene_layer_indices(&self, idx: u32) -> Vec<u32> {
        self.scene_state(idx)
            .map(|s| s.layers.iter().flatten().map(|l| l.idx).collect())
            .unwrap_or_default()
    }

    /// The layer backend a scene child is painted by.
    pub(crate) fn routed_backend(&self, idx: u32) -> Backend {
        if self.element[idx as usize].is_some() {
            Backend::Dom
        } else {
            Backend::Canvas
        }
    }

    /// Sends a child the scene just received to the matching layer.
    ///
    /// The next-sibling hint was checked against the child's backend on
    /// insertion, so it is a child of the same layer.
    pub(crate) fn route_child(
        &mut self,
        scene: NodeId,
        child: NodeId,
        next: Option<NodeId>,
    ) -> Result<()> {
        let layer = self.add_layer(scene, self.routed_backend(child.idx))?;
        let mut added = Event::new(EventType::ChildAdded)
            .with_node(child)
            .with_next(next);
        self.dispatch_event(layer, &mut added)
    }

    /// Takes a child the scene just lost out of its layer.
    pub(crate) fn unroute_child(&mut self, child: NodeId) -> Result<()> {
        let l = self.layer[child.idx as usize];
        let Some(layer) = self.handle(l) else {
            debug!(?child, "unroute_child: no layer recorded, ignoring");
            return Ok(());
        };
        let mut removed = Event::new(EventType::ChildRemoved).with_node(child);
        self.dispatch_event(layer, &mut removed)?;
        self.layer[child.idx as usize] = INVALID;
        Ok(())
    }

    /// Starts rendering every layer and forwards stage `exitframe` to them.
    pub(crate) fn scene_enter(&mut self, scene: NodeId) -> Result<()> {
        let Some(state) = self.scene_state_mut(scene.idx) else {
            return Ok(());
        };
        if state.entered {
            return Ok(());
        }
        state.entered = true;

        let forward = listener(move |g, _| {
            if !g.is_alive(scene) {
                return Ok(());
            }
            for l in g.scene_layer_indices(scene.idx) {
                let layer = g.id_at(l);
                g.dispatch_event(layer, &mut Event::new(EventType::ExitFrame))?;
            }
            Ok(())
        });
        self.stage_target
            .add_event_listener(EventType::ExitFrame, Rc::clone(&forward));
        if let Some(state) = self.scene_state_mut(scene.idx) {
            state.exit_frame = Some(forward);
        }

        for l in self.scene_layer_indices(scene.idx) {
            self.start_rendering(l)?;
        }
        debug!(?scene, "scene entered");
        Ok(())
    }

    /// Stops rendering every layer and drops the `exitframe` forwarding.
    pub(crate) fn scene_exit(&mut self, scene: NodeId) -> Result<()> {
        let Some(state) = self.scene_state_mut(scene.idx) else {
            return Ok(());
        };
        if !state.entered {
            return Ok(());
        }
        state.entered = false;
        if let Some(forward) = state.exit_frame.take() {
            self.stage_target
                .remove_event_listener(&EventType::ExitFrame, &forward);
        }

        for l in self.scene_layer_indices(scene.idx) {
            self.stop_rendering(l)?;
        }
        debug!(?scene, "scene exited");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::headless::{test_graph, test_graph_with_probe};
    use crate::node::NodeType;

    #[test]
    fn children_route_by_native_element() {
        let mut g = test_graph();
        let scene = g.create_scene().unwrap();
        let plain = g.create_entity();
        let native = g.create_dom_entity("img").unwrap();
        g.add_child(scene, plain).unwrap();
        g.add_child(scene, native).unwrap();

        let canvas = g.layer(scene, Backend::Canvas).unwrap();
        let dom = g.layer(scene, Backend::Dom).unwrap();
        assert_eq!(g.node_type(canvas), NodeType::Layer(Backend::Canvas));
        assert_eq!(g.layer_of(plain), Some(canvas));
        assert_eq!(g.layer_of(native), Some(dom));
        assert_eq!(g.parent(plain), Some(scene), "the tree parent stays the scene");
        assert_eq!(g.scene_of(native), Some(scene));
        assert_eq!(g.children(scene).count(), 2, "layers are not children");
    }

    #[test]
    fn routing_is_fixed_at_add_time() {
        let mut g = test_graph();
        let scene = g.create_scene().unwrap();
        let node = g.create_entity();
        g.add_child(scene, node).unwrap();
        let canvas = g.layer(scene, Backend::Canvas).unwrap();
        let el = g.platform_mut().create_element("div").unwrap();
        g.set_element(node, Some(el));
        assert_eq!(g.layer_of(node), Some(canvas));

        g.remove_child(scene, node).unwrap();
        assert_eq!(g.layer_of(node), None);
        assert!(g.layer_children(canvas).is_empty());
        g.add_child(scene, node).unwrap();
        assert_eq!(g.layer_of(node), g.layer(scene, Backend::Dom));
    }

    #[test]
    fn dom_layer_sits_above_canvas_in_container() {
        let (mut g, probe) = test_graph_with_probe();
        let scene = g.create_scene().unwrap();
        // Create the DOM layer first; the canvas must still go below it.
        let dom = g.add_layer(scene, Backend::Dom).unwrap();
        let canvas = g.add_layer(scene, Backend::Canvas).unwrap();
        assert_eq!(g.add_layer(scene, Backend::Dom).unwrap(), dom, "idempotent");

        let container = g.scene_element(scene).unwrap();
        assert_eq!(
            probe.children(container),
            vec![g.layer_element(canvas).unwrap(), g.layer_element(dom).unwrap()]
        );
    }

    #[test]
    fn add_layer_rejects_non_scenes() {
        let mut g = test_graph();
        let group = g.create_group();
        assert!(matches!(
            g.add_layer(group, Backend::Dom),
            Err(SceneError::NotAScene(id)) if id == group
        ));
    }

    #[test]
    fn hint_in_other_layer_is_rejected() {
        let mut g = test_graph();
        let scene = g.create_scene().unwrap();
        let a = g.create_entity();
        let b = g.create_entity();
        let native = g.create_dom_entity("div").unwrap();
        g.add_child(scene, a).unwrap();
        g.add_child(scene, native).unwrap();
        assert!(matches!(
            g.insert_before(scene, b, native),
            Err(SceneError::InvalidInsertionPoint { reference, .. }) if reference == native
        ));
        assert_eq!(g.parent(b), None, "rejected before the graph changed");

        // Same-backend hints still order the layer.
        g.insert_before(scene, b, a).unwrap();
        let canvas = g.layer(scene, Backend::Canvas).unwrap();
        assert_eq!(g.layer_children(canvas), vec![b, a]);
        assert_eq!(g.children(scene).collect::<Vec<_>>(), vec![b, a, native]);
    }

    #[test]
    fn scene_geometry_fans_out_to_layers() {
        let mut g = test_graph();
        let scene = g.create_scene().unwrap();
        let canvas = g.add_layer(scene, Backend::Canvas).unwrap();
        g.move_to(scene, 12.0, -3.0);
        g.set_rotation(scene, 90.0);
        g.set_origin_x(scene, Some(0.0));
        let dom = g.add_layer(scene, Backend::Dom).unwrap();
        for layer in [canvas, dom] {
            let p = g.props(layer);
            assert_eq!((p.x, p.y, p.rotation), (12.0, -3.0, 90.0), "{layer:?}");
            assert_eq!(p.origin_x, Some(0.0), "{layer:?}");
            assert_eq!((p.width, p.height), (320.0, 320.0));
        }
    }

    #[test]
    fn enter_subscribes_and_exit_unsubscribes() {
        let (mut g, probe) = test_graph_with_probe();
        let scene = g.create_scene().unwrap();
        let node = g.create_entity();
        g.add_child(scene, node).unwrap();
        let canvas = g.layer(scene, Backend::Canvas).unwrap();
        let el = g.layer_element(canvas).unwrap();

        g.dispatch_event(scene, &mut Event::new(EventType::Enter)).unwrap();
        assert_eq!(g.stage_target_mut().listener_count(&EventType::ExitFrame), 1);
        probe.clear_commands();
        g.dispatch_stage_event(&mut Event::new(EventType::ExitFrame)).unwrap();
        assert!(!probe.commands(el).is_empty(), "entered layers render on exitframe");

        g.dispatch_event(scene, &mut Event::new(EventType::Exit)).unwrap();
        assert_eq!(g.stage_target_mut().listener_count(&EventType::ExitFrame), 0);
        probe.clear_commands();
        g.dispatch_stage_event(&mut Event::new(EventType::ExitFrame)).unwrap();
        assert!(probe.commands(el).is_empty(), "exited layers stay idle");
    }

    #[test]
    fn destroying_a_scene_releases_its_layers() {
        let (mut g, probe) = test_graph_with_probe();
        let scene = g.create_scene().unwrap();
        let layer = g.add_layer(scene, Backend::Dom).unwrap();
        let el = g.layer_element(layer).unwrap();
        let container = g.scene_element(scene).unwrap();
        g.destroy(scene).unwrap();
        assert!(!g.is_alive(layer));
        assert!(probe.is_released(el) && probe.is_released(container));
    }
}
