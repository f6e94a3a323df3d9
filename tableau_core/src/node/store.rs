// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, properties and invalidation.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, Vec2};

use super::id::{INVALID, NodeId};
use super::props::{NodeProperty, NodeProps};
use super::traverse::Children;
use crate::config::StageConfig;
use crate::error::Result;
use crate::event::EventType;
use crate::layer::dom::Manager;
use crate::layer::{Backend, LayerState};
use crate::platform::{ElementId, NodeRenderer, Platform};
use crate::scene::SceneState;
use crate::target::{EventTarget, Listener};
use crate::timeline::TimelineSlot;

/// What a node is, with the state only that kind carries.
pub(crate) enum NodeKind {
    Entity,
    Group,
    Scene(SceneState),
    Layer(LayerState),
}

/// The public shape of a node, without its internal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// A leaf. May carry a native element.
    Entity,
    /// Owns ordered children.
    Group,
    /// Root of a displayable subtree. Owns up to one layer per backend.
    Scene,
    /// A scene's rendering surface for one backend.
    Layer(Backend),
}

impl NodeType {
    /// Returns whether nodes of this type accept children.
    #[must_use]
    pub fn is_container(self) -> bool {
        !matches!(self, Self::Entity)
    }
}

/// Struct-of-arrays storage for every node of a stage.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays; destroyed nodes are recycled through a free list and
/// generation counters make stale handles panic instead of aliasing.
///
/// The graph also owns the [`Platform`] it renders to, the stage-level
/// [`EventTarget`] that carries `enterframe`/`exitframe` broadcasts, and the
/// [`StageConfig`] new scenes and timelines read their defaults from.
pub struct SceneGraph {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Node data (set by callers) --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) props: Vec<NodeProps>,
    pub(crate) element: Vec<Option<ElementId>>,
    pub(crate) renderer: Vec<Option<Rc<dyn NodeRenderer>>>,
    pub(crate) targets: Vec<EventTarget>,
    pub(crate) age: Vec<u64>,

    // -- Computed (written by coordinate updates and renderers) --
    pub(crate) world: Vec<Affine>,
    pub(crate) offset: Vec<Vec2>,
    pub(crate) dirty: Vec<bool>,
    pub(crate) transform_changed: Vec<bool>,

    // -- Non-owning back-references --
    pub(crate) scene: Vec<u32>,
    pub(crate) layer: Vec<u32>,

    // -- Attached helpers --
    pub(crate) managers: Vec<Option<Manager>>,
    pub(crate) timelines: Vec<TimelineSlot>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Host --
    pub(crate) platform: Box<dyn Platform>,
    pub(crate) stage_target: EventTarget,
    pub(crate) config: StageConfig,
}

impl fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneGraph")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SceneGraph {
    /// Creates an empty graph rendering to `platform`.
    #[must_use]
    pub fn new(platform: Box<dyn Platform>, config: StageConfig) -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            props: Vec::new(),
            element: Vec::new(),
            renderer: Vec::new(),
            targets: Vec::new(),
            age: Vec::new(),
            world: Vec::new(),
            offset: Vec::new(),
            dirty: Vec::new(),
            transform_changed: Vec::new(),
            scene: Vec::new(),
            layer: Vec::new(),
            managers: Vec::new(),
            timelines: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            platform,
            stage_target: EventTarget::new(),
            config,
        }
    }

    /// Returns the configuration the graph was created with.
    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Returns the platform, for hosts that create elements themselves.
    pub fn platform_mut(&mut self) -> &mut dyn Platform {
        &mut *self.platform
    }

    // -- Allocation API --

    /// Creates a leaf node with default properties and no element.
    pub fn create_entity(&mut self) -> NodeId {
        self.alloc(NodeKind::Entity)
    }

    /// Creates a leaf node backed by a new platform element.
    ///
    /// Added to a scene, it is routed to the DOM layer.
    pub fn create_dom_entity(&mut self, tag: &str) -> Result<NodeId> {
        let element = self.platform.create_element(tag)?;
        let id = self.alloc(NodeKind::Entity);
        self.element[id.idx as usize] = Some(element);
        Ok(id)
    }

    /// Creates an empty group.
    pub fn create_group(&mut self) -> NodeId {
        self.alloc(NodeKind::Group)
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot. The generation was bumped when it was freed.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.kind[i] = kind;
            self.props[i] = NodeProps::default();
            self.element[i] = None;
            self.renderer[i] = None;
            self.targets[i] = EventTarget::new();
            self.age[i] = 0;
            self.world[i] = Affine::IDENTITY;
            self.offset[i] = Vec2::ZERO;
            self.dirty[i] = true;
            self.transform_changed[i] = true;
            self.scene[i] = INVALID;
            self.layer[i] = INVALID;
            self.managers[i] = None;
            self.timelines[i] = TimelineSlot::Vacant;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.props.push(NodeProps::default());
            self.element.push(None);
            self.renderer.push(None);
            self.targets.push(EventTarget::new());
            self.age.push(0);
            self.world.push(Affine::IDENTITY);
            self.offset.push(Vec2::ZERO);
            self.dirty.push(true);
            self.transform_changed.push(true);
            self.scene.push(INVALID);
            self.layer.push(INVALID);
            self.managers.push(None);
            self.timelines.push(TimelineSlot::Vacant);
            self.generation.push(0);
            idx
        };

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Frees a detached slot. Old handles fail validation afterwards.
    pub(crate) fn free_slot(&mut self, idx: u32) {
        let i = idx as usize;
        debug_assert!(self.parent[i] == INVALID, "freeing an attached node");
        if let Some(element) = self.element[i].take() {
            self.platform.release_element(element);
        }
        match core::mem::replace(&mut self.kind[i], NodeKind::Entity) {
            NodeKind::Scene(state) => {
                if let Some(forward) = &state.exit_frame {
                    self.stage_target
                        .remove_event_listener(&EventType::ExitFrame, forward);
                }
                self.platform.release_element(state.element);
            }
            NodeKind::Layer(state) => self.platform.release_element(state.element),
            NodeKind::Entity | NodeKind::Group => {}
        }
        self.managers[i] = None;
        self.renderer[i] = None;
        self.targets[i].clear();
        self.timelines[i] = TimelineSlot::Vacant;
        self.generation[i] += 1;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology queries --

    /// Returns the parent of a node, if any.
    ///
    /// Nodes added to a scene report the scene, not the layer rendering them.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.handle(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a node, in paint order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the scene the node belongs to, if any.
    #[must_use]
    pub fn scene_of(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        if matches!(self.kind[id.idx as usize], NodeKind::Scene(_)) {
            return Some(id);
        }
        self.handle(self.scene[id.idx as usize])
    }

    /// Returns the layer a scene routed this node to, if any.
    #[must_use]
    pub fn layer_of(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.handle(self.layer[id.idx as usize])
    }

    /// Returns what kind of node this is.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.validate(id);
        match &self.kind[id.idx as usize] {
            NodeKind::Entity => NodeType::Entity,
            NodeKind::Group => NodeType::Group,
            NodeKind::Scene(_) => NodeType::Scene,
            NodeKind::Layer(state) => NodeType::Layer(state.backend),
        }
    }

    /// Returns the node's native element, if it has one.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<ElementId> {
        self.validate(id);
        self.element[id.idx as usize]
    }

    /// Number of frames the node has spent in the current scene.
    #[must_use]
    pub fn age(&self, id: NodeId) -> u64 {
        self.validate(id);
        self.age[id.idx as usize]
    }

    /// Returns whether the node's cached matrix is stale.
    #[must_use]
    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.validate(id);
        self.dirty[id.idx as usize]
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the local properties of a node.
    #[must_use]
    pub fn props(&self, id: NodeId) -> &NodeProps {
        self.validate(id);
        &self.props[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Writes one numeric property.
    ///
    /// Writing the current value is a no-op. Transform properties mark the
    /// node and its whole subtree dirty; on a scene, geometry also fans out
    /// to every layer.
    pub fn set_property(&mut self, id: NodeId, property: NodeProperty, value: f64) {
        self.validate(id);
        self.write_property(id.idx, property, value);
    }

    /// Sets `x`.
    pub fn set_x(&mut self, id: NodeId, x: f64) {
        self.set_property(id, NodeProperty::X, x);
    }

    /// Sets `y`.
    pub fn set_y(&mut self, id: NodeId, y: f64) {
        self.set_property(id, NodeProperty::Y, y);
    }

    /// Sets `scale_x`.
    pub fn set_scale_x(&mut self, id: NodeId, scale: f64) {
        self.set_property(id, NodeProperty::ScaleX, scale);
    }

    /// Sets `scale_y`.
    pub fn set_scale_y(&mut self, id: NodeId, scale: f64) {
        self.set_property(id, NodeProperty::ScaleY, scale);
    }

    /// Sets the rotation in degrees.
    pub fn set_rotation(&mut self, id: NodeId, degrees: f64) {
        self.set_property(id, NodeProperty::Rotation, degrees);
    }

    /// Sets the width. Moves the default origin.
    pub fn set_width(&mut self, id: NodeId, width: f64) {
        self.set_property(id, NodeProperty::Width, width);
    }

    /// Sets the height. Moves the default origin.
    pub fn set_height(&mut self, id: NodeId, height: f64) {
        self.set_property(id, NodeProperty::Height, height);
    }

    /// Sets both dimensions.
    pub fn set_size(&mut self, id: NodeId, width: f64, height: f64) {
        self.set_property(id, NodeProperty::Width, width);
        self.set_property(id, NodeProperty::Height, height);
    }

    /// Sets the opacity.
    pub fn set_opacity(&mut self, id: NodeId, opacity: f64) {
        self.set_property(id, NodeProperty::Opacity, opacity);
    }

    /// Sets the pivot x. `None` follows the box center.
    pub fn set_origin_x(&mut self, id: NodeId, origin: Option<f64>) {
        self.validate(id);
        let i = id.idx as usize;
        if self.props[i].origin_x != origin {
            self.props[i].origin_x = origin;
            self.mark_dirty(id.idx);
            for layer in self.scene_layer_indices(id.idx) {
                self.props[layer as usize].origin_x = origin;
                self.mark_dirty(layer);
            }
        }
    }

    /// Sets the pivot y. `None` follows the box center.
    pub fn set_origin_y(&mut self, id: NodeId, origin: Option<f64>) {
        self.validate(id);
        let i = id.idx as usize;
        if self.props[i].origin_y != origin {
            self.props[i].origin_y = origin;
            self.mark_dirty(id.idx);
            for layer in self.scene_layer_indices(id.idx) {
                self.props[layer as usize].origin_y = origin;
                self.mark_dirty(layer);
            }
        }
    }

    /// Shows or hides the node.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.validate(id);
        self.props[id.idx as usize].visible = visible;
    }

    /// Sets the background fill.
    pub fn set_background_color(&mut self, id: NodeId, color: Option<String>) {
        self.validate(id);
        self.props[id.idx as usize].background_color = color;
    }

    /// Allows or forbids canvas hit testing to return this node.
    pub fn set_touch_enabled(&mut self, id: NodeId, enabled: bool) {
        self.validate(id);
        self.props[id.idx as usize].touch_enabled = enabled;
    }

    /// Moves the node to `(x, y)`.
    pub fn move_to(&mut self, id: NodeId, x: f64, y: f64) {
        self.set_x(id, x);
        self.set_y(id, y);
    }

    /// Moves the node by `(dx, dy)`.
    pub fn move_by(&mut self, id: NodeId, dx: f64, dy: f64) {
        let p = self.props(id);
        let (x, y) = (p.x + dx, p.y + dy);
        self.move_to(id, x, y);
    }

    /// Multiplies both scale factors.
    pub fn scale_by(&mut self, id: NodeId, sx: f64, sy: f64) {
        let p = self.props(id);
        let (x, y) = (p.scale_x * sx, p.scale_y * sy);
        self.set_scale_x(id, x);
        self.set_scale_y(id, y);
    }

    /// Adds to the rotation.
    pub fn rotate_by(&mut self, id: NodeId, degrees: f64) {
        let r = self.props(id).rotation + degrees;
        self.set_rotation(id, r);
    }

    /// Attaches or detaches a native element.
    ///
    /// Only affects routing the next time the node is added to a scene.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not an entity.
    pub fn set_element(&mut self, id: NodeId, element: Option<ElementId>) {
        self.validate(id);
        assert!(
            matches!(self.kind[id.idx as usize], NodeKind::Entity),
            "only entities carry elements"
        );
        self.element[id.idx as usize] = element;
    }

    /// Installs the node's drawing hooks.
    pub fn set_renderer(&mut self, id: NodeId, renderer: Option<Rc<dyn NodeRenderer>>) {
        self.validate(id);
        self.renderer[id.idx as usize] = renderer;
    }

    // -- Listener API --

    /// Returns the node's listener registry.
    pub fn target_mut(&mut self, id: NodeId) -> &mut EventTarget {
        self.validate(id);
        &mut self.targets[id.idx as usize]
    }

    /// Registers a listener on a node. See [`EventTarget::add_event_listener`].
    pub fn add_event_listener(&mut self, id: NodeId, kind: EventType, listener: Listener) -> bool {
        self.target_mut(id).add_event_listener(kind, listener)
    }

    /// Unregisters a listener from a node.
    pub fn remove_event_listener(
        &mut self,
        id: NodeId,
        kind: &EventType,
        listener: &Listener,
    ) -> bool {
        self.target_mut(id).remove_event_listener(kind, listener)
    }

    /// Fills the node's direct handler slot for `kind`.
    pub fn set_handler(
        &mut self,
        id: NodeId,
        kind: EventType,
        handler: Option<Listener>,
    ) -> Option<Listener> {
        self.target_mut(id).set_handler(kind, handler)
    }

    /// Returns the stage-level listener registry.
    pub fn stage_target_mut(&mut self) -> &mut EventTarget {
        &mut self.stage_target
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Builds a handle for a live raw index, or `None` for [`INVALID`].
    #[inline]
    pub(crate) fn handle(&self, idx: u32) -> Option<NodeId> {
        (idx != INVALID).then(|| NodeId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    /// Builds a handle for a raw index known to be live.
    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Raw indices of linked children, in order.
    pub(crate) fn child_indices(&self, idx: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut c = self.first_child[idx as usize];
        while c != INVALID {
            out.push(c);
            c = self.next_sibling[c as usize];
        }
        out
    }

    /// Children in drawing order: a layer's routed list, otherwise the
    /// linked children.
    pub(crate) fn paint_children(&self, idx: u32) -> Vec<u32> {
        match &self.kind[idx as usize] {
            NodeKind::Layer(state) => state.children.clone(),
            _ => self.child_indices(idx),
        }
    }

    /// Marks `idx` and every painted descendant as needing a new matrix.
    pub(crate) fn mark_dirty(&mut self, idx: u32) {
        let mut stack = alloc::vec![idx];
        while let Some(i) = stack.pop() {
            self.dirty[i as usize] = true;
            self.transform_changed[i as usize] = true;
            stack.extend(self.paint_children(i));
        }
    }

    fn write_property(&mut self, idx: u32, property: NodeProperty, value: f64) {
        let props = &mut self.props[idx as usize];
        let slot = match property {
            NodeProperty::X => &mut props.x,
            NodeProperty::Y => &mut props.y,
            NodeProperty::ScaleX => &mut props.scale_x,
            NodeProperty::ScaleY => &mut props.scale_y,
            NodeProperty::Rotation => &mut props.rotation,
            NodeProperty::Opacity => &mut props.opacity,
            NodeProperty::Width => &mut props.width,
            NodeProperty::Height => &mut props.height,
        };
        if *slot == value {
            return;
        }
        *slot = value;

        if property.affects_transform() {
            self.mark_dirty(idx);
        }
        if matches!(property, NodeProperty::Width | NodeProperty::Height) {
            self.sync_size(idx);
        }
        if property.affects_transform() {
            for layer in self.scene_layer_indices(idx) {
                self.write_property(layer, property, value);
            }
        }
    }

    /// Pushes a size change to the scene container or a canvas backing store.
    fn sync_size(&mut self, idx: u32) {
        let p = &self.props[idx as usize];
        let (w, h) = (p.width, p.height);
        match &self.kind[idx as usize] {
            NodeKind::Scene(state) => {
                let el = state.element;
                self.platform.set_style(el, "width", &alloc::format!("{w}px"));
                self.platform.set_style(el, "height", &alloc::format!("{h}px"));
            }
            NodeKind::Layer(state) if state.backend == Backend::Canvas => {
                let el = state.element;
                self.platform
                    .resize_canvas(el, pixel_extent(w), pixel_extent(h));
            }
            _ => {}
        }
    }
}

/// Rounds a game-space extent to a backing-store size.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "extent is clamped to a non-negative value first"
)]
pub(crate) fn pixel_extent(v: f64) -> u32 {
    v.max(0.0).round().min(f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::headless::test_graph;

    #[test]
    fn create_and_destroy() {
        let mut g = test_graph();
        let id = g.create_entity();
        assert!(g.is_alive(id));
        g.destroy(id).unwrap();
        assert!(!g.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut g = test_graph();
        let id1 = g.create_entity();
        g.destroy(id1).unwrap();
        let id2 = g.create_group();
        assert!(!g.is_alive(id1));
        assert!(g.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
        assert_eq!(g.node_type(id2), NodeType::Group);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_props() {
        let mut g = test_graph();
        let id = g.create_entity();
        g.destroy(id).unwrap();
        let _ = g.props(id);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_set_x() {
        let mut g = test_graph();
        let id = g.create_entity();
        g.destroy(id).unwrap();
        g.set_x(id, 1.0);
    }

    #[test]
    #[should_panic(expected = "only entities carry elements")]
    fn groups_reject_elements() {
        let mut g = test_graph();
        let group = g.create_group();
        g.set_element(group, Some(ElementId(7)));
    }

    #[test]
    fn dirty_cascades_to_every_depth() {
        let mut g = test_graph();
        let root = g.create_group();
        let mid = g.create_group();
        let leaf = g.create_entity();
        g.add_child(root, mid).unwrap();
        g.add_child(mid, leaf).unwrap();
        let _ = g.matrix(leaf);
        assert!(!g.is_dirty(root) && !g.is_dirty(mid) && !g.is_dirty(leaf));

        g.set_rotation(root, 30.0);
        for id in [root, mid, leaf] {
            assert!(g.is_dirty(id), "{id:?} should be dirty");
        }
    }

    #[test]
    fn unchanged_write_keeps_node_clean() {
        let mut g = test_graph();
        let id = g.create_entity();
        g.set_x(id, 5.0);
        let _ = g.matrix(id);
        g.set_x(id, 5.0);
        assert!(!g.is_dirty(id), "same value must not invalidate");
        g.set_opacity(id, 0.5);
        assert!(!g.is_dirty(id), "opacity does not move the node");
    }

    #[test]
    fn convenience_mutators_compose() {
        let mut g = test_graph();
        let id = g.create_entity();
        g.move_to(id, 10.0, 20.0);
        g.move_by(id, -2.0, 3.0);
        g.scale_by(id, 2.0, 0.5);
        g.rotate_by(id, 15.0);
        g.rotate_by(id, 15.0);
        let p = g.props(id);
        assert_eq!((p.x, p.y), (8.0, 23.0));
        assert_eq!((p.scale_x, p.scale_y), (2.0, 0.5));
        assert!((p.rotation - 30.0).abs() < 1e-12);
    }

    #[test]
    fn origin_change_marks_dirty() {
        let mut g = test_graph();
        let id = g.create_entity();
        let _ = g.matrix(id);
        g.set_origin_x(id, Some(0.0));
        assert!(g.is_dirty(id));
        let _ = g.matrix(id);
        g.set_origin_x(id, Some(0.0));
        assert!(!g.is_dirty(id));
    }

    #[test]
    fn children_iterate_in_insertion_order() {
        let mut g = test_graph();
        let p = g.create_group();
        let a = g.create_entity();
        let b = g.create_entity();
        g.add_child(p, a).unwrap();
        g.add_child(p, b).unwrap();
        assert_eq!(g.children(p).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn pixel_extent_clamps() {
        assert_eq!(pixel_extent(-4.0), 0);
        assert_eq!(pixel_extent(319.6), 320);
    }
}
