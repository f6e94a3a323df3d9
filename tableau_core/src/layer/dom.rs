// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM layer: per-node managers that keep platform elements in sync.
//!
//! Every node under a DOM layer owns a [`Manager`]:
//!
//! - Entities (and the layer itself) own a [`DomManager`] wrapping exactly
//!   one element. Entities without an element of their own get a plain
//!   `div`, released again when the manager is dropped.
//! - Groups own a [`DomlessManager`]. A group has no element, so it records
//!   the ordered list of descendant elements it is responsible for and
//!   delegates the actual insertion to its own parent's manager, up to the
//!   layer container. All elements of a DOM layer are therefore flat
//!   children of the layer element; group transforms are folded into each
//!   element's CSS matrix at render time.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Point;
use tracing::debug;

use super::LayerBackend;
use crate::error::{Result, SceneError};
use crate::event::{Event, EventType};
use crate::matrix::{MatrixStack, css_matrix, make_transform_matrix, multiply, offset_of};
use crate::node::{INVALID, NodeId, NodeKind, SceneGraph};
use crate::platform::ElementId;

/// Ordered CSS property/value pairs collected for one node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleMap {
    entries: Vec<(String, String)>,
}

impl StyleMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `property`, replacing an earlier value in place.
    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        let property = property.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == property) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((property, value)),
        }
    }

    /// Returns the value of `property`.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Platform state attached to a node under a DOM layer.
#[derive(Debug)]
pub(crate) enum Manager {
    Dom(DomManager),
    Domless(DomlessManager),
}

#[derive(Debug)]
pub(crate) struct DomManager {
    pub(crate) element: ElementId,
    /// The element was made for the manager and dies with it.
    pub(crate) created: bool,
    pub(crate) layer: Option<NodeId>,
    /// Style values last written to the element.
    pub(crate) applied: HashMap<String, String>,
}

impl DomManager {
    pub(crate) fn new(element: ElementId, created: bool, layer: Option<NodeId>) -> Self {
        Self {
            element,
            created,
            layer,
            applied: HashMap::new(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct DomlessManager {
    /// Descendant elements this group inserts on behalf of its subtree.
    pub(crate) dom_ref: Vec<ElementId>,
    pub(crate) layer: Option<NodeId>,
}

impl Manager {
    fn layer(&self) -> Option<NodeId> {
        match self {
            Self::Dom(m) => m.layer,
            Self::Domless(m) => m.layer,
        }
    }

    fn set_layer(&mut self, layer: Option<NodeId>) {
        match self {
            Self::Dom(m) => m.layer = layer,
            Self::Domless(m) => m.layer = layer,
        }
    }
}

pub(crate) struct DomLayer;

impl LayerBackend for DomLayer {
    fn attach(graph: &mut SceneGraph, layer: u32, child: u32, next: Option<u32>) -> Result<()> {
        graph.dom_attach(layer, child, next)
    }

    fn detach(graph: &mut SceneGraph, layer: u32, child: u32) -> Result<()> {
        graph.dom_detach(layer, child)
    }

    fn render(graph: &mut SceneGraph, layer: u32) -> Result<()> {
        let mut stack = MatrixStack::new();
        graph.render_dom_node(layer, layer, &mut stack)
    }

    fn hit_target(graph: &mut SceneGraph, layer: u32, _point: Point) -> Option<NodeId> {
        let state = graph.layer_state_mut(layer)?;
        let hit = state.touch_target.take()?;
        (hit.idx != layer && graph.is_alive(hit)).then_some(hit)
    }
}

impl SceneGraph {
    /// Records that the platform element `element` was pressed.
    ///
    /// Returns the node owning it. Its DOM layer reports that node as the
    /// hit target of the next scene-level lookup.
    pub fn press_element(&mut self, element: ElementId) -> Option<NodeId> {
        let (idx, layer) = (0..self.len).find_map(|i| match &self.managers[i as usize] {
            Some(Manager::Dom(m)) if m.element == element => Some((i, m.layer)),
            _ => None,
        })?;
        let id = self.id_at(idx);
        if let Some(layer) = layer
            && let Some(state) = self.layer_state_mut(layer.idx)
        {
            state.touch_target = Some(id);
        }
        Some(id)
    }

    // -- Attach / detach --

    /// Gives `child`'s subtree managers and inserts its elements under
    /// `owner`, before `next`'s elements.
    pub(crate) fn dom_attach(&mut self, owner: u32, child: u32, next: Option<u32>) -> Result<()> {
        self.build_managers(child)?;
        self.add_manager(owner, child, next)
    }

    /// Takes `child`'s elements out from under `owner` and drops its
    /// subtree's managers.
    pub(crate) fn dom_detach(&mut self, owner: u32, child: u32) -> Result<()> {
        let result = self.remove_manager(owner, child);
        self.drop_managers(child);
        result
    }

    /// Creates managers for a subtree, children first. Groups collect their
    /// children's elements; nothing is inserted yet.
    pub(crate) fn build_managers(&mut self, root: u32) -> Result<()> {
        let order = self.subtree(root);
        for &i in order.iter().rev() {
            let manager = match self.kind[i as usize] {
                NodeKind::Entity => {
                    let (element, created) = match self.element[i as usize] {
                        Some(el) => (el, false),
                        None => (self.platform.create_element("div")?, true),
                    };
                    self.init_element_style(element);
                    Manager::Dom(DomManager::new(element, created, None))
                }
                NodeKind::Group => {
                    let dom_ref = self
                        .child_indices(i)
                        .into_iter()
                        .flat_map(|c| self.manager_elements(c))
                        .collect();
                    Manager::Domless(DomlessManager {
                        dom_ref,
                        layer: None,
                    })
                }
                NodeKind::Scene(_) | NodeKind::Layer(_) => continue,
            };
            self.managers[i as usize] = Some(manager);
        }
        Ok(())
    }

    /// Drops every manager in a subtree, releasing elements made for them.
    pub(crate) fn drop_managers(&mut self, root: u32) {
        for i in self.subtree(root) {
            if let Some(Manager::Dom(m)) = self.managers[i as usize].take()
                && m.created
            {
                self.platform.release_element(m.element);
            }
        }
    }

    /// Inserts the elements of `child`'s manager under `owner`'s.
    pub(crate) fn add_manager(&mut self, owner: u32, child: u32, next: Option<u32>) -> Result<()> {
        let elements = self.manager_elements(child);
        match &self.managers[owner as usize] {
            Some(Manager::Dom(m)) => {
                if m.layer.is_none() {
                    return Err(SceneError::LayerNotAssigned {
                        node: self.id_at(owner),
                    });
                }
                let container = m.element;
                let reference = next.and_then(|n| self.element_as_next(n));
                for el in elements {
                    self.platform.insert_before(container, el, reference);
                }
            }
            Some(Manager::Domless(_)) => {
                let next = next.or_else(|| self.next_manager(owner));
                if let Some(up) = self.manager_parent(owner) {
                    self.add_manager(up, child, next)?;
                }
                let reference = next.and_then(|n| self.element_as_next(n));
                if let Some(Manager::Domless(m)) = &mut self.managers[owner as usize] {
                    let at = reference
                        .and_then(|r| m.dom_ref.iter().position(|&e| e == r))
                        .unwrap_or(m.dom_ref.len());
                    for (k, el) in elements.into_iter().enumerate() {
                        m.dom_ref.insert(at + k, el);
                    }
                }
            }
            None => return Ok(()),
        }
        let layer = self.managers[owner as usize]
            .as_ref()
            .and_then(Manager::layer);
        self.propagate_layer(child, layer);
        debug!(owner, child, "manager attached");
        Ok(())
    }

    /// Removes the elements of `child`'s manager from under `owner`'s.
    pub(crate) fn remove_manager(&mut self, owner: u32, child: u32) -> Result<()> {
        let elements = self.manager_elements(child);
        let owner_id = self.id_at(owner);
        match &mut self.managers[owner as usize] {
            Some(Manager::Dom(m)) => {
                if m.layer.is_none() {
                    return Err(SceneError::LayerNotAssigned { node: owner_id });
                }
                let container = m.element;
                for el in elements {
                    self.platform.remove_child(container, el);
                }
            }
            Some(Manager::Domless(m)) => {
                m.dom_ref.retain(|e| !elements.contains(e));
                if let Some(up) = self.manager_parent(owner) {
                    self.remove_manager(up, child)?;
                }
            }
            None => {}
        }
        debug!(owner, child, "manager detached");
        Ok(())
    }

    /// Elements a manager contributes to its parent container.
    pub(crate) fn manager_elements(&self, idx: u32) -> Vec<ElementId> {
        match &self.managers[idx as usize] {
            Some(Manager::Dom(m)) => alloc::vec![m.element],
            Some(Manager::Domless(m)) => m.dom_ref.clone(),
            None => Vec::new(),
        }
    }

    /// The element to insert before when placing something ahead of `idx`.
    ///
    /// An empty group stands in for whatever is painted after it.
    fn element_as_next(&self, idx: u32) -> Option<ElementId> {
        match &self.managers[idx as usize] {
            Some(Manager::Dom(m)) => Some(m.element),
            Some(Manager::Domless(m)) => match m.dom_ref.first() {
                Some(&el) => Some(el),
                None => self.element_after(idx),
            },
            None => None,
        }
    }

    /// The first element painted after `idx`'s subtree.
    ///
    /// Climbs out of enclosing groups until a following sibling is found.
    /// `None` means append to the container.
    fn element_after(&self, idx: u32) -> Option<ElementId> {
        if let Some(next) = self.next_manager(idx) {
            return self.element_as_next(next);
        }
        let up = self.manager_parent(idx)?;
        match &self.managers[up as usize] {
            Some(Manager::Domless(_)) => self.element_after(up),
            Some(Manager::Dom(_)) | None => None,
        }
    }

    /// The node whose children list `idx` is painted from.
    fn paint_parent(&self, idx: u32) -> Option<u32> {
        let p = self.parent[idx as usize];
        if p == INVALID {
            return None;
        }
        match self.kind[p as usize] {
            NodeKind::Scene(_) => {
                let l = self.layer[idx as usize];
                (l != INVALID).then_some(l)
            }
            _ => Some(p),
        }
    }

    /// The manager `idx` delegates insertions to.
    fn manager_parent(&self, idx: u32) -> Option<u32> {
        self.paint_parent(idx)
            .filter(|&p| self.managers[p as usize].is_some())
    }

    /// The first following sibling of `idx` that has a manager.
    fn next_manager(&self, idx: u32) -> Option<u32> {
        let parent = self.paint_parent(idx)?;
        let siblings = self.paint_children(parent);
        let pos = siblings.iter().position(|&s| s == idx)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|&s| self.managers[s as usize].is_some())
    }

    /// Points every manager in `root`'s subtree at `layer`.
    fn propagate_layer(&mut self, root: u32, layer: Option<NodeId>) {
        for i in self.subtree(root) {
            if let Some(m) = &mut self.managers[i as usize] {
                m.set_layer(layer);
            }
        }
    }

    pub(crate) fn init_element_style(&mut self, element: ElementId) {
        self.platform.set_style(element, "position", "absolute");
        self.platform.set_style(element, "transform-origin", "0px 0px");
        if self.config.debug_borders {
            self.platform.set_style(element, "outline", "1px solid red");
        }
    }

    // -- Rendering --

    /// Renders `idx` and its subtree under a DOM layer.
    ///
    /// `stack` holds the group matrices between the layer and `idx`. Element
    /// transforms are relative to the layer container, which carries the
    /// layer's own matrix.
    fn render_dom_node(&mut self, layer: u32, idx: u32, stack: &mut MatrixStack) -> Result<()> {
        let id = self.id_at(idx);
        self.dispatch_event(id, &mut Event::new(EventType::Render))?;
        if !self.is_alive(id) {
            return Ok(());
        }

        let i = idx as usize;
        let dest = multiply(stack.top(), make_transform_matrix(&self.props[i]));
        let world = if idx == layer {
            dest
        } else {
            multiply(self.world[layer as usize], dest)
        };
        self.world[i] = world;
        self.offset[i] = offset_of(world, &self.props[i]);
        self.dirty[i] = false;

        match &self.managers[i] {
            Some(Manager::Dom(m)) => {
                if self.transform_changed[i] {
                    self.platform
                        .set_style(m.element, "transform", &css_matrix(dest));
                    self.transform_changed[i] = false;
                }
                self.dom_render(idx);
                if idx == layer {
                    for child in self.paint_children(idx) {
                        self.render_dom_node(layer, child, stack)?;
                    }
                }
            }
            Some(Manager::Domless(_)) => {
                self.transform_changed[i] = false;
                stack.push(dest);
                for child in self.paint_children(idx) {
                    self.render_dom_node(layer, child, stack)?;
                }
                stack.pop();
            }
            None => {}
        }
        Ok(())
    }

    /// Reconciles a node's styles with the values last written.
    fn dom_render(&mut self, idx: u32) {
        let i = idx as usize;
        let props = &self.props[i];
        let mut style = StyleMap::new();
        style.set("width", alloc::format!("{}px", props.width));
        style.set("height", alloc::format!("{}px", props.height));
        style.set("opacity", props.opacity.to_string());
        style.set(
            "background-color",
            props.background_color.clone().unwrap_or_default(),
        );
        style.set("display", if props.visible { "block" } else { "none" });
        if let Some(renderer) = &self.renderer[i] {
            renderer.dom_render(props, &mut style);
        }

        let Some(Manager::Dom(m)) = &mut self.managers[i] else {
            return;
        };
        for (property, value) in style.iter() {
            let stale = match m.applied.get(property) {
                Some(prev) => prev != value,
                None => !value.is_empty(),
            };
            if stale {
                self.platform.set_style(m.element, property, value);
                m.applied.insert(property.to_string(), value.to_string());
            }
        }
    }
}
