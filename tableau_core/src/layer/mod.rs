// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-scene rendering surfaces.
//!
//! A scene owns at most one layer per [`Backend`]:
//!
//! - The **canvas** layer owns a canvas element and redraws its whole subtree
//!   every render, walking children in paint order.
//! - The **DOM** layer owns a container element. Each node under it gets a
//!   manager (see [`dom`]) that keeps one platform element, or a delegated
//!   list of descendant elements, in sync with the tree.
//!
//! Both backends implement the same static capability set ([`LayerBackend`]):
//! attach a child, detach a child, render, and resolve a hit target. The
//! scene holds its layers in a fixed array indexed by backend priority.

pub(crate) mod canvas;
pub(crate) mod dom;

use alloc::vec::Vec;

use kurbo::Point;
use tracing::debug;

pub use dom::StyleMap;

use crate::error::Result;
use crate::node::{INVALID, NodeId, NodeKind, SceneGraph};
use crate::platform::ElementId;

/// A rendering backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Backend {
    /// Canvas 2D drawing. Stacked below the DOM layer.
    Canvas,
    /// One platform element per node. Stacked on top so it receives pointer
    /// events first.
    Dom,
}

impl Backend {
    /// Every backend, lowest priority first.
    pub const ALL: [Self; 2] = [Self::Canvas, Self::Dom];

    /// Stacking priority inside the scene container. Higher is on top.
    #[must_use]
    pub const fn priority(self) -> usize {
        match self {
            Self::Canvas => 0,
            Self::Dom => 1,
        }
    }
}

/// State carried by layer nodes.
pub(crate) struct LayerState {
    pub(crate) backend: Backend,
    pub(crate) element: ElementId,
    /// Routed and directly added children, in paint order.
    pub(crate) children: Vec<u32>,
    pub(crate) rendering: bool,
    /// Node whose element was last pressed (DOM layers only).
    pub(crate) touch_target: Option<NodeId>,
}

impl LayerState {
    pub(crate) fn new(backend: Backend, element: ElementId) -> Self {
        Self {
            backend,
            element,
            children: Vec::new(),
            rendering: false,
            touch_target: None,
        }
    }
}

/// Backend-specific halves of the layer protocol.
pub(crate) trait LayerBackend {
    /// Runs after `child` was inserted into the layer's paint list.
    fn attach(graph: &mut SceneGraph, layer: u32, child: u32, next: Option<u32>) -> Result<()>;

    /// Runs after `child` was taken out of the layer's paint list.
    fn detach(graph: &mut SceneGraph, layer: u32, child: u32) -> Result<()>;

    /// Brings the platform up to date with the layer's subtree.
    fn render(graph: &mut SceneGraph, layer: u32) -> Result<()>;

    /// Returns the node under `point`, if this layer can tell.
    fn hit_target(graph: &mut SceneGraph, layer: u32, point: Point) -> Option<NodeId>;
}

impl SceneGraph {
    /// Returns the backend of a layer node.
    pub(crate) fn layer_state(&self, idx: u32) -> Option<&LayerState> {
        match &self.kind[idx as usize] {
            NodeKind::Layer(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn layer_state_mut(&mut self, idx: u32) -> Option<&mut LayerState> {
        match &mut self.kind[idx as usize] {
            NodeKind::Layer(state) => Some(state),
            _ => None,
        }
    }

    /// Returns whether a layer renders on every `exitframe`.
    pub(crate) fn is_rendering(&self, idx: u32) -> bool {
        self.layer_state(idx).is_some_and(|s| s.rendering)
    }

    /// Makes the layer render on every `exitframe`, and renders once now.
    pub(crate) fn start_rendering(&mut self, idx: u32) -> Result<()> {
        if let Some(state) = self.layer_state_mut(idx) {
            state.rendering = true;
        }
        self.render_layer(idx)
    }

    /// Stops per-frame rendering after one final render.
    pub(crate) fn stop_rendering(&mut self, idx: u32) -> Result<()> {
        if let Some(state) = self.layer_state_mut(idx) {
            state.rendering = false;
        }
        self.render_layer(idx)
    }

    /// Renders one layer with its backend.
    pub(crate) fn render_layer(&mut self, idx: u32) -> Result<()> {
        match self.layer_state(idx).map(|s| s.backend) {
            Some(Backend::Dom) => dom::DomLayer::render(self, idx),
            Some(Backend::Canvas) => canvas::CanvasLayer::render(self, idx),
            None => Ok(()),
        }
    }

    /// Returns the layer's hit for `point`.
    pub(crate) fn layer_hit_target(&mut self, idx: u32, point: Point) -> Option<NodeId> {
        match self.layer_state(idx).map(|s| s.backend) {
            Some(Backend::Dom) => dom::DomLayer::hit_target(self, idx, point),
            Some(Backend::Canvas) => canvas::CanvasLayer::hit_target(self, idx, point),
            None => None,
        }
    }

    /// Inserts `child` into a layer's paint list before `next`, or appends.
    pub(crate) fn layer_attach(
        &mut self,
        layer: NodeId,
        child: NodeId,
        next: Option<NodeId>,
    ) -> Result<()> {
        let (l, c) = (layer.idx, child.idx);
        let Some(state) = self.layer_state_mut(l) else {
            return Ok(());
        };
        let backend = state.backend;
        let pos = next
            .and_then(|n| state.children.iter().position(|&k| k == n.idx))
            .unwrap_or(state.children.len());
        let next = state.children.get(pos).copied();
        state.children.insert(pos, c);

        self.layer[c as usize] = l;
        self.mark_dirty(c);
        debug!(?layer, ?child, ?backend, "attached to layer");
        match backend {
            Backend::Dom => dom::DomLayer::attach(self, l, c, next),
            Backend::Canvas => canvas::CanvasLayer::attach(self, l, c, next),
        }
    }

    /// Removes `child` from a layer's paint list.
    pub(crate) fn layer_detach(&mut self, layer: NodeId, child: NodeId) -> Result<()> {
        let (l, c) = (layer.idx, child.idx);
        let Some(state) = self.layer_state_mut(l) else {
            return Ok(());
        };
        let Some(pos) = state.children.iter().position(|&k| k == c) else {
            debug!(?layer, ?child, "layer_detach: not in layer, ignoring");
            return Ok(());
        };
        state.children.remove(pos);
        let backend = state.backend;
        if self.layer[c as usize] == l {
            self.layer[c as usize] = INVALID;
        }
        debug!(?layer, ?child, ?backend, "detached from layer");
        match backend {
            Backend::Dom => dom::DomLayer::detach(self, l, c),
            Backend::Canvas => canvas::CanvasLayer::detach(self, l, c),
        }
    }

    /// Returns the layer's routed children, in paint order.
    pub fn layer_children(&self, layer: NodeId) -> Vec<NodeId> {
        self.validate(layer);
        self.layer_state(layer.idx)
            .map(|s| s.children.iter().map(|&c| self.id_at(c)).collect())
            .unwrap_or_default()
    }

    /// Returns the layer's platform element (its container or canvas).
    #[must_use]
    pub fn layer_element(&self, layer: NodeId) -> Option<ElementId> {
        self.validate(layer);
        self.layer_state(layer.idx).map(|s| s.element)
    }
}
