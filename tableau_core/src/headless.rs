// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory platform for tests and native hosts.
//!
//! [`HeadlessPlatform`] keeps an element tree, inline styles and a log of
//! canvas draw commands. Clones share the same state, so a caller can hand
//! one clone to a [`SceneGraph`] and keep another to inspect what the graph
//! did.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::HashMap;
use kurbo::{Affine, Rect};

use crate::platform::{CanvasSurface, DomSurface, ElementId, PlatformError};

/// One recorded canvas call.
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasCommand {
    /// `clear`
    Clear,
    /// `save`
    Save,
    /// `restore`
    Restore,
    /// `set_transform`
    SetTransform(Affine),
    /// `set_global_alpha`
    GlobalAlpha(f64),
    /// `fill_rect` with its color.
    FillRect(Rect, String),
    /// `clip_rect`
    ClipRect(Rect),
}

#[derive(Debug, Default)]
struct Element {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    styles: HashMap<String, String>,
    canvas_size: Option<(u32, u32)>,
    commands: Vec<CanvasCommand>,
    released: bool,
}

#[derive(Debug, Default)]
struct State {
    elements: Vec<Element>,
    style_writes: usize,
    refuse_creation: bool,
}

impl State {
    fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.0 as usize)
    }

    fn create(&mut self, tag: &str) -> Result<ElementId, PlatformError> {
        if self.refuse_creation {
            return Err(PlatformError::CreateElement {
                tag: tag.to_string(),
                reason: "creation disabled".to_string(),
            });
        }
        let id = ElementId(
            u32::try_from(self.elements.len()).map_err(|_| PlatformError::CreateElement {
                tag: tag.to_string(),
                reason: "element table full".to_string(),
            })?,
        );
        self.elements.push(Element {
            tag: tag.to_string(),
            ..Element::default()
        });
        Ok(id)
    }

    fn detach(&mut self, child: ElementId) {
        let Some(parent) = self.get_mut(child).and_then(|e| e.parent.take()) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != child);
        }
    }
}

/// A [`Platform`](crate::platform::Platform) that renders nowhere.
#[derive(Clone, Debug)]
pub struct HeadlessPlatform {
    state: Rc<RefCell<State>>,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlatform {
    /// Creates a platform holding only a root element.
    #[must_use]
    pub fn new() -> Self {
        let root = Element {
            tag: "root".to_string(),
            ..Element::default()
        };
        Self {
            state: Rc::new(RefCell::new(State {
                elements: alloc::vec![root],
                ..State::default()
            })),
        }
    }

    /// Makes element creation fail, to exercise error paths.
    pub fn set_refuse_creation(&self, refuse: bool) {
        self.state.borrow_mut().refuse_creation = refuse;
    }

    /// Returns the children of `element`, in order.
    #[must_use]
    pub fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.state
            .borrow()
            .get(element)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    /// Returns the parent of `element`.
    #[must_use]
    pub fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.state.borrow().get(element).and_then(|e| e.parent)
    }

    /// Returns the tag `element` was created with.
    #[must_use]
    pub fn tag(&self, element: ElementId) -> Option<String> {
        self.state.borrow().get(element).map(|e| e.tag.clone())
    }

    /// Returns the current value of an inline style property.
    #[must_use]
    pub fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.state
            .borrow()
            .get(element)
            .and_then(|e| e.styles.get(property).cloned())
    }

    /// Total number of style writes so far.
    #[must_use]
    pub fn style_writes(&self) -> usize {
        self.state.borrow().style_writes
    }

    /// Returns whether `element` was released.
    #[must_use]
    pub fn is_released(&self, element: ElementId) -> bool {
        self.state.borrow().get(element).is_some_and(|e| e.released)
    }

    /// Returns the backing-store size of a canvas.
    #[must_use]
    pub fn canvas_size(&self, canvas: ElementId) -> Option<(u32, u32)> {
        self.state.borrow().get(canvas).and_then(|e| e.canvas_size)
    }

    /// Returns the draw commands recorded for a canvas.
    #[must_use]
    pub fn commands(&self, canvas: ElementId) -> Vec<CanvasCommand> {
        self.state
            .borrow()
            .get(canvas)
            .map(|e| e.commands.clone())
            .unwrap_or_default()
    }

    /// Forgets every recorded draw command.
    pub fn clear_commands(&self) {
        for e in &mut self.state.borrow_mut().elements {
            e.commands.clear();
        }
    }

    fn record(&self, canvas: ElementId, command: CanvasCommand) {
        if let Some(e) = self.state.borrow_mut().get_mut(canvas) {
            e.commands.push(command);
        }
    }
}

impl DomSurface for HeadlessPlatform {
    fn root(&self) -> ElementId {
        ElementId(0)
    }

    fn create_element(&mut self, tag: &str) -> Result<ElementId, PlatformError> {
        self.state.borrow_mut().create(tag)
    }

    fn create_canvas(&mut self, width: u32, height: u32) -> Result<ElementId, PlatformError> {
        let mut state = self.state.borrow_mut();
        let id = state.create("canvas")?;
        if let Some(e) = state.get_mut(id) {
            e.canvas_size = Some((width, height));
        }
        Ok(id)
    }

    fn resize_canvas(&mut self, canvas: ElementId, width: u32, height: u32) {
        if let Some(e) = self.state.borrow_mut().get_mut(canvas) {
            e.canvas_size = Some((width, height));
        }
    }

    fn release_element(&mut self, element: ElementId) {
        let mut state = self.state.borrow_mut();
        state.detach(element);
        if let Some(e) = state.get_mut(element) {
            e.released = true;
        }
    }

    fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>) {
        let mut state = self.state.borrow_mut();
        state.detach(child);
        let Some(p) = state.get_mut(parent) else {
            return;
        };
        let at = reference
            .and_then(|r| p.children.iter().position(|&c| c == r))
            .unwrap_or(p.children.len());
        p.children.insert(at, child);
        if let Some(c) = state.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn remove_child(&mut self, parent: ElementId, child: ElementId) {
        let mut state = self.state.borrow_mut();
        if state.get(child).and_then(|c| c.parent) == Some(parent) {
            state.detach(child);
        }
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        state.style_writes += 1;
        if let Some(e) = state.get_mut(element) {
            e.styles.insert(property.to_string(), value.to_string());
        }
    }
}

impl CanvasSurface for HeadlessPlatform {
    fn clear(&mut self, canvas: ElementId) {
        self.record(canvas, CanvasCommand::Clear);
    }

    fn save(&mut self, canvas: ElementId) {
        self.record(canvas, CanvasCommand::Save);
    }

    fn restore(&mut self, canvas: ElementId) {
        self.record(canvas, CanvasCommand::Restore);
    }

    fn set_transform(&mut self, canvas: ElementId, transform: Affine) {
        self.record(canvas, CanvasCommand::SetTransform(transform));
    }

    fn set_global_alpha(&mut self, canvas: ElementId, alpha: f64) {
        self.record(canvas, CanvasCommand::GlobalAlpha(alpha));
    }

    fn fill_rect(&mut self, canvas: ElementId, rect: Rect, color: &str) {
        self.record(canvas, CanvasCommand::FillRect(rect, color.to_string()));
    }

    fn clip_rect(&mut self, canvas: ElementId, rect: Rect) {
        self.record(canvas, CanvasCommand::ClipRect(rect));
    }
}

#[cfg(test)]
pub(crate) fn test_graph() -> crate::node::SceneGraph {
    test_graph_with_probe().0
}

#[cfg(test)]
pub(crate) fn test_graph_with_probe() -> (crate::node::SceneGraph, HeadlessPlatform) {
    let platform = HeadlessPlatform::new();
    let probe = platform.clone();
    (graph_over(platform, crate::config::StageConfig::default()), probe)
}

#[cfg(test)]
pub(crate) fn test_graph_with_config(config: crate::config::StageConfig) -> crate::node::SceneGraph {
    graph_over(HeadlessPlatform::new(), config)
}

#[cfg(test)]
fn graph_over(
    platform: HeadlessPlatform,
    config: crate::config::StageConfig,
) -> crate::node::SceneGraph {
    use alloc::boxed::Box;

    crate::node::SceneGraph::new(Box::new(platform), config)
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::error::SceneError;

    #[test]
    fn insert_before_moves_attached_children() {
        let mut p = HeadlessPlatform::new();
        let root = p.root();
        let a = p.create_element("div").unwrap();
        let b = p.create_element("div").unwrap();
        let c = p.create_element("div").unwrap();
        p.insert_before(root, a, None);
        p.insert_before(root, b, None);
        p.insert_before(root, c, Some(a));
        assert_eq!(p.children(root), vec![c, a, b]);

        p.insert_before(root, c, None);
        assert_eq!(p.children(root), vec![a, b, c], "re-insert moves, never duplicates");
        p.remove_child(a, b);
        assert_eq!(p.parent(b), Some(root), "wrong parent is a no-op");
    }

    #[test]
    fn release_detaches() {
        let mut p = HeadlessPlatform::new();
        let root = p.root();
        let a = p.create_element("span").unwrap();
        p.insert_before(root, a, None);
        p.release_element(a);
        assert!(p.is_released(a));
        assert!(p.children(root).is_empty());
    }

    #[test]
    fn refused_creation_surfaces_as_scene_error() {
        let (mut g, probe) = test_graph_with_probe();
        probe.set_refuse_creation(true);
        match g.create_dom_entity("img") {
            Err(SceneError::Platform(PlatformError::CreateElement { tag, .. })) => {
                assert_eq!(tag, "img");
            }
            other => panic!("expected a platform error, got {other:?}"),
        }
        assert_eq!(g.node_count(), 0, "nothing allocated on failure");
    }
}
