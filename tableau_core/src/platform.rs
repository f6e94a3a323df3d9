// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The seam between the scene graph and the host's native element tree.
//!
//! The core never talks to a browser directly. Layers and managers drive a
//! [`Platform`], which is the union of [`DomSurface`] (element tree and
//! styles) and [`CanvasSurface`] (2D drawing). Elements, including canvases,
//! are addressed through opaque [`ElementId`] handles owned by the platform.
//!
//! [`HeadlessPlatform`](crate::headless::HeadlessPlatform) implements these
//! traits in memory; `tableau_backend_web` implements them over `web-sys`.

use core::fmt;

use kurbo::{Affine, Rect};

use crate::layer::StyleMap;
use crate::node::NodeProps;

/// An opaque reference to a platform element.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

/// Failures reported by a platform while creating native resources.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// The host refused to create an element.
    #[error("failed to create <{tag}> element: {reason}")]
    CreateElement {
        /// Requested tag name.
        tag: String,
        /// Host-provided reason.
        reason: String,
    },
    /// A canvas exists but its 2D context could not be obtained.
    #[error("2d context unavailable: {0}")]
    ContextUnavailable(String),
}

/// Element tree operations.
pub trait DomSurface {
    /// The stage container that scenes are appended to.
    fn root(&self) -> ElementId;

    /// Creates a detached element with the given tag.
    fn create_element(&mut self, tag: &str) -> Result<ElementId, PlatformError>;

    /// Creates a detached canvas element with a 2D context.
    fn create_canvas(&mut self, width: u32, height: u32) -> Result<ElementId, PlatformError>;

    /// Resizes a canvas backing store.
    fn resize_canvas(&mut self, canvas: ElementId, width: u32, height: u32);

    /// Forgets an element. Detaches it first if it is still in the tree.
    fn release_element(&mut self, element: ElementId);

    /// Inserts `child` into `parent` before `reference`, or appends when
    /// `reference` is `None`. An attached `child` is moved.
    fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>);

    /// Removes `child` from `parent`. Does nothing if it is not a child.
    fn remove_child(&mut self, parent: ElementId, child: ElementId);

    /// Writes one inline style property.
    fn set_style(&mut self, element: ElementId, property: &str, value: &str);
}

/// 2D drawing operations on a canvas element.
pub trait CanvasSurface {
    /// Clears the whole canvas.
    fn clear(&mut self, canvas: ElementId);

    /// Pushes the drawing state.
    fn save(&mut self, canvas: ElementId);

    /// Pops the drawing state.
    fn restore(&mut self, canvas: ElementId);

    /// Replaces the current transform.
    fn set_transform(&mut self, canvas: ElementId, transform: Affine);

    /// Sets the alpha applied to subsequent drawing.
    fn set_global_alpha(&mut self, canvas: ElementId, alpha: f64);

    /// Fills `rect` with a CSS color.
    fn fill_rect(&mut self, canvas: ElementId, rect: Rect, color: &str);

    /// Intersects the clip region with `rect`.
    fn clip_rect(&mut self, canvas: ElementId, rect: Rect);
}

/// A complete host: element tree plus canvas drawing.
pub trait Platform: DomSurface + CanvasSurface {}

impl<T: DomSurface + CanvasSurface> Platform for T {}

/// Per-node drawing hooks.
///
/// Both methods run after the node's transform is current. The DOM hook
/// contributes style entries that pass through the same dedup cache as the
/// built-in ones; the canvas hook draws in the node's local space.
pub trait NodeRenderer {
    /// Adds node-specific style entries for a DOM-rendered node.
    fn dom_render(&self, props: &NodeProps, style: &mut StyleMap) {
        let _ = (props, style);
    }

    /// Draws a canvas-rendered node.
    fn canvas_render(&self, props: &NodeProps, canvas: ElementId, ctx: &mut dyn CanvasSurface) {
        let _ = (props, canvas, ctx);
    }
}
