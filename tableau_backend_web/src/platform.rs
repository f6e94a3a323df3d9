// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM and 2D canvas access through `web-sys`.

use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};
use tableau_core::platform::{CanvasSurface, DomSurface, ElementId, PlatformError};
use tracing::debug;
use wasm_bindgen::JsCast as _;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, Node};

struct Slot {
    element: HtmlElement,
    canvas: Option<Canvas>,
}

struct Canvas {
    element: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

/// A [`Platform`](tableau_core::Platform) over the live document.
///
/// Elements are kept in a slot table indexed by [`ElementId`]; slot 0 is the
/// stage container passed to [`new`](Self::new). DOM calls that only fail on
/// misuse (moving a node into itself, removing a non-child) are ignored, as
/// they would be from script.
pub struct WebPlatform {
    document: Document,
    slots: Vec<Option<Slot>>,
}

impl core::fmt::Debug for WebPlatform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebPlatform")
            .field("slots", &self.slots.len())
            .field("live", &self.slots.iter().flatten().count())
            .finish_non_exhaustive()
    }
}

impl WebPlatform {
    /// Creates a platform rendering into `root`.
    ///
    /// # Errors
    ///
    /// Fails if `root` is not attached to a document.
    pub fn new(root: HtmlElement) -> Result<Self, PlatformError> {
        let document = root.owner_document().ok_or_else(|| PlatformError::CreateElement {
            tag: "root".to_string(),
            reason: "element has no owner document".to_string(),
        })?;
        Ok(Self {
            document,
            slots: alloc::vec![Some(Slot {
                element: root,
                canvas: None,
            })],
        })
    }

    /// Returns the element behind `id`, for hosts that attach listeners.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&HtmlElement> {
        self.slot(id).map(|s| &s.element)
    }

    fn slot(&self, id: ElementId) -> Option<&Slot> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn context(&self, id: ElementId) -> Option<&CanvasRenderingContext2d> {
        self.slot(id).and_then(|s| s.canvas.as_ref()).map(|c| &c.context)
    }

    fn store(&mut self, slot: Slot) -> Result<ElementId, PlatformError> {
        let id = u32::try_from(self.slots.len()).map_err(|_| PlatformError::CreateElement {
            tag: slot.element.tag_name(),
            reason: "element table full".to_string(),
        })?;
        self.slots.push(Some(slot));
        Ok(ElementId(id))
    }

    fn create_html(&self, tag: &str) -> Result<HtmlElement, PlatformError> {
        let element = self
            .document
            .create_element(tag)
            .map_err(|err| PlatformError::CreateElement {
                tag: tag.to_string(),
                reason: format!("{err:?}"),
            })?;
        element
            .dyn_into::<HtmlElement>()
            .map_err(|_| PlatformError::CreateElement {
                tag: tag.to_string(),
                reason: "not an HTML element".to_string(),
            })
    }
}

impl DomSurface for WebPlatform {
    fn root(&self) -> ElementId {
        ElementId(0)
    }

    fn create_element(&mut self, tag: &str) -> Result<ElementId, PlatformError> {
        let element = self.create_html(tag)?;
        self.store(Slot {
            element,
            canvas: None,
        })
    }

    fn create_canvas(&mut self, width: u32, height: u32) -> Result<ElementId, PlatformError> {
        let element = self.create_html("canvas")?;
        let canvas: HtmlCanvasElement = element
            .clone()
            .dyn_into()
            .map_err(|_| PlatformError::ContextUnavailable("not a canvas".to_string()))?;
        canvas.set_width(width);
        canvas.set_height(height);
        let context = canvas
            .get_context("2d")
            .map_err(|err| PlatformError::ContextUnavailable(format!("{err:?}")))?
            .ok_or_else(|| PlatformError::ContextUnavailable("no 2d context".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| PlatformError::ContextUnavailable("unexpected context type".to_string()))?;
        self.store(Slot {
            element,
            canvas: Some(Canvas {
                element: canvas,
                context,
            }),
        })
    }

    fn resize_canvas(&mut self, canvas: ElementId, width: u32, height: u32) {
        if let Some(c) = self.slot(canvas).and_then(|s| s.canvas.as_ref()) {
            c.element.set_width(width);
            c.element.set_height(height);
        }
    }

    fn release_element(&mut self, element: ElementId) {
        if element == self.root() {
            return;
        }
        if let Some(slot) = self.slots.get_mut(element.0 as usize).and_then(Option::take) {
            slot.element.remove();
            debug!(?element, "element released");
        }
    }

    fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>) {
        let (Some(p), Some(c)) = (self.slot(parent), self.slot(child)) else {
            return;
        };
        let reference = reference
            .and_then(|r| self.slot(r))
            .map(|r| -> &Node { &r.element });
        let _ = p.element.insert_before(&c.element, reference);
    }

    fn remove_child(&mut self, parent: ElementId, child: ElementId) {
        if let (Some(p), Some(c)) = (self.slot(parent), self.slot(child)) {
            let _ = p.element.remove_child(&c.element);
        }
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) {
        if let Some(s) = self.slot(element) {
            let _ = s.element.style().set_property(property, value);
        }
    }
}

impl CanvasSurface for WebPlatform {
    fn clear(&mut self, canvas: ElementId) {
        if let Some(c) = self.slot(canvas).and_then(|s| s.canvas.as_ref()) {
            let _ = c.context.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
            c.context.clear_rect(
                0.0,
                0.0,
                f64::from(c.element.width()),
                f64::from(c.element.height()),
            );
        }
    }

    fn save(&mut self, canvas: ElementId) {
        if let Some(ctx) = self.context(canvas) {
            ctx.save();
        }
    }

    fn restore(&mut self, canvas: ElementId) {
        if let Some(ctx) = self.context(canvas) {
            ctx.restore();
        }
    }

    fn set_transform(&mut self, canvas: ElementId, transform: Affine) {
        if let Some(ctx) = self.context(canvas) {
            let [a, b, c, d, e, f] = transform.as_coeffs();
            let _ = ctx.set_transform(a, b, c, d, e, f);
        }
    }

    fn set_global_alpha(&mut self, canvas: ElementId, alpha: f64) {
        if let Some(ctx) = self.context(canvas) {
            ctx.set_global_alpha(alpha);
        }
    }

    fn fill_rect(&mut self, canvas: ElementId, rect: Rect, color: &str) {
        if let Some(ctx) = self.context(canvas) {
            ctx.set_fill_style_str(color);
            ctx.fill_rect(rect.x0, rect.y0, rect.width(), rect.height());
        }
    }

    fn clip_rect(&mut self, canvas: ElementId, rect: Rect) {
        if let Some(ctx) = self.context(canvas) {
            ctx.begin_path();
            ctx.rect(rect.x0, rect.y0, rect.width(), rect.height());
            ctx.clip();
        }
    }
}
