// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node properties set by callers.

use alloc::string::String;

use kurbo::Point;

/// Local properties of a node.
///
/// These are read freely through [`SceneGraph::props`](super::SceneGraph::props)
/// but only written through the graph's setters, which keep the dirty flags
/// and the platform in sync.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeProps {
    /// Left edge in the parent's space.
    pub x: f64,
    /// Top edge in the parent's space.
    pub y: f64,
    /// Horizontal scale around the origin.
    pub scale_x: f64,
    /// Vertical scale around the origin.
    pub scale_y: f64,
    /// Clockwise rotation in degrees around the origin.
    pub rotation: f64,
    /// Pivot x in local space. `None` means half the width.
    pub origin_x: Option<f64>,
    /// Pivot y in local space. `None` means half the height.
    pub origin_y: Option<f64>,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
    /// Opacity in `0.0..=1.0`.
    pub opacity: f64,
    /// Whether the node (and, on canvas, its subtree) is drawn.
    pub visible: bool,
    /// CSS color filling the box, if any.
    pub background_color: Option<String>,
    /// Whether canvas hit testing may return this node.
    pub touch_enabled: bool,
}

impl Default for NodeProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            origin_x: None,
            origin_y: None,
            width: 0.0,
            height: 0.0,
            opacity: 1.0,
            visible: true,
            background_color: None,
            touch_enabled: true,
        }
    }
}

impl NodeProps {
    /// Returns the pivot, resolving unset components to the box center.
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(
            self.origin_x.unwrap_or(self.width / 2.0),
            self.origin_y.unwrap_or(self.height / 2.0),
        )
    }
}

/// A numeric node property that tweens can drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeProperty {
    /// [`NodeProps::x`].
    X,
    /// [`NodeProps::y`].
    Y,
    /// [`NodeProps::scale_x`].
    ScaleX,
    /// [`NodeProps::scale_y`].
    ScaleY,
    /// [`NodeProps::rotation`].
    Rotation,
    /// [`NodeProps::opacity`].
    Opacity,
    /// [`NodeProps::width`].
    Width,
    /// [`NodeProps::height`].
    Height,
}

impl NodeProperty {
    /// Reads the property from `props`.
    #[must_use]
    pub fn get(self, props: &NodeProps) -> f64 {
        match self {
            Self::X => props.x,
            Self::Y => props.y,
            Self::ScaleX => props.scale_x,
            Self::ScaleY => props.scale_y,
            Self::Rotation => props.rotation,
            Self::Opacity => props.opacity,
            Self::Width => props.width,
            Self::Height => props.height,
        }
    }

    /// Returns whether a change to this property moves the node's transform.
    #[must_use]
    pub fn affects_transform(self) -> bool {
        !matches!(self, Self::Opacity)
    }
}
