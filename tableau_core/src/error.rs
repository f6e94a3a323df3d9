// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by every fallible scene-graph operation.

use crate::event::EventType;
use crate::node::NodeId;
use crate::platform::PlatformError;

/// Errors raised by scene-graph, layer and timeline operations.
///
/// Two families matter to callers:
///
/// - Invariant violations ([`MissingPayload`](Self::MissingPayload),
///   [`LayerNotAssigned`](Self::LayerNotAssigned)) indicate a bug upstream.
///   They abort the dispatch in flight and surface from the frame call.
/// - Structural misuse ([`InvalidInsertionPoint`](Self::InvalidInsertionPoint),
///   [`NotAGroup`](Self::NotAGroup), [`CycleDetected`](Self::CycleDetected),
///   [`SceneAsChild`](Self::SceneAsChild)) is rejected at the call site
///   before the graph is touched.
///
/// Removing a node that is not a child, popping the root scene and unbinding
/// an unknown key are not errors; those calls are no-ops.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// An event reached a handler without a payload field it requires.
    #[error("`{event}` event is missing its `{field}` payload")]
    MissingPayload {
        /// The event type that was dispatched.
        event: EventType,
        /// Name of the absent field.
        field: &'static str,
    },

    /// A DOM manager tried to touch the platform before a layer was assigned.
    #[error("DOM manager of {node:?} has no layer assigned")]
    LayerNotAssigned {
        /// Node owning the manager.
        node: NodeId,
    },

    /// The "insert before" reference is not a child of the target parent,
    /// or sits in another layer of the target scene.
    #[error("{reference:?} is not a valid insertion point in {parent:?}")]
    InvalidInsertionPoint {
        /// Parent receiving the insertion.
        parent: NodeId,
        /// Rejected reference node.
        reference: NodeId,
    },

    /// Children can only be added to groups, scenes and layers.
    #[error("{0:?} cannot own children")]
    NotAGroup(NodeId),

    /// The child is an ancestor of (or equal to) the parent.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    CycleDetected {
        /// Requested parent.
        parent: NodeId,
        /// Requested child.
        child: NodeId,
    },

    /// A scene-only operation was given another kind of node.
    #[error("{0:?} is not a scene")]
    NotAScene(NodeId),

    /// Scenes and layers are roots and cannot be parented.
    #[error("{0:?} is a scene or layer and cannot be added as a child")]
    SceneAsChild(NodeId),

    /// A timeline operation was issued while that timeline is being ticked.
    #[error("timeline of {0:?} is busy ticking")]
    TimelineBusy(NodeId),

    /// The platform failed to create a native resource.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Result alias used throughout the crate.
pub type Result<T, E = SceneError> = core::result::Result<T, E>;
