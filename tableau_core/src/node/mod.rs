// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-graph data model.
//!
//! A *node* is an element of the display tree. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: parent, first-child and sibling links forming an ordered tree.
//!   Child order is paint order.
//! - **Local properties** ([`NodeProps`]) written through the graph's setters.
//! - **Computed properties**: the world matrix and world offset, resolved
//!   lazily by [`matrix`](SceneGraph::matrix) and by the layer renderers.
//!
//! # Invalidation
//!
//! Every transform setter that changes a value marks the node *dirty* and
//! pushes the flag down to every descendant. Reading a world matrix walks up
//! from the node only while the current node is dirty, then composes the
//! collected spine top-down, clearing flags as it goes. A leaf mutation
//! therefore costs a walk over the dirty spine, never the whole tree.
//!
//! Renderers keep a second flag per node that survives coordinate reads, so a
//! DOM element is rewritten once per actual transform change even if a hit
//! test resolved the matrix in between.

mod coordinate;
mod dispatch;
mod id;
mod props;
mod store;
mod traverse;
mod tree;

pub(crate) use id::INVALID;
pub use id::NodeId;
pub use props::{NodeProperty, NodeProps};
pub(crate) use store::{NodeKind, pixel_extent};
pub use store::{NodeType, SceneGraph};
pub use traverse::Children;
