// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph, dual DOM/canvas layers and per-node timelines for 2D
//! browser games.
//!
//! `tableau_core` is platform-neutral. It keeps nodes in a generational
//! struct-of-arrays store and talks to the host only through the
//! [`Platform`](platform::Platform) traits; `tableau_backend_web` implements
//! them over `web-sys`, and [`HeadlessPlatform`] implements them in memory.
//!
//! # Architecture
//!
//! ```text
//!   host clock ──► Stage::tick(now)
//!                      │ enterframe (nodes, scene, stage)
//!                      ▼
//!   SceneGraph ── timelines tick, listeners mutate nodes
//!                      │ exitframe
//!                      ▼
//!   Scene ──► Layer(Dom)    ──► DomManager ──► styles / CSS matrix
//!         └─► Layer(Canvas) ──► save / transform / fill / restore
//! ```
//!
//! **[`node`]**: the store. Nodes are entities, groups, scenes or layers.
//! Changing a transform property marks the node and every descendant
//! dirty; world matrices and page offsets are recomputed lazily.
//!
//! **[`scene`]**: a scene routes each child to a DOM layer (if the child
//! has a native element) or a canvas layer, and resolves pointer targets
//! through them.
//!
//! **[`layer`]**: DOM layers mirror the subtree as positioned elements with
//! a write-deduplicating style cache. Canvas layers repaint the subtree and
//! hit-test it geometrically.
//!
//! **[`timeline`]**: per-node action queues with tweens and easing, advanced
//! by frames or by elapsed milliseconds.
//!
//! **[`stage`]**: the scene stack, the frame protocol and input routing.
//!
//! # Crate features
//!
//! - `serde` (disabled by default): `Serialize`/`Deserialize` for
//!   [`StageConfig`], [`NodeProps`], [`NodeProperty`], [`Easing`] and
//!   [`Button`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod error;
pub mod event;
pub mod headless;
pub mod layer;
pub mod matrix;
pub mod node;
pub mod platform;
pub mod scene;
pub mod stage;
pub mod target;
pub mod timeline;

pub use config::StageConfig;
pub use error::{Result, SceneError};
pub use event::{Button, Event, EventType};
pub use headless::HeadlessPlatform;
pub use layer::Backend;
pub use node::{NodeId, NodeProperty, NodeProps, NodeType, SceneGraph};
pub use platform::{ElementId, Platform, PlatformError};
pub use stage::{Stage, TouchPhase};
pub use target::{EventTarget, Listener, listener};
pub use timeline::{Action, Easing, Timeline, TimelineRef, Tween};
