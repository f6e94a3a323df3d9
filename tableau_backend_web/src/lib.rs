// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for tableau.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebPlatform`]: DOM elements and 2D canvases behind the
//!   [`Platform`](tableau_core::Platform) traits
//! - [`RafLoop`]: `requestAnimationFrame` tick source
//! - [`drive`]: runs a [`Stage`](tableau_core::Stage) from a [`RafLoop`]

extern crate alloc;

mod platform;
mod raf;

pub use platform::WebPlatform;
pub use raf::{RafLoop, drive};

/// Returns the current host time from `performance.now()`, in milliseconds.
#[must_use]
pub fn now() -> f64 {
    raf::performance_now()
}
