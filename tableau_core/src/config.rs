// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage configuration.

/// Settings shared by the stage, its scenes and their layers.
///
/// With the `serde` feature, missing fields fall back to [`Default`], so a
/// partial document such as `{ "width": 640 }` is valid.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StageConfig {
    /// Stage width in game pixels. New scenes and layers take this size.
    pub width: f64,
    /// Stage height in game pixels.
    pub height: f64,
    /// Nominal frame rate, used for the first tick's elapsed time.
    pub fps: f64,
    /// Ratio between page pixels and game pixels.
    pub scale: f64,
    /// Mode given to newly created timelines.
    pub frame_based_timelines: bool,
    /// Outline every DOM-rendered element.
    pub debug_borders: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: 320.0,
            height: 320.0,
            fps: 30.0,
            scale: 1.0,
            frame_based_timelines: true,
            debug_borders: false,
        }
    }
}

impl StageConfig {
    /// Sets the stage size.
    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the nominal frame rate.
    #[must_use]
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    /// Sets the page-to-game scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Makes new timelines advance by elapsed milliseconds instead of frames.
    #[must_use]
    pub fn with_time_based_timelines(mut self) -> Self {
        self.frame_based_timelines = false;
        self
    }

    /// Enables element outlines.
    #[must_use]
    pub fn with_debug_borders(mut self, on: bool) -> Self {
        self.debug_borders = on;
        self
    }

    /// Milliseconds per frame at the nominal rate.
    #[must_use]
    pub fn frame_interval(&self) -> f64 {
        if self.fps > 0.0 { 1000.0 / self.fps } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_chain() {
        let c = StageConfig::default()
            .with_size(640.0, 480.0)
            .with_fps(60.0)
            .with_time_based_timelines();
        assert_eq!((c.width, c.height), (640.0, 480.0));
        assert!(!c.frame_based_timelines);
        assert!((c.frame_interval() - 16.666_666).abs() < 1e-3);
    }

    #[test]
    fn zero_fps_has_no_interval() {
        let c = StageConfig::default().with_fps(0.0);
        assert_eq!(c.frame_interval(), 0.0);
    }
}
