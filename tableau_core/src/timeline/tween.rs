// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property interpolation actions.

use alloc::vec::Vec;

use super::action::{Action, ActionKind};
use super::easing::Easing;
use crate::node::{NodeId, NodeProperty, SceneGraph};

/// Values this close to zero snap to exactly zero.
const SNAP_TO_ZERO: f64 = 1e-7;

/// Where a tweened property ends up.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TweenTarget {
    /// An absolute value.
    To(f64),
    /// An offset from the value when the tween starts.
    By(f64),
    /// A multiple of the value when the tween starts.
    Times(f64),
}

/// Interpolates numeric node properties over a duration.
///
/// Origins are read when the tween starts, not when it is built, so chained
/// tweens compose. Each tick adds the eased share of the change for that
/// tick rather than writing absolute values; other writers to the same
/// property during the tween are kept.
#[derive(Clone, Debug)]
pub struct Tween {
    time: f64,
    easing: Easing,
    targets: Vec<(NodeProperty, TweenTarget)>,
    /// `(origin, end)` per target, filled on start.
    resolved: Vec<(f64, f64)>,
}

impl Tween {
    /// Creates a linear tween lasting `time`, with no properties yet.
    #[must_use]
    pub fn new(time: f64) -> Self {
        Self {
            time,
            easing: Easing::Linear,
            targets: Vec::new(),
            resolved: Vec::new(),
        }
    }

    /// Sets the curve.
    #[must_use]
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Tweens `property` to `value`.
    #[must_use]
    pub fn to(mut self, property: NodeProperty, value: f64) -> Self {
        self.targets.push((property, TweenTarget::To(value)));
        self
    }

    /// Tweens `property` by `delta`.
    #[must_use]
    pub fn by(mut self, property: NodeProperty, delta: f64) -> Self {
        self.targets.push((property, TweenTarget::By(delta)));
        self
    }

    /// Tweens `property` to `factor` times its start value.
    #[must_use]
    pub fn times(mut self, property: NodeProperty, factor: f64) -> Self {
        self.targets.push((property, TweenTarget::Times(factor)));
        self
    }

    /// Reads the start values and resolves relative targets.
    pub(crate) fn capture(&mut self, g: &SceneGraph, node: NodeId) {
        if !g.is_alive(node) {
            return;
        }
        let props = g.props(node);
        self.resolved = self
            .targets
            .iter()
            .map(|&(property, target)| {
                let origin = property.get(props);
                let end = match target {
                    TweenTarget::To(v) => v,
                    TweenTarget::By(d) => origin + d,
                    TweenTarget::Times(k) => origin * k,
                };
                (origin, end)
            })
            .collect();
    }

    /// Adds this tick's share of every change.
    pub(crate) fn apply(&self, g: &mut SceneGraph, node: NodeId, time: f64, frame: f64, elapsed: f64) {
        let ratio = if time <= 0.0 {
            if frame > 0.0 { 0.0 } else { 1.0 }
        } else {
            self.easing.progress(time.min(frame + elapsed), time) - self.easing.progress(frame, time)
        };
        for (&(property, _), &(origin, end)) in self.targets.iter().zip(&self.resolved) {
            let mut value = property.get(g.props(node)) + (end - origin) * ratio;
            if value.abs() < SNAP_TO_ZERO {
                value = 0.0;
            }
            g.set_property(node, property, value);
        }
    }
}

impl From<Tween> for Action {
    fn from(tween: Tween) -> Self {
        Self::with_kind(Some(tween.time), ActionKind::Tween(tween))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::test_graph;
    use crate::timeline::action::Step;

    const EPS: f64 = 1e-9;

    #[test]
    fn linear_tween_reaches_target_in_steps() {
        let mut g = test_graph();
        let node = g.create_entity();
        g.set_x(node, 10.0);
        let mut a: Action = Tween::new(4.0).to(NodeProperty::X, 30.0).into();
        a.start(&mut g, node).unwrap();
        let mut xs = Vec::new();
        while a.tick(&mut g, node, 1.0).unwrap() == Step::Running {
            xs.push(g.props(node).x);
        }
        assert_eq!(xs, [15.0, 20.0, 25.0]);
        assert!((g.props(node).x - 30.0).abs() < EPS);
    }

    #[test]
    fn relative_target_resolves_at_start() {
        let mut g = test_graph();
        let node = g.create_entity();
        let mut a: Action = Tween::new(2.0).by(NodeProperty::Rotation, 90.0).into();
        g.set_rotation(node, 45.0);
        a.start(&mut g, node).unwrap();
        a.tick(&mut g, node, 5.0).unwrap();
        assert!((g.props(node).rotation - 135.0).abs() < EPS);
    }

    #[test]
    fn tween_keeps_concurrent_writes() {
        let mut g = test_graph();
        let node = g.create_entity();
        let mut a: Action = Tween::new(2.0).by(NodeProperty::Y, 10.0).into();
        a.start(&mut g, node).unwrap();
        a.tick(&mut g, node, 1.0).unwrap();
        g.move_by(node, 0.0, 100.0);
        a.tick(&mut g, node, 1.0).unwrap();
        assert!((g.props(node).y - 110.0).abs() < EPS);
    }

    #[test]
    fn zero_time_applies_everything_at_once() {
        let mut g = test_graph();
        let node = g.create_entity();
        let mut a: Action = Tween::new(0.0)
            .to(NodeProperty::Opacity, 0.0)
            .to(NodeProperty::ScaleX, 3.0)
            .into();
        a.start(&mut g, node).unwrap();
        assert_eq!(a.tick(&mut g, node, 0.0).unwrap(), Step::Finished(0.0));
        let p = g.props(node);
        assert_eq!((p.opacity, p.scale_x), (0.0, 3.0));
    }

    #[test]
    fn eased_tween_lands_exactly() {
        let mut g = test_graph();
        let node = g.create_entity();
        let mut a: Action = Tween::new(3.0)
            .easing(Easing::BackOut)
            .to(NodeProperty::X, -40.0)
            .into();
        a.start(&mut g, node).unwrap();
        while a.tick(&mut g, node, 1.0).unwrap() == Step::Running {}
        assert!((g.props(node).x + 40.0).abs() < EPS, "got {}", g.props(node).x);
    }
}
