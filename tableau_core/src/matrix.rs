// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2x3 affine matrices for node transforms.
//!
//! Matrices use [`kurbo::Affine`] with the canvas `setTransform` coefficient
//! layout `[a, b, c, d, e, f]`, mapping `(x, y)` to
//! `(a*x + c*y + e, b*x + d*y + f)`.
//!
//! Tree walks compose matrices through a [`MatrixStack`] owned by the walk
//! itself, so nested or re-entrant walks never share state.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Affine, Point, Vec2};

use crate::node::NodeProps;

/// Builds a node's local matrix.
///
/// Scaling and rotation (degrees) pivot around the node's origin, which
/// defaults to the center of its `width` x `height` box. The translation
/// keeps the unrotated, unscaled box at `(x, y)`.
#[must_use]
pub fn make_transform_matrix(props: &NodeProps) -> Affine {
    let theta = props.rotation.to_radians();
    let (sin, cos) = theta.sin_cos();
    let origin = props.origin();
    let (w, h) = (origin.x, origin.y);

    let a = props.scale_x * cos;
    let b = props.scale_x * sin;
    let c = props.scale_y * sin;
    let d = props.scale_y * cos;

    Affine::new([
        a,
        b,
        -c,
        d,
        -a * w + c * h + props.x + w,
        -b * w - d * h + props.y + h,
    ])
}

/// Composes two matrices: the result applies `m2` first, then `m1`.
#[must_use]
pub fn multiply(m1: Affine, m2: Affine) -> Affine {
    let [a11, a12, a21, a22, adx, ady] = m1.as_coeffs();
    let [b11, b12, b21, b22, bdx, bdy] = m2.as_coeffs();
    Affine::new([
        a11 * b11 + a21 * b12,
        a12 * b11 + a22 * b12,
        a11 * b21 + a21 * b22,
        a12 * b21 + a22 * b22,
        a11 * bdx + a21 * bdy + adx,
        a12 * bdx + a22 * bdy + ady,
    ])
}

/// Applies a matrix to a point.
#[inline]
#[must_use]
pub fn multiply_vec(m: Affine, p: Point) -> Point {
    let [m11, m12, m21, m22, mdx, mdy] = m.as_coeffs();
    Point::new(m11 * p.x + m21 * p.y + mdx, m12 * p.x + m22 * p.y + mdy)
}

/// Offset of a node under `world`: how far its origin moved.
///
/// Hit tests and overlap checks treat `offset` as the top-left of the node's
/// box in world space.
#[must_use]
pub fn offset_of(world: Affine, props: &NodeProps) -> Vec2 {
    let origin = props.origin();
    multiply_vec(world, origin) - origin
}

/// Formats a matrix as a CSS `matrix()` value with 10 decimals.
#[must_use]
pub fn css_matrix(m: Affine) -> String {
    let [a, b, c, d, e, f] = m.as_coeffs();
    alloc::format!("matrix({a:.10},{b:.10},{c:.10},{d:.10},{e:.10},{f:.10})")
}

/// A composition stack scoped to one tree walk.
///
/// The bottom entry is always the identity.
#[derive(Clone, Debug)]
pub struct MatrixStack {
    stack: Vec<Affine>,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixStack {
    /// Creates a stack holding only the identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: vec![Affine::IDENTITY],
        }
    }

    /// Drops everything above the identity.
    pub fn reset(&mut self) {
        self.stack.truncate(1);
    }

    /// Returns the top matrix.
    #[inline]
    #[must_use]
    pub fn top(&self) -> Affine {
        self.stack.last().copied().unwrap_or(Affine::IDENTITY)
    }

    /// Pushes a matrix.
    #[inline]
    pub fn push(&mut self, m: Affine) {
        self.stack.push(m);
    }

    /// Pops the top matrix. The identity base is never popped.
    pub fn pop(&mut self) -> Option<Affine> {
        if self.stack.len() > 1 {
            self.stack.pop()
        } else {
            None
        }
    }

    /// Number of entries above the identity.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: Affine, b: Affine) -> bool {
        a.as_coeffs()
            .iter()
            .zip(b.as_coeffs().iter())
            .all(|(x, y)| (x - y).abs() < 1e-6)
    }

    fn props(x: f64, y: f64, sx: f64, sy: f64, rot: f64, w: f64, h: f64) -> NodeProps {
        NodeProps {
            x,
            y,
            scale_x: sx,
            scale_y: sy,
            rotation: rot,
            width: w,
            height: h,
            ..NodeProps::default()
        }
    }

    /// Small deterministic generator so the test needs no RNG crate.
    struct Lcg(u64);

    impl Lcg {
        fn sample(&mut self) -> f64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let v = (self.0 >> 11) as f64 / (1_u64 << 53) as f64;
            v * 200.0 - 100.0
        }
    }

    #[test]
    fn default_props_give_identity() {
        let m = make_transform_matrix(&NodeProps::default());
        assert!(close(m, Affine::IDENTITY), "got {m:?}");
    }

    #[test]
    fn translation_only() {
        let m = make_transform_matrix(&props(10.0, 20.0, 1.0, 1.0, 0.0, 50.0, 30.0));
        assert!(close(m, Affine::translate((10.0, 20.0))), "got {m:?}");
    }

    #[test]
    fn rotation_pivots_on_center() {
        let p = props(5.0, 7.0, 2.0, 3.0, 37.0, 40.0, 20.0);
        let m = make_transform_matrix(&p);
        let center = multiply_vec(m, Point::new(20.0, 10.0));
        assert!((center.x - 25.0).abs() < EPS, "center x {}", center.x);
        assert!((center.y - 17.0).abs() < EPS, "center y {}", center.y);
    }

    #[test]
    fn explicit_origin_overrides_center() {
        let mut p = props(0.0, 0.0, 1.0, 1.0, 90.0, 40.0, 20.0);
        p.origin_x = Some(0.0);
        p.origin_y = Some(0.0);
        let m = make_transform_matrix(&p);
        let q = multiply_vec(m, Point::new(10.0, 0.0));
        assert!(q.x.abs() < EPS && (q.y - 10.0).abs() < EPS, "got {q:?}");
    }

    #[test]
    fn multiply_matches_kurbo() {
        let a = make_transform_matrix(&props(1.0, 2.0, 1.5, 0.5, 30.0, 10.0, 10.0));
        let b = make_transform_matrix(&props(-4.0, 9.0, 0.7, 2.0, -75.0, 6.0, 3.0));
        assert!(close(multiply(a, b), a * b), "multiply diverges from Affine::mul");
    }

    #[test]
    fn composition_is_associative() {
        let mut rng = Lcg(0x5eed);
        for _ in 0..64 {
            let mut m = [Affine::IDENTITY; 3];
            for slot in &mut m {
                *slot = make_transform_matrix(&props(
                    rng.sample(),
                    rng.sample(),
                    rng.sample() / 50.0,
                    rng.sample() / 50.0,
                    rng.sample() * 3.6,
                    rng.sample().abs(),
                    rng.sample().abs(),
                ));
            }
            let left = multiply(multiply(m[0], m[1]), m[2]);
            let right = multiply(m[0], multiply(m[1], m[2]));
            assert!(close(left, right), "{left:?} != {right:?}");
        }
    }

    #[test]
    fn offset_is_displacement_of_origin() {
        let p = props(3.0, 4.0, 1.0, 1.0, 0.0, 10.0, 10.0);
        let off = offset_of(make_transform_matrix(&p), &p);
        assert!((off.x - 3.0).abs() < EPS && (off.y - 4.0).abs() < EPS, "got {off:?}");
    }

    #[test]
    fn css_matrix_uses_fixed_precision() {
        let s = css_matrix(Affine::translate((1.0, 2.5)));
        assert_eq!(
            s,
            "matrix(1.0000000000,0.0000000000,0.0000000000,1.0000000000,1.0000000000,2.5000000000)"
        );
    }

    #[test]
    fn stack_keeps_identity_base() {
        let mut s = MatrixStack::new();
        assert_eq!(s.depth(), 0);
        assert_eq!(s.pop(), None);
        s.push(Affine::scale(2.0));
        s.push(Affine::scale(3.0));
        assert_eq!(s.depth(), 2);
        assert_eq!(s.top(), Affine::scale(3.0));
        s.reset();
        assert_eq!(s.top(), Affine::IDENTITY);
    }
}
