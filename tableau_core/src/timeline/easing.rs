// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Penner easing curves.

use core::f64::consts::{FRAC_PI_2, PI};

const BACK_OVERSHOOT: f64 = 1.70158;
const BACK_OVERSHOOT_IN_OUT: f64 = BACK_OVERSHOOT * 1.525;

/// An easing curve.
///
/// Every curve is evaluated as `f(t, b, c, d)`: the value at time `t` of a
/// change from `b` to `b + c` over duration `d`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[expect(missing_docs, reason = "variant names are the curve names")]
pub enum Easing {
    #[default]
    Linear,
    Swing,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuartIn,
    QuartOut,
    QuartInOut,
    QuintIn,
    QuintOut,
    QuintInOut,
    SinIn,
    SinOut,
    SinInOut,
    CircIn,
    CircOut,
    CircInOut,
    ExpoIn,
    ExpoOut,
    ExpoInOut,
    BackIn,
    BackOut,
    BackInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
}

impl Easing {
    /// Evaluates the curve.
    #[must_use]
    pub fn apply(self, t: f64, b: f64, c: f64, d: f64) -> f64 {
        match self {
            Self::Linear => c * t / d + b,
            Self::Swing => c * (0.5 - (t / d * PI).cos() / 2.0) + b,

            Self::QuadIn => {
                let t = t / d;
                c * t * t + b
            }
            Self::QuadOut => {
                let t = t / d;
                -c * t * (t - 2.0) + b
            }
            Self::QuadInOut => {
                let t = t / (d / 2.0);
                if t < 1.0 {
                    c / 2.0 * t * t + b
                } else {
                    let t = t - 1.0;
                    -c / 2.0 * (t * (t - 2.0) - 1.0) + b
                }
            }

            Self::CubicIn => c * (t / d).powi(3) + b,
            Self::CubicOut => c * ((t / d - 1.0).powi(3) + 1.0) + b,
            Self::CubicInOut => {
                let t = t / (d / 2.0);
                if t < 1.0 {
                    c / 2.0 * t.powi(3) + b
                } else {
                    c / 2.0 * ((t - 2.0).powi(3) + 2.0) + b
                }
            }

            Self::QuartIn => c * (t / d).powi(4) + b,
            Self::QuartOut => -c * ((t / d - 1.0).powi(4) - 1.0) + b,
            Self::QuartInOut => {
                let t = t / (d / 2.0);
                if t < 1.0 {
                    c / 2.0 * t.powi(4) + b
                } else {
                    -c / 2.0 * ((t - 2.0).powi(4) - 2.0) + b
                }
            }

            Self::QuintIn => c * (t / d).powi(5) + b,
            Self::QuintOut => c * ((t / d - 1.0).powi(5) + 1.0) + b,
            Self::QuintInOut => {
                let t = t / (d / 2.0);
                if t < 1.0 {
                    c / 2.0 * t.powi(5) + b
                } else {
                    c / 2.0 * ((t - 2.0).powi(5) + 2.0) + b
                }
            }

            Self::SinIn => -c * (t / d * FRAC_PI_2).cos() + c + b,
            Self::SinOut => c * (t / d * FRAC_PI_2).sin() + b,
            Self::SinInOut => -c / 2.0 * ((PI * t / d).cos() - 1.0) + b,

            Self::CircIn => {
                let t = t / d;
                -c * ((1.0 - t * t).sqrt() - 1.0) + b
            }
            Self::CircOut => {
                let t = t / d - 1.0;
                c * (1.0 - t * t).sqrt() + b
            }
            Self::CircInOut => {
                let t = t / (d / 2.0);
                if t < 1.0 {
                    -c / 2.0 * ((1.0 - t * t).sqrt() - 1.0) + b
                } else {
                    let t = t - 2.0;
                    c / 2.0 * ((1.0 - t * t).sqrt() + 1.0) + b
                }
            }

            Self::ExpoIn => {
                if t == 0.0 {
                    b
                } else {
                    c * 2_f64.powf(10.0 * (t / d - 1.0)) + b
                }
            }
            Self::ExpoOut => {
                if t == d {
                    b + c
                } else {
                    c * (1.0 - 2_f64.powf(-10.0 * t / d)) + b
                }
            }
            Self::ExpoInOut => {
                if t == 0.0 {
                    return b;
                }
                if t == d {
                    return b + c;
                }
                let t = t / (d / 2.0);
                if t < 1.0 {
                    c / 2.0 * 2_f64.powf(10.0 * (t - 1.0)) + b
                } else {
                    c / 2.0 * (2.0 - 2_f64.powf(-10.0 * (t - 1.0))) + b
                }
            }

            Self::BackIn => {
                let s = BACK_OVERSHOOT;
                let t = t / d;
                c * t * t * ((s + 1.0) * t - s) + b
            }
            Self::BackOut => {
                let s = BACK_OVERSHOOT;
                let t = t / d - 1.0;
                c * (t * t * ((s + 1.0) * t + s) + 1.0) + b
            }
            Self::BackInOut => {
                let s = BACK_OVERSHOOT_IN_OUT;
                let t = t / (d / 2.0);
                if t < 1.0 {
                    c / 2.0 * (t * t * ((s + 1.0) * t - s)) + b
                } else {
                    let t = t - 2.0;
                    c / 2.0 * (t * t * ((s + 1.0) * t + s) + 2.0) + b
                }
            }

            Self::BounceOut => bounce_out(t, b, c, d),
            Self::BounceIn => c - bounce_out(d - t, 0.0, c, d) + b,
            Self::BounceInOut => {
                if t < d / 2.0 {
                    (c - bounce_out(d - t * 2.0, 0.0, c, d)) * 0.5 + b
                } else {
                    bounce_out(t * 2.0 - d, 0.0, c, d) * 0.5 + c * 0.5 + b
                }
            }
        }
    }

    /// Progress in `[0, 1]` (outside it for overshooting curves) after `t` of
    /// a duration `d`.
    #[must_use]
    pub fn progress(self, t: f64, d: f64) -> f64 {
        self.apply(t, 0.0, 1.0, d)
    }
}

fn bounce_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    if t < 1.0 / 2.75 {
        c * (7.5625 * t * t) + b
    } else if t < 2.0 / 2.75 {
        let t = t - 1.5 / 2.75;
        c * (7.5625 * t * t + 0.75) + b
    } else if t < 2.5 / 2.75 {
        let t = t - 2.25 / 2.75;
        c * (7.5625 * t * t + 0.9375) + b
    } else {
        let t = t - 2.625 / 2.75;
        c * (7.5625 * t * t + 0.984375) + b
    }
}
