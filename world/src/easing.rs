//! Easing curves used to animate grid steps.

use std::{
    f32::consts::PI,
    time::Duration,
};

/// Shape of an interpolation curve.
///
/// Curves follow the conventions catalogued on easings.net.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Cosine ease in and out.
    Slerp,
    /// Sharp start, overshoot, settle.
    EaseOutElastic,
    /// Smooth ends with a sharp middle.
    EaseInOutQuint,
    /// Fairly sharp start, smooth finish.
    EaseOutCubic,
    /// Smooth start, bouncing finish.
    EaseOutBounce,
}

impl Easing {
    /// Maps linear progress in `0.0..=1.0` onto the curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::Slerp => (1.0 - (t * PI).cos()) / 2.0,
            Self::EaseOutElastic => {
                let c4 = (2.0 * PI) / 3.0;
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Self::EaseInOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseOutBounce => ease_out_bounce(t),
        }
    }
}

fn ease_out_bounce(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984_375
    }
}

/// Interpolates from `a` to `b` after `elapsed` of `duration`, rounded to whole pixels.
///
/// A zero duration jumps straight to `b`.
#[must_use]
pub fn interp(a: f32, b: f32, elapsed: Duration, duration: Duration, easing: Easing) -> f32 {
    if duration.is_zero() {
        return b;
    }

    let t = (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0);
    let d = easing.apply(t);
    (a * (1.0 - d) + b * d).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 6] = [
        Easing::Linear,
        Easing::Slerp,
        Easing::EaseOutElastic,
        Easing::EaseInOutQuint,
        Easing::EaseOutCubic,
        Easing::EaseOutBounce,
    ];

    #[test]
    fn curves_start_at_zero_and_end_at_one() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-4, "{easing:?} start");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-4, "{easing:?} end");
        }
    }

    #[test]
    fn interp_reaches_target_exactly() {
        let duration = Duration::from_millis(250);
        for easing in ALL {
            let value = interp(16.0, 48.0, duration, duration, easing);
            assert!((value - 48.0).abs() < f32::EPSILON, "{easing:?}");
        }
    }

    #[test]
    fn interp_clamps_overshooting_time() {
        let value = interp(
            0.0,
            10.0,
            Duration::from_secs(5),
            Duration::from_secs(1),
            Easing::Linear,
        );
        assert!((value - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn linear_midpoint_is_halfway() {
        let value = interp(
            0.0,
            32.0,
            Duration::from_millis(500),
            Duration::from_secs(1),
            Easing::Linear,
        );
        assert!((value - 16.0).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_duration_snaps_to_target() {
        let value = interp(0.0, 32.0, Duration::ZERO, Duration::ZERO, Easing::EaseOutCubic);
        assert!((value - 32.0).abs() < f32::EPSILON);
    }
}
