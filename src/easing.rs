// src/easing.rs

//! The parametric easing curves shared by every orb animation.
//!
//! Two curve families cover all transitions: a symmetric cubic ease-in-out
//! used for rotations, and a half-cosine pair used for the delayed scale
//! pulses and the alert gesture. Pulses that rise then fall split their
//! progress at 0.5 and ease each half independently.

use std::f64::consts::FRAC_PI_2;

/// Symmetric cubic ease-in-out over `p` in `[0, 1]`.
///
/// `4p^3` for the first half, `1 - (-2p + 2)^3 / 2` for the second; the two
/// halves meet at `(0.5, 0.5)` and the curve satisfies
/// `ease(p) + ease(1 - p) == 1`.
pub fn ease_in_out_cubic(p: f64) -> f64 {
    if p < 0.5 {
        4.0 * p * p * p
    } else {
        1.0 - (-2.0 * p + 2.0).powi(3) / 2.0
    }
}

/// Half-cosine rise: 0 at `p = 0`, 1 at `p = 1`, slow start.
pub fn sine_rise(p: f64) -> f64 {
    1.0 - (p * FRAC_PI_2).cos()
}

/// Half-cosine fall: 1 at `p = 0`, 0 at `p = 1`, slow finish.
pub fn sine_fall(p: f64) -> f64 {
    (p * FRAC_PI_2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn cubic_is_symmetric_about_the_midpoint() {
        let mut p = 0.0;
        while p <= 1.0 {
            let sum = ease_in_out_cubic(p) + ease_in_out_cubic(1.0 - p);
            assert!(
                (sum - 1.0).abs() < EPS,
                "ease({p}) + ease({}) = {sum}",
                1.0 - p
            );
            p += 0.01;
        }
    }

    #[test]
    fn cubic_endpoints_and_midpoint() {
        assert!(ease_in_out_cubic(0.0).abs() < EPS);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < EPS);
        assert!((ease_in_out_cubic(1.0) - 1.0).abs() < EPS);
    }

    #[test]
    fn sine_pair_endpoints() {
        assert!(sine_rise(0.0).abs() < EPS);
        assert!((sine_rise(1.0) - 1.0).abs() < EPS);
        assert!((sine_fall(0.0) - 1.0).abs() < EPS);
        assert!(sine_fall(1.0).abs() < EPS);
    }

    #[test]
    fn sine_rise_is_monotonic() {
        let mut prev = sine_rise(0.0);
        let mut p = 0.05;
        while p <= 1.0 {
            let v = sine_rise(p);
            assert!(v > prev);
            prev = v;
            p += 0.05;
        }
    }
}
