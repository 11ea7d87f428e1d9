//! Angle normalization helpers shared by the paran solvers.
//!
//! Degrees are used at the API boundary (geographic points, precision
//! figures); radians everywhere inside the trigonometry.

use std::f64::consts::{PI, TAU};

/// Normalize an angle to [0, 360) degrees.
pub fn normalize_360(deg: f64) -> f64 {
    let r = deg % 360.0;
    if r < 0.0 { r + 360.0 } else { r }
}

/// Normalize an angle to (-180, +180] degrees.
pub fn normalize_pm180(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

/// Wrap an angle to (-pi, pi] radians.
pub fn wrap_pm_pi(rad: f64) -> f64 {
    let r = rad.rem_euclid(TAU);
    if r > PI { r - TAU } else { r }
}

/// Fold an angle onto [0, pi] radians.
///
/// Equivalent to `|wrap_pm_pi(rad)|`: the unsigned angular distance from zero.
pub fn wrap_zero_pi(rad: f64) -> f64 {
    wrap_pm_pi(rad).abs()
}

/// Mean of two directions in radians, taken along the shorter arc.
///
/// Returns a value in (-pi, pi].
pub fn circular_mean_rad(a: f64, b: f64) -> f64 {
    wrap_pm_pi(a + 0.5 * wrap_pm_pi(b - a))
}

/// Shortest angular distance between two longitudes in degrees, in [0, 180].
pub fn wrapped_separation_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    d.min(360.0 - d)
}

/// Clamp into [-1, 1] before feeding `acos`/`asin`.
#[inline]
pub fn clip_unit(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_360_wraps() {
        assert!((normalize_360(360.0) - 0.0).abs() < 1e-15);
        assert!((normalize_360(-10.0) - 350.0).abs() < 1e-12);
        assert!((normalize_360(730.0) - 10.0).abs() < 1e-10);
    }

    #[test]
    fn normalize_pm180_basic() {
        assert!((normalize_pm180(0.0) - 0.0).abs() < 1e-10);
        assert!((normalize_pm180(180.0) - 180.0).abs() < 1e-10);
        assert!((normalize_pm180(-180.0) - 180.0).abs() < 1e-10);
        assert!((normalize_pm180(270.0) - (-90.0)).abs() < 1e-10);
        assert!((normalize_pm180(-270.0) - 90.0).abs() < 1e-10);
        assert!((normalize_pm180(450.0) - 90.0).abs() < 1e-10);
    }

    #[test]
    fn wrap_pm_pi_half_open() {
        assert!((wrap_pm_pi(PI) - PI).abs() < 1e-15);
        assert!((wrap_pm_pi(-PI) - PI).abs() < 1e-12);
        assert!((wrap_pm_pi(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!(wrap_pm_pi(TAU).abs() < 1e-12);
    }

    #[test]
    fn wrap_zero_pi_folds_negative() {
        assert!((wrap_zero_pi(-PI / 3.0) - PI / 3.0).abs() < 1e-12);
        assert!((wrap_zero_pi(5.0 * PI / 3.0) - PI / 3.0).abs() < 1e-12);
    }

    #[test]
    fn circular_mean_across_seam() {
        // 179 deg and -179 deg average to 180, not 0.
        let m = circular_mean_rad(179.0_f64.to_radians(), (-179.0_f64).to_radians());
        assert!((m.abs() - PI).abs() < 1e-12, "mean = {m}");
    }

    #[test]
    fn separation_wraps() {
        assert!((wrapped_separation_deg(179.99, -179.99) - 0.02).abs() < 1e-9);
        assert!((wrapped_separation_deg(10.0, 40.0) - 30.0).abs() < 1e-12);
        assert!((wrapped_separation_deg(0.0, 180.0) - 180.0).abs() < 1e-12);
    }

    #[test]
    fn clip_unit_bounds() {
        assert_eq!(clip_unit(1.5), 1.0);
        assert_eq!(clip_unit(-2.0), -1.0);
        assert_eq!(clip_unit(0.25), 0.25);
    }
}
