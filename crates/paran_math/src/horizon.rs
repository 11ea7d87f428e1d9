//! Horizon and meridian primitives from the standard spherical triangle.
//!
//! For a body at declination `dec` seen from latitude `phi`, the hour angle
//! at which it reaches altitude `h` satisfies
//!
//! `cos(H) = (sin(h) - sin(phi) sin(dec)) / (cos(phi) cos(dec))`
//!
//! and the altitude at a given hour angle is
//!
//! `sin(h) = sin(phi) sin(dec) + cos(phi) cos(dec) cos(H)`.
//!
//! For `h = 0` the first form reduces to `cos(H) = -tan(phi) tan(dec)`.

use crate::angle::{clip_unit, normalize_pm180};

/// Below this `|cos(phi) cos(dec)|` the hour-angle formula is treated as
/// singular (observer or body at a pole).
pub const POLE_EPSILON: f64 = 1e-12;

/// Round-off allowed on `|cos(H)|` before a crossing counts as absent.
///
/// A body exactly grazing the horizon (`|cos(H)| = 1` in exact arithmetic)
/// often evaluates a few ulps past 1; such points are clipped to `H = 0` or
/// `H = pi` instead of being reported as non-crossing.
pub const HORIZON_ARGUMENT_SLACK: f64 = 1e-10;

/// Hour angle in [0, pi] at which a body reaches `altitude`.
///
/// Returns `None` at a pole singularity or when the body never reaches the
/// altitude from this latitude (circumpolar or never-rising).
pub fn horizon_hour_angle(declination: f64, latitude: f64, altitude: f64) -> Option<f64> {
    let denom = latitude.cos() * declination.cos();
    if denom.abs() < POLE_EPSILON {
        return None;
    }
    let cos_h = (altitude.sin() - latitude.sin() * declination.sin()) / denom;
    if !cos_h.is_finite() || cos_h.abs() > 1.0 + HORIZON_ARGUMENT_SLACK {
        return None;
    }
    Some(clip_unit(cos_h).acos())
}

/// [`horizon_hour_angle`] for the geometric horizon (altitude 0).
pub fn geometric_horizon_hour_angle(declination: f64, latitude: f64) -> Option<f64> {
    horizon_hour_angle(declination, latitude, 0.0)
}

/// The raw horizon argument `-tan(phi) tan(dec)`, before any clipping.
///
/// Magnitudes above 1 (beyond [`HORIZON_ARGUMENT_SLACK`]) mean the body has
/// no horizon crossing at `latitude`.
pub fn horizon_argument(declination: f64, latitude: f64) -> f64 {
    -latitude.tan() * declination.tan()
}

/// Whether the body crosses the geometric horizon at `latitude`.
pub fn has_horizon_crossing(declination: f64, latitude: f64) -> bool {
    let arg = horizon_argument(declination, latitude);
    arg.is_finite() && arg.abs() <= 1.0 + HORIZON_ARGUMENT_SLACK
}

/// Horizon hour angle with the argument clipped into [-1, 1].
///
/// Always finite for finite inputs away from the poles. Outside the crossing
/// domain this saturates at 0 (never sets) or pi (never rises), which keeps
/// residuals continuous for minimization.
pub fn clipped_horizon_hour_angle(declination: f64, latitude: f64) -> f64 {
    clip_unit(horizon_argument(declination, latitude)).acos()
}

/// Longitude (degrees, (-180, 180]) whose local sidereal time puts a body
/// of right ascension `right_ascension` at `hour_angle`.
///
/// Uses `LST = alpha + H` with Greenwich sidereal time taken as zero.
pub fn hour_angle_to_longitude(hour_angle: f64, right_ascension: f64) -> f64 {
    normalize_pm180((right_ascension + hour_angle).to_degrees())
}

/// Altitude in radians of a body at `hour_angle` seen from `latitude`.
pub fn altitude(declination: f64, latitude: f64, hour_angle: f64) -> f64 {
    let sin_h = latitude.sin() * declination.sin()
        + latitude.cos() * declination.cos() * hour_angle.cos();
    clip_unit(sin_h).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn equator_equinox_six_hours() {
        let h = geometric_horizon_hour_angle(0.0, 0.0).unwrap();
        assert!((h - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn circumpolar_returns_none() {
        // |tan(45) tan(70)| = 2.75 > 1
        let dec = 70.0_f64.to_radians();
        let lat = 45.0_f64.to_radians();
        assert!(geometric_horizon_hour_angle(dec, lat).is_none());
        assert!(!has_horizon_crossing(dec, lat));
    }

    #[test]
    fn grazing_latitude_still_crosses() {
        // phi = -(90 - dec) makes -tan(phi) tan(dec) exactly 1; the computed
        // value may land a few ulps above.
        for dec_deg in [0.5_f64, 2.0, 15.0, 23.44, 47.0, 70.0] {
            let dec = dec_deg.to_radians();
            let (sin_d, cos_d) = dec.sin_cos();
            let lat = (-cos_d).atan2(sin_d);
            assert!(has_horizon_crossing(dec, lat), "dec {dec_deg}");
            let h = geometric_horizon_hour_angle(dec, lat).unwrap();
            assert!(h.abs() < 1e-6, "dec {dec_deg}: H = {h}");
            let h = geometric_horizon_hour_angle(-dec, -lat).unwrap();
            assert!(h.abs() < 1e-6);
            let h = geometric_horizon_hour_angle(dec, -lat).unwrap();
            assert!((h - PI).abs() < 1e-6);
        }
    }

    #[test]
    fn just_past_grazing_is_absent() {
        let dec = 20.0_f64.to_radians();
        let lat = -(70.0_f64 + 1e-6).to_radians();
        assert!(!has_horizon_crossing(dec, lat));
        assert!(geometric_horizon_hour_angle(dec, lat).is_none());
    }

    #[test]
    fn pole_observer_returns_none() {
        assert!(geometric_horizon_hour_angle(0.2, FRAC_PI_2).is_none());
    }

    #[test]
    fn matches_tan_form_at_zero_altitude() {
        let dec = 23.44_f64.to_radians();
        let lat = 40.0_f64.to_radians();
        let h = geometric_horizon_hour_angle(dec, lat).unwrap();
        let expected = (-lat.tan() * dec.tan()).acos();
        assert!((h - expected).abs() < 1e-12);
        assert!((clipped_horizon_hour_angle(dec, lat) - expected).abs() < 1e-12);
    }

    #[test]
    fn apparent_horizon_widens_arc() {
        let dec = 10.0_f64.to_radians();
        let lat = 50.0_f64.to_radians();
        let geo = geometric_horizon_hour_angle(dec, lat).unwrap();
        let app = horizon_hour_angle(dec, lat, (-0.5667_f64).to_radians()).unwrap();
        assert!(app > geo);
    }

    #[test]
    fn clipped_saturates() {
        let dec = 80.0_f64.to_radians();
        let lat = 60.0_f64.to_radians();
        // Never sets: argument << -1, clipped to -1 -> acos = pi
        assert!((clipped_horizon_hour_angle(dec, lat) - PI).abs() < 1e-12);
        assert!(clipped_horizon_hour_angle(-dec, lat).abs() < 1e-12);
    }

    #[test]
    fn longitude_from_hour_angle() {
        let lon = hour_angle_to_longitude(0.0, 90.0_f64.to_radians());
        assert!((lon - 90.0).abs() < 1e-12);
        let lon = hour_angle_to_longitude(PI, 90.0_f64.to_radians());
        assert!((lon - (-90.0)).abs() < 1e-12);
    }

    #[test]
    fn altitude_at_culmination() {
        // Upper culmination: h = 90 - |phi - dec|
        let dec = 20.0_f64.to_radians();
        let lat = 50.0_f64.to_radians();
        let h = altitude(dec, lat, 0.0).to_degrees();
        assert!((h - 60.0).abs() < 1e-10);
    }

    #[test]
    fn altitude_zero_at_horizon_hour_angle() {
        let dec = (-15.0_f64).to_radians();
        let lat = 35.0_f64.to_radians();
        let h0 = geometric_horizon_hour_angle(dec, lat).unwrap();
        assert!(altitude(dec, lat, h0).abs() < 1e-12);
        assert!(altitude(dec, lat, -h0).abs() < 1e-12);
    }
}
