//! Greenwich sidereal time for turning local sidereal time into longitude.
//!
//! Paran longitudes are first expressed as a local sidereal time
//! (`LST = alpha + H`). A geographic longitude follows once the Greenwich
//! sidereal time of the epoch is known: `lon = LST - GMST`.
//!
//! Inputs are UT1 Julian Dates. The ephemeris collaborator delivers a
//! Julian Day that is close enough to UT1 for line plotting (the UT1-UTC
//! difference is below one second, i.e. under 0.005 deg of longitude).
//!
//! Sources:
//! - ERA: IERS Conventions 2010, Eq. 5.15.
//! - GMST polynomial: Capitaine et al. 2003, Table 2.

use std::f64::consts::{PI, TAU};

/// Julian Date of the J2000.0 epoch (2000-Jan-01 12:00 TT).
pub const J2000_JD: f64 = 2_451_545.0;

/// Days per Julian century.
const DAYS_PER_CENTURY: f64 = 36_525.0;

const ARCSEC_TO_RAD: f64 = PI / (180.0 * 3600.0);

/// Earth Rotation Angle in radians, [0, 2pi).
pub fn earth_rotation_angle_rad(jd_ut1: f64) -> f64 {
    let du = jd_ut1 - J2000_JD;
    // Split the day count so the fractional turn keeps full precision.
    let frac_day = du.rem_euclid(1.0);
    let turns = 0.779_057_273_264_0 + frac_day + 0.002_737_811_911_354_48 * du;
    (TAU * turns).rem_euclid(TAU)
}

/// Greenwich Mean Sidereal Time in radians, [0, 2pi).
pub fn gmst_rad(jd_ut1: f64) -> f64 {
    let t = (jd_ut1 - J2000_JD) / DAYS_PER_CENTURY;
    // Horner form of the Capitaine polynomial, arcseconds.
    let poly = 0.014_506
        + t * (4_612.156_534
            + t * (1.391_581_7
                + t * (-0.000_000_44 + t * (-0.000_029_956 + t * -0.000_000_036_8))));
    (earth_rotation_angle_rad(jd_ut1) + poly * ARCSEC_TO_RAD).rem_euclid(TAU)
}

/// Greenwich Mean Sidereal Time in degrees, [0, 360).
pub fn gmst_deg(jd_ut1: f64) -> f64 {
    gmst_rad(jd_ut1).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_at_j2000_noon() {
        let theta_deg = earth_rotation_angle_rad(J2000_JD).to_degrees();
        assert!(
            (theta_deg - 280.46).abs() < 0.1,
            "ERA at J2000 = {theta_deg}, expected ~280.46"
        );
    }

    #[test]
    fn gmst_j2000_midnight() {
        // 2000-Jan-01 0h UT1: GMST = 6h 39m 51.17s ~ 99.963 deg
        let g = gmst_deg(2_451_544.5);
        assert!((g - 99.97).abs() < 0.1, "GMST = {g}, expected ~99.97");
    }

    #[test]
    fn gmst_advances_one_degree_per_day() {
        let g1 = gmst_deg(2_460_000.5);
        let g2 = gmst_deg(2_460_001.5);
        let step = (g2 - g1).rem_euclid(360.0);
        assert!((step - 0.9856).abs() < 0.01, "daily GMST step = {step}");
    }

    #[test]
    fn gmst_range() {
        for &jd in &[2_451_545.0, 2_440_000.5, 2_460_000.25, 2_470_000.75] {
            let g = gmst_rad(jd);
            assert!((0.0..TAU).contains(&g), "GMST out of range: {g}");
        }
    }
}
