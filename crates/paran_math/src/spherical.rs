//! Equatorial snapshots of bodies and geographic solution points.

use crate::angle::{normalize_pm180, wrap_pm_pi};

/// Equatorial position of one body at the calculation epoch.
///
/// All angles in radians. The snapshot is immutable once built and is the
/// only per-body data shared read-only across solver threads.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SphericalCoordinates {
    /// Right ascension, [0, 2pi).
    pub right_ascension: f64,
    /// Declination, [-pi/2, pi/2].
    pub declination: f64,
    /// Greenwich hour angle at the epoch, (-pi, pi].
    pub hour_angle: f64,
}

impl SphericalCoordinates {
    /// Build from right ascension and declination in radians.
    ///
    /// The Greenwich hour angle is derived from `greenwich_sidereal_rad`
    /// (`H = GST - alpha`). Pass `0.0` to use the sidereal-proxy convention.
    pub fn new(right_ascension: f64, declination: f64, greenwich_sidereal_rad: f64) -> Self {
        Self {
            right_ascension: right_ascension.rem_euclid(std::f64::consts::TAU),
            declination,
            hour_angle: wrap_pm_pi(greenwich_sidereal_rad - right_ascension),
        }
    }

    /// Build from right ascension and declination in degrees, with a zero
    /// Greenwich sidereal time.
    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Self {
        Self::new(ra_deg.to_radians(), dec_deg.to_radians(), 0.0)
    }

    /// Right ascension in degrees.
    pub fn ra_deg(&self) -> f64 {
        self.right_ascension.to_degrees()
    }

    /// Declination in degrees.
    pub fn dec_deg(&self) -> f64 {
        self.declination.to_degrees()
    }

    /// Whether both angles are finite and the declination is physical.
    pub fn is_finite(&self) -> bool {
        self.right_ascension.is_finite()
            && self.declination.is_finite()
            && self.declination.abs() <= std::f64::consts::FRAC_PI_2
    }
}

/// A point on Earth's surface, degrees.
///
/// Latitude is in [-90, 90]; longitude is normalized to (-180, 180] on
/// construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeographicPoint {
    /// Geodetic latitude, north positive.
    pub latitude_deg: f64,
    /// Longitude, east positive.
    pub longitude_deg: f64,
}

impl GeographicPoint {
    /// Create a point, normalizing the longitude.
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg: normalize_pm180(longitude_deg),
        }
    }

    /// Latitude in radians.
    pub fn latitude_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    /// Whether the point satisfies the latitude/longitude invariants.
    pub fn is_valid(&self) -> bool {
        self.latitude_deg.is_finite()
            && self.longitude_deg.is_finite()
            && (-90.0..=90.0).contains(&self.latitude_deg)
            && self.longitude_deg > -180.0
            && self.longitude_deg <= 180.0
    }
}
