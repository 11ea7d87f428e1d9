//! Body positions consumed from an ephemeris collaborator.
//!
//! The solver performs no ephemeris computation. Callers either pass a
//! ready map of positions or implement [`EphemerisProvider`].

use std::collections::BTreeMap;

use paran_math::SphericalCoordinates;

use crate::error::ParanError;

/// Geocentric apparent equatorial position of one body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EphemerisPosition {
    /// Right ascension, degrees.
    pub right_ascension_deg: f64,
    /// Declination, degrees.
    pub declination_deg: f64,
    /// Geocentric distance, AU. Carried through, not used by the solver.
    pub distance: f64,
    /// Epoch of the position, Julian Day (UT1).
    pub julian_day: f64,
}

impl EphemerisPosition {
    pub fn new(
        right_ascension_deg: f64,
        declination_deg: f64,
        distance: f64,
        julian_day: f64,
    ) -> Self {
        Self {
            right_ascension_deg,
            declination_deg,
            distance,
            julian_day,
        }
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.right_ascension_deg.is_finite() {
            return Err("right ascension must be finite");
        }
        if !self.declination_deg.is_finite() || self.declination_deg.abs() > 90.0 {
            return Err("declination must be finite and within [-90, 90]");
        }
        if !self.distance.is_finite() || self.distance < 0.0 {
            return Err("distance must be finite and non-negative");
        }
        if !self.julian_day.is_finite() {
            return Err("julian day must be finite");
        }
        Ok(())
    }

    /// Radian snapshot, with hour angle relative to `greenwich_sidereal_rad`.
    pub fn to_spherical(&self, greenwich_sidereal_rad: f64) -> SphericalCoordinates {
        SphericalCoordinates::new(
            self.right_ascension_deg.to_radians(),
            self.declination_deg.to_radians(),
            greenwich_sidereal_rad,
        )
    }
}

/// Source of body positions at an epoch.
pub trait EphemerisProvider {
    /// Positions for `bodies` at `julian_day`, keyed by body name.
    fn positions(
        &self,
        bodies: &[String],
        julian_day: f64,
    ) -> Result<BTreeMap<String, EphemerisPosition>, ParanError>;
}

/// A fixed table of positions, for precomputed inputs and tests.
///
/// Positions are returned as stored; the requested epoch is stamped onto
/// each one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticEphemeris {
    table: BTreeMap<String, (f64, f64, f64)>,
}

impl StaticEphemeris {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a body (degrees, distance in AU).
    pub fn with_body(
        mut self,
        name: impl Into<String>,
        right_ascension_deg: f64,
        declination_deg: f64,
        distance: f64,
    ) -> Self {
        self.table
            .insert(name.into(), (right_ascension_deg, declination_deg, distance));
        self
    }
}

impl EphemerisProvider for StaticEphemeris {
    fn positions(
        &self,
        bodies: &[String],
        julian_day: f64,
    ) -> Result<BTreeMap<String, EphemerisPosition>, ParanError> {
        bodies
            .iter()
            .map(|name| {
                let &(ra, dec, dist) = self
                    .table
                    .get(name)
                    .ok_or_else(|| ParanError::Provider(format!("unknown body '{name}'")))?;
                Ok((name.clone(), EphemerisPosition::new(ra, dec, dist, julian_day)))
            })
            .collect()
    }
}
