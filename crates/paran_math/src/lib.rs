//! Spherical-astronomy primitives for paran line computation.
//!
//! This crate provides:
//! - Angle normalization in degrees and radians
//! - Horizon hour angle, altitude, and hour-angle to longitude conversion
//! - Greenwich sidereal time for true geographic longitudes
//! - Equatorial snapshot and geographic point value types
//!
//! Everything here is stateless and allocation-free.

pub mod angle;
pub mod horizon;
pub mod sidereal;
pub mod spherical;

pub use angle::{
    circular_mean_rad, clip_unit, normalize_360, normalize_pm180, wrap_pm_pi, wrap_zero_pi,
    wrapped_separation_deg,
};
pub use horizon::{
    HORIZON_ARGUMENT_SLACK, POLE_EPSILON, altitude, clipped_horizon_hour_angle,
    geometric_horizon_hour_angle, has_horizon_crossing, horizon_argument, horizon_hour_angle,
    hour_angle_to_longitude,
};
pub use sidereal::{J2000_JD, earth_rotation_angle_rad, gmst_deg, gmst_rad};
pub use spherical::{GeographicPoint, SphericalCoordinates};
