//! Visibility policy applied to solved points.

use paran_math::{SphericalCoordinates, altitude, has_horizon_crossing};

use crate::config_types::{HorizonConvention, VisibilityMode};
use crate::paran_types::{AcgEventType, ParanPoint};

/// Altitude slack absorbing round-off at the horizon limit, degrees.
const ALTITUDE_SLACK_DEG: f64 = 1e-9;

/// Pure filter over solution points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcgVisibilityFilter {
    pub mode: VisibilityMode,
    pub convention: HorizonConvention,
}

impl AcgVisibilityFilter {
    pub fn new(mode: VisibilityMode, convention: HorizonConvention) -> Self {
        Self { mode, convention }
    }

    /// Keep the points that pass the policy; failing points are dropped.
    pub fn filter(
        &self,
        points: &[ParanPoint],
        event_a: AcgEventType,
        coords_a: &SphericalCoordinates,
        event_b: AcgEventType,
        coords_b: &SphericalCoordinates,
    ) -> Vec<ParanPoint> {
        if self.mode == VisibilityMode::All {
            return points.to_vec();
        }
        points
            .iter()
            .filter(|p| {
                let lat = p.point.latitude_rad();
                self.body_passes(event_a, coords_a, lat) && self.body_passes(event_b, coords_b, lat)
            })
            .copied()
            .collect()
    }

    fn body_passes(
        &self,
        event: AcgEventType,
        coords: &SphericalCoordinates,
        latitude: f64,
    ) -> bool {
        match (self.mode, event.meridian_hour_angle()) {
            (VisibilityMode::All, _) => true,
            (_, Some(h)) => self.is_visible(coords.declination, latitude, h),
            // A horizon body sits on the horizon at its own event; it only
            // has to actually cross it here.
            (VisibilityMode::BothVisible, None) => {
                has_horizon_crossing(coords.declination, latitude)
            }
            (VisibilityMode::MeridianVisibleOnly, None) => true,
        }
    }

    /// Whether a body at `hour_angle` clears the horizon limit.
    pub fn is_visible(&self, declination: f64, latitude: f64, hour_angle: f64) -> bool {
        let alt_deg = altitude(declination, latitude, hour_angle).to_degrees();
        alt_deg >= self.convention.horizon_limit_deg() - ALTITUDE_SLACK_DEG
    }
}
