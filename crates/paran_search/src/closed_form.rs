//! Analytic solutions for pairs with at least one meridian event.
//!
//! Meridian-horizon: the meridian body fixes local sidereal time, so the
//! horizon body must sit at hour angle `H0 = |wrap(d_alpha + H_M)|` with
//! `d_alpha = alpha_M - alpha_X`. From `cos(H0) = -tan(phi) tan(dec)`:
//!
//! `phi = atan2(-cos(H0) cos(dec) sgn(sin dec), |sin dec|)`
//!
//! which is the principal `atan(-cos(H0) / tan(dec))`.
//!
//! Meridian-meridian: both hour angles are fixed, so the condition does not
//! involve latitude at all. When the right ascensions agree, every latitude
//! is a solution and a representative sample is returned.

use paran_math::{
    GeographicPoint, POLE_EPSILON, SphericalCoordinates, circular_mean_rad, hour_angle_to_longitude,
    normalize_pm180, wrap_pm_pi, wrap_zero_pi,
};

use crate::config_types::{MAX_ABS_LATITUDE_DEG, ParanConfiguration};
use crate::error::FailureKind;
use crate::paran_types::{AcgEventType, HorizonSide, ParanPoint};

/// Reported latitude uncertainty of an analytic solution, degrees.
pub const CLOSED_FORM_PRECISION_DEG: f64 = 1e-3;

/// Output of a successful closed-form solve.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedFormSolution {
    pub points: Vec<ParanPoint>,
    pub precision_deg: f64,
    /// Points sample a line valid at every latitude.
    pub sampled_continuum: bool,
}

/// Closed-form solver bound to a latitude window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedFormSolver {
    /// Inclusive latitude window, degrees.
    latitude_range_deg: (f64, f64),
    meridian_tolerance_deg: f64,
    sample_step_deg: f64,
    /// Subtracted from sidereal longitudes (Greenwich sidereal time, degrees).
    longitude_offset_deg: f64,
}

impl ClosedFormSolver {
    pub fn new(config: &ParanConfiguration) -> Self {
        let (lo, hi) = config.latitude_range;
        Self {
            latitude_range_deg: (lo.max(-MAX_ABS_LATITUDE_DEG), hi.min(MAX_ABS_LATITUDE_DEG)),
            meridian_tolerance_deg: config.meridian_tolerance_deg,
            sample_step_deg: config.degenerate_sample_step_deg,
            longitude_offset_deg: 0.0,
        }
    }

    /// Report longitudes relative to a sidereal offset instead of LST.
    pub fn with_longitude_offset(mut self, offset_deg: f64) -> Self {
        self.longitude_offset_deg = offset_deg;
        self
    }

    fn admits(&self, latitude_deg: f64) -> bool {
        let (lo, hi) = self.latitude_range_deg;
        latitude_deg.is_finite() && latitude_deg >= lo && latitude_deg <= hi
    }

    /// Solve a meridian-horizon pair. Argument order is by role, not by
    /// position in the line; the result is the same for either ordering.
    pub fn solve_meridian_horizon(
        &self,
        meridian_event: AcgEventType,
        meridian: &SphericalCoordinates,
        horizon_event: AcgEventType,
        horizon: &SphericalCoordinates,
    ) -> Result<ClosedFormSolution, FailureKind> {
        let (Some(h_m), true) = (meridian_event.meridian_hour_angle(), horizon_event.is_horizon())
        else {
            return Err(FailureKind::CelestialPoleDegeneracy);
        };

        let dec = horizon.declination;
        let (sin_d, cos_d) = dec.sin_cos();
        if sin_d.abs() < POLE_EPSILON || cos_d.abs() < POLE_EPSILON {
            return Err(FailureKind::CelestialPoleDegeneracy);
        }

        let delta_alpha = wrap_pm_pi(meridian.right_ascension - horizon.right_ascension);
        let required = wrap_pm_pi(delta_alpha + h_m);
        let h0 = wrap_zero_pi(delta_alpha + h_m);
        let phi = (-h0.cos() * cos_d * sin_d.signum()).atan2(sin_d.abs());
        let phi_deg = phi.to_degrees();

        if !phi_deg.is_finite() || phi_deg.abs() > MAX_ABS_LATITUDE_DEG || !self.admits(phi_deg) {
            return Err(FailureKind::OutOfConfiguredRange);
        }

        // Western simultaneity holds when the horizon body's own hour angle
        // (negative rising, positive setting) equals `required`; otherwise
        // the mirrored eastern condition does.
        let horizon_h = horizon_event.horizon_sign() * h0;
        let side = if wrap_pm_pi(horizon_h - required).abs() < 1e-9 {
            HorizonSide::Western
        } else {
            HorizonSide::Eastern
        };

        let longitude = normalize_pm180(
            hour_angle_to_longitude(h_m, meridian.right_ascension) - self.longitude_offset_deg,
        );
        Ok(ClosedFormSolution {
            points: vec![ParanPoint {
                point: GeographicPoint::new(phi_deg, longitude),
                side,
                residual_rad: 0.0,
            }],
            precision_deg: CLOSED_FORM_PRECISION_DEG,
            sampled_continuum: false,
        })
    }

    /// Solve a meridian-meridian pair.
    ///
    /// The returned points are a latitude sample (every `sample_step_deg`
    /// plus both window ends), not an exhaustive line.
    pub fn solve_meridian_meridian(
        &self,
        event_a: AcgEventType,
        coords_a: &SphericalCoordinates,
        event_b: AcgEventType,
        coords_b: &SphericalCoordinates,
    ) -> Result<ClosedFormSolution, FailureKind> {
        let (Some(h_a), Some(h_b)) = (event_a.meridian_hour_angle(), event_b.meridian_hour_angle())
        else {
            return Err(FailureKind::NotSimultaneous);
        };

        let lst_a = coords_a.right_ascension + h_a;
        let lst_b = coords_b.right_ascension + h_b;
        let mismatch = wrap_pm_pi(lst_a - lst_b).abs();
        let mismatch_deg = mismatch.to_degrees();
        if mismatch_deg > self.meridian_tolerance_deg {
            return Err(FailureKind::NotSimultaneous);
        }

        let mean_lst_deg = circular_mean_rad(lst_a, lst_b).to_degrees();
        let longitude = normalize_pm180(mean_lst_deg - self.longitude_offset_deg);
        let points = self
            .sample_latitudes()
            .into_iter()
            .map(|lat| ParanPoint {
                point: GeographicPoint::new(lat, longitude),
                side: HorizonSide::Western,
                residual_rad: mismatch,
            })
            .collect();

        Ok(ClosedFormSolution {
            points,
            precision_deg: mismatch_deg.max(CLOSED_FORM_PRECISION_DEG),
            sampled_continuum: true,
        })
    }

    /// Window ends plus every multiple of the sample step strictly inside.
    fn sample_latitudes(&self) -> Vec<f64> {
        let (lo, hi) = self.latitude_range_deg;
        let step = self.sample_step_deg;
        let mut lats = vec![lo];
        let mut k = (lo / step).floor() + 1.0;
        while k * step < hi {
            let lat = k * step;
            if lat > lo {
                lats.push(lat);
            }
            k += 1.0;
        }
        lats.push(hi);
        lats
    }
}
