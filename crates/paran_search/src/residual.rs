//! Simultaneity residual for two bodies at their angular events.
//!
//! With `H_X(phi)` the signed hour angle of body X at its event (0 for MC,
//! pi for IC, `-+acos(-tan(phi) tan(dec))` for rise/set) and
//! `d_alpha = wrap(alpha_A - alpha_B)`:
//!
//! - eastern: `F_E(phi) = wrap( H_A - H_B - d_alpha)`
//! - western: `F_W(phi) = wrap(-H_A + H_B - d_alpha)`
//!
//! The western form is `alpha_A + H_A = alpha_B + H_B` (hour angle counted
//! westward); the eastern form is the same condition with hour angle counted
//! eastward. Residuals are wrapped to (-pi, pi] so solutions differing by a
//! full turn are not lost; the resulting +/-pi seam is screened out of
//! bracketing by [`is_genuine_crossing`].
//!
//! Where a horizon body has no crossing at `phi`, [`SimultaneityEquation::evaluate`]
//! returns NaN so the latitude drops out of the search domain.
//! [`SimultaneityEquation::evaluate_clipped`] clips the horizon argument instead and
//! is always finite, for minimization and diagnostics.

use std::f64::consts::{FRAC_PI_2, PI};

use paran_math::{SphericalCoordinates, wrap_pm_pi};

use crate::paran_types::{AcgEventType, HorizonSide};

/// Declinations closer to zero than this make the horizon argument vanish.
const ZERO_DECLINATION_EPS: f64 = 1e-12;

/// Largest jump between bracket ends still treated as a real zero crossing.
/// A jump across the wrap seam is close to 2pi.
const MAX_GENUINE_JUMP: f64 = 1.5 * PI;

/// Whether a sign change between `f_a` and `f_b` is a real zero crossing
/// rather than a jump across the +/-pi wrap seam.
pub fn is_genuine_crossing(f_a: f64, f_b: f64) -> bool {
    f_a * f_b < 0.0 && (f_a - f_b).abs() < MAX_GENUINE_JUMP
}

/// The simultaneity condition for one event combination and one side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimultaneityEquation {
    pub event_a: AcgEventType,
    pub event_b: AcgEventType,
    pub dec_a: f64,
    pub dec_b: f64,
    /// `wrap(alpha_A - alpha_B)`, radians.
    pub delta_alpha: f64,
    pub side: HorizonSide,
}

impl SimultaneityEquation {
    pub fn new(
        event_a: AcgEventType,
        coords_a: &SphericalCoordinates,
        event_b: AcgEventType,
        coords_b: &SphericalCoordinates,
        side: HorizonSide,
    ) -> Self {
        Self {
            event_a,
            event_b,
            dec_a: coords_a.declination,
            dec_b: coords_b.declination,
            delta_alpha: wrap_pm_pi(coords_a.right_ascension - coords_b.right_ascension),
            side,
        }
    }

    /// Eastern and western equations for the same inputs.
    pub fn both_sides(
        event_a: AcgEventType,
        coords_a: &SphericalCoordinates,
        event_b: AcgEventType,
        coords_b: &SphericalCoordinates,
    ) -> [Self; 2] {
        HorizonSide::BOTH.map(|side| Self::new(event_a, coords_a, event_b, coords_b, side))
    }

    fn combine(&self, h_a: f64, h_b: f64) -> f64 {
        let diff = match self.side {
            HorizonSide::Eastern => h_a - h_b,
            HorizonSide::Western => h_b - h_a,
        };
        wrap_pm_pi(diff - self.delta_alpha)
    }

    /// Residual at `latitude` (radians); NaN where a horizon event does not occur.
    pub fn evaluate(&self, latitude: f64) -> f64 {
        match (
            self.event_a.hour_angle_at(self.dec_a, latitude),
            self.event_b.hour_angle_at(self.dec_b, latitude),
        ) {
            (Some(h_a), Some(h_b)) => self.combine(h_a, h_b),
            _ => f64::NAN,
        }
    }

    /// Residual with the horizon arguments clipped into [-1, 1].
    pub fn evaluate_clipped(&self, latitude: f64) -> f64 {
        let h_a = self.event_a.clipped_hour_angle_at(self.dec_a, latitude);
        let h_b = self.event_b.clipped_hour_angle_at(self.dec_b, latitude);
        self.combine(h_a, h_b)
    }

    /// Largest |latitude| (radians) at which both horizon events occur.
    ///
    /// A horizon body at declination `dec` crosses the horizon only for
    /// `|phi| <= pi/2 - |dec|`.
    pub fn domain_bound(&self) -> f64 {
        let bound = |event: AcgEventType, dec: f64| {
            if event.is_horizon() {
                FRAC_PI_2 - dec.abs()
            } else {
                FRAC_PI_2
            }
        };
        bound(self.event_a, self.dec_a).min(bound(self.event_b, self.dec_b))
    }

    /// Whether the residual is the same at every latitude, so no sign change
    /// can exist. True when every horizon body sits on the celestial equator.
    pub fn is_latitude_independent(&self) -> bool {
        let flat = |event: AcgEventType, dec: f64| {
            event.is_meridian() || dec.abs() < ZERO_DECLINATION_EPS
        };
        flat(self.event_a, self.dec_a) && flat(self.event_b, self.dec_b)
    }

    /// Local sidereal time (radians, (-pi, pi]) implied by the two bodies
    /// at `latitude`: the circular mean of `alpha_X + sign * H_X`.
    ///
    /// `None` where a horizon event does not occur.
    pub fn sidereal_time_at(
        &self,
        coords_a: &SphericalCoordinates,
        coords_b: &SphericalCoordinates,
        latitude: f64,
    ) -> Option<f64> {
        let sign = self.side.sidereal_sign();
        let h_a = self.event_a.hour_angle_at(self.dec_a, latitude)?;
        let h_b = self.event_b.hour_angle_at(self.dec_b, latitude)?;
        let lst_a = coords_a.right_ascension + sign * h_a;
        let lst_b = coords_b.right_ascension + sign * h_b;
        Some(paran_math::circular_mean_rad(lst_a, lst_b))
    }
}

/// Smallest absolute residual over both sides at `latitude`, with the side
/// that achieved it. `None` where an event does not occur.
pub fn best_side_residual(
    event_a: AcgEventType,
    coords_a: &SphericalCoordinates,
    event_b: AcgEventType,
    coords_b: &SphericalCoordinates,
    latitude: f64,
) -> Option<(HorizonSide, f64)> {
    SimultaneityEquation::both_sides(event_a, coords_a, event_b, coords_b)
        .iter()
        .filter_map(|eq| {
            let f = eq.evaluate(latitude);
            f.is_finite().then_some((eq.side, f.abs()))
        })
        .min_by(|x, y| x.1.total_cmp(&y.1))
}
