//! Independent re-check of solved points and a diagnostic quality score.

use paran_math::{GeographicPoint, SphericalCoordinates};

use crate::paran_types::{AcgEventType, ParanLine, ParanPairType, QualityReport};
use crate::residual::best_side_residual;

/// Latitude of the polar circles; points beyond count as extreme.
pub const POLAR_CIRCLE_DEG: f64 = 66.56;

/// Recomputes the simultaneity residual at a point without reference to the
/// solver that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParanSolutionValidator {
    /// Accepted residual, degrees of hour angle.
    pub tolerance_deg: f64,
}

impl Default for ParanSolutionValidator {
    fn default() -> Self {
        Self {
            tolerance_deg: Self::DEFAULT_TOLERANCE_DEG,
        }
    }
}

impl ParanSolutionValidator {
    pub const DEFAULT_TOLERANCE_DEG: f64 = 0.01;

    pub fn new(tolerance_deg: f64) -> Self {
        Self { tolerance_deg }
    }

    /// Whether `point` satisfies simultaneity on either side.
    ///
    /// Analytic pair types are exact by construction and always pass.
    pub fn validate(
        &self,
        point: &GeographicPoint,
        event_a: AcgEventType,
        coords_a: &SphericalCoordinates,
        event_b: AcgEventType,
        coords_b: &SphericalCoordinates,
        pair_type: ParanPairType,
    ) -> bool {
        if pair_type.is_closed_form() {
            return true;
        }
        best_side_residual(event_a, coords_a, event_b, coords_b, point.latitude_rad())
            .is_some_and(|(_, r)| r < self.tolerance_deg.to_radians())
    }

    /// Number of points on `line` that fail [`Self::validate`].
    pub fn count_rejections(&self, line: &ParanLine) -> usize {
        let pair_type = line.pair_type();
        line.points
            .iter()
            .filter(|p| {
                !self.validate(
                    &p.point,
                    line.event_a,
                    &line.coords_a,
                    line.event_b,
                    &line.coords_b,
                    pair_type,
                )
            })
            .count()
    }

    /// Spread and extreme-latitude share of a solution set. Never gates
    /// anything; an empty set scores 0.
    pub fn quality_report<'a>(
        &self,
        points: impl IntoIterator<Item = &'a GeographicPoint>,
    ) -> QualityReport {
        let mut count = 0usize;
        let mut extreme = 0usize;
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        for p in points {
            count += 1;
            min_lat = min_lat.min(p.latitude_deg);
            max_lat = max_lat.max(p.latitude_deg);
            if p.latitude_deg.abs() > POLAR_CIRCLE_DEG {
                extreme += 1;
            }
        }
        if count == 0 {
            return QualityReport {
                solution_count: 0,
                latitude_spread_deg: 0.0,
                extreme_latitude_fraction: 0.0,
                score: 0.0,
            };
        }
        let fraction = extreme as f64 / count as f64;
        QualityReport {
            solution_count: count,
            latitude_spread_deg: max_lat - min_lat,
            extreme_latitude_fraction: fraction,
            score: 1.0 - fraction,
        }
    }
}
