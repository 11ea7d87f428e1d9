//! Batch orchestration: pairs x event combinations -> solved, filtered lines.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use paran_math::{SphericalCoordinates, gmst_rad};
use tracing::{debug, info, warn};

use crate::closed_form::{ClosedFormSolution, ClosedFormSolver};
use crate::config_types::{LongitudeReference, ParanConfiguration};
use crate::ephemeris::{EphemerisPosition, EphemerisProvider};
use crate::error::{FailureKind, ParanError};
use crate::numerical::NumericalHorizonHorizonSolver;
use crate::paran_types::{
    CalculationMethod, MethodCounts, ParanLine, ParanPairType, ParanPoint, ParanResult,
    PerformanceMetrics,
};
use crate::stats::{RootFinderStats, SharedRootFinderStats};
use crate::validator::ParanSolutionValidator;
use crate::visibility::AcgVisibilityFilter;

/// Soft latency target for one batch, milliseconds.
pub const BATCH_TARGET_MS: f64 = 800.0;

/// Solver result for one line before it is written back.
struct LineSolution {
    points: Vec<ParanPoint>,
    method: CalculationMethod,
    precision_deg: f64,
    iterations: Option<u32>,
    sampled_continuum: bool,
}

impl From<ClosedFormSolution> for LineSolution {
    fn from(s: ClosedFormSolution) -> Self {
        Self {
            points: s.points,
            method: CalculationMethod::ClosedForm,
            precision_deg: s.precision_deg,
            iterations: None,
            sampled_continuum: s.sampled_continuum,
        }
    }
}

/// Entry point for paran calculations.
///
/// Holds cumulative root-finder counters across calls; everything else is
/// per call. Safe to share between threads.
#[derive(Debug, Default)]
pub struct ParanCalculator {
    stats: SharedRootFinderStats,
    validator: ParanSolutionValidator,
}

impl ParanCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a validator with a custom residual tolerance.
    pub fn with_validator(validator: ParanSolutionValidator) -> Self {
        Self {
            stats: SharedRootFinderStats::new(),
            validator,
        }
    }

    /// Cumulative root-finder counters over every batch so far.
    pub fn solver_statistics(&self) -> RootFinderStats {
        self.stats.snapshot()
    }

    pub fn reset_statistics(&self) {
        self.stats.reset();
    }

    /// Fetch positions for every configured body from `provider`, then
    /// calculate.
    pub fn calculate_with_provider<P: EphemerisProvider + ?Sized>(
        &self,
        config: &ParanConfiguration,
        provider: &P,
        julian_day: f64,
    ) -> Result<ParanResult, ParanError> {
        config.validate().map_err(ParanError::InvalidConfig)?;
        let bodies: Vec<String> = config
            .planet_pairs
            .iter()
            .flat_map(|(a, b)| [a.clone(), b.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let positions = provider.positions(&bodies, julian_day)?;
        self.calculate(config, &positions)
    }

    /// Solve every configured pair and event combination.
    ///
    /// Per-line failures are recorded on the lines; only malformed
    /// configuration or positions return `Err`.
    pub fn calculate(
        &self,
        config: &ParanConfiguration,
        positions: &BTreeMap<String, EphemerisPosition>,
    ) -> Result<ParanResult, ParanError> {
        let started = Instant::now();
        config.validate().map_err(ParanError::InvalidConfig)?;

        let mut resolved = Vec::with_capacity(config.planet_pairs.len());
        for (a, b) in &config.planet_pairs {
            resolved.push((a, lookup(positions, a)?, b, lookup(positions, b)?));
        }

        let epoch_jd = resolved.first().map_or(f64::NAN, |(_, p, _, _)| p.julian_day);
        let gst = match config.longitude_reference {
            LongitudeReference::SiderealProxy => 0.0,
            LongitudeReference::Greenwich => gmst_rad(epoch_jd),
        };
        let offset_deg = gst.to_degrees();

        let closed = ClosedFormSolver::new(config).with_longitude_offset(offset_deg);
        let numerical =
            NumericalHorizonHorizonSolver::new(config)?.with_longitude_offset(offset_deg);
        let filter = AcgVisibilityFilter::new(config.visibility_mode, config.horizon_convention);
        let combinations = config.event_combinations.expand();

        let mut lines = Vec::new();
        let mut batch_stats = RootFinderStats::default();
        let mut validation_rejections = 0;

        for (name_a, pos_a, name_b, pos_b) in &resolved {
            let coords_a = pos_a.to_spherical(gst);
            let coords_b = pos_b.to_spherical(gst);

            for &(event_a, event_b) in &combinations {
                let pair_type = ParanPairType::classify(event_a, event_b);
                if pair_type == ParanPairType::MeridianMeridian && config.exclude_degenerate_cases {
                    continue;
                }

                let mut line = ParanLine::new(
                    name_a.as_str(),
                    event_a,
                    coords_a,
                    name_b.as_str(),
                    event_b,
                    coords_b,
                    epoch_jd,
                );

                let outcome = solve_line(
                    &closed,
                    &numerical,
                    pair_type,
                    &line,
                    &coords_a,
                    &coords_b,
                    &mut batch_stats,
                );

                match outcome {
                    Ok(solution) => {
                        line.mark_solved(
                            solution.points,
                            solution.method,
                            solution.precision_deg,
                            solution.iterations,
                        );
                        line.sampled_continuum = solution.sampled_continuum;
                        let survivors =
                            filter.filter(&line.points, event_a, &coords_a, event_b, &coords_b);
                        line.apply_filter(survivors);

                        let rejected = self.validator.count_rejections(&line);
                        if rejected > 0 {
                            warn!(
                                line = %line.label(),
                                rejected,
                                "validator could not confirm points"
                            );
                            validation_rejections += rejected;
                        }
                        debug!(
                            line = %line.label(),
                            status = ?line.status,
                            latitude = line.latitude_deg,
                            points = line.points.len(),
                            "solved"
                        );
                    }
                    Err((reason, domain_valid)) => {
                        line.mark_failed(reason, domain_valid);
                        debug!(line = %line.label(), %reason, "no solution");
                    }
                }
                lines.push(line);
            }
        }

        self.stats.record(&batch_stats);
        let result = aggregate(
            lines,
            config,
            &self.validator,
            batch_stats,
            validation_rejections,
            started,
        );
        info!(
            lines = result.lines.len(),
            valid = result.valid_lines().count(),
            closed_form = result.method_counts.closed_form,
            numerical = result.method_counts.numerical,
            failed = result.method_counts.failed,
            time_ms = result.performance.total_time_ms,
            "paran batch complete"
        );
        if !result.performance.meets_800ms_target {
            warn!(
                time_ms = result.performance.total_time_ms,
                "paran batch exceeded {BATCH_TARGET_MS} ms target"
            );
        }
        Ok(result)
    }
}

fn lookup<'a>(
    positions: &'a BTreeMap<String, EphemerisPosition>,
    name: &str,
) -> Result<&'a EphemerisPosition, ParanError> {
    let pos = positions
        .get(name)
        .ok_or_else(|| ParanError::MissingPosition(name.to_string()))?;
    pos.validate()
        .map_err(|reason| ParanError::InvalidPosition {
            body: name.to_string(),
            reason,
        })?;
    Ok(pos)
}

fn solve_line(
    closed: &ClosedFormSolver,
    numerical: &NumericalHorizonHorizonSolver,
    pair_type: ParanPairType,
    line: &ParanLine,
    coords_a: &SphericalCoordinates,
    coords_b: &SphericalCoordinates,
    stats: &mut RootFinderStats,
) -> Result<LineSolution, (FailureKind, bool)> {
    let (event_a, event_b) = (line.event_a, line.event_b);
    let closed_failure = |reason: FailureKind| {
        (reason, reason != FailureKind::CelestialPoleDegeneracy)
    };
    match pair_type {
        ParanPairType::MeridianHorizon => closed
            .solve_meridian_horizon(event_a, coords_a, event_b, coords_b)
            .map(LineSolution::from)
            .map_err(closed_failure),
        ParanPairType::HorizonMeridian => closed
            .solve_meridian_horizon(event_b, coords_b, event_a, coords_a)
            .map(LineSolution::from)
            .map_err(closed_failure),
        ParanPairType::MeridianMeridian => closed
            .solve_meridian_meridian(event_a, coords_a, event_b, coords_b)
            .map(LineSolution::from)
            .map_err(closed_failure),
        ParanPairType::HorizonHorizon => {
            let report = numerical.solve(event_a, coords_a, event_b, coords_b);
            stats.merge(&report.stats);
            report
                .result
                .map(|s| LineSolution {
                    points: s.points,
                    method: CalculationMethod::Numerical,
                    precision_deg: s.precision_deg,
                    iterations: Some(s.iterations),
                    sampled_continuum: false,
                })
                .map_err(|reason| (reason, report.domain_valid))
        }
    }
}

fn aggregate(
    lines: Vec<ParanLine>,
    config: &ParanConfiguration,
    validator: &ParanSolutionValidator,
    solver_statistics: RootFinderStats,
    validation_rejections: usize,
    started: Instant,
) -> ParanResult {
    let mut method_counts = MethodCounts::default();
    for line in &lines {
        match line.method {
            CalculationMethod::ClosedForm => method_counts.closed_form += 1,
            CalculationMethod::Numerical => method_counts.numerical += 1,
            CalculationMethod::Failed => method_counts.failed += 1,
        }
    }

    let valid: Vec<&ParanLine> = lines.iter().filter(|l| l.is_valid).collect();
    let success_rate = if lines.is_empty() {
        0.0
    } else {
        valid.len() as f64 / lines.len() as f64
    };
    let average_precision_deg = if valid.is_empty() {
        f64::NAN
    } else {
        valid.iter().map(|l| l.precision_achieved_deg).sum::<f64>() / valid.len() as f64
    };
    let quality = validator.quality_report(
        valid
            .iter()
            .flat_map(|l| l.points.iter().map(|p| &p.point)),
    );

    let total_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    ParanResult {
        method_counts,
        success_rate,
        average_precision_deg,
        performance: PerformanceMetrics {
            total_time_ms,
            meets_800ms_target: total_time_ms < BATCH_TARGET_MS,
            meets_precision_standard: average_precision_deg <= config.precision_target_deg,
        },
        solver_statistics,
        quality,
        validation_rejections,
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_types::VisibilityMode;
    use crate::paran_types::{AcgEventType, LineStatus};

    const JD: f64 = 2_460_000.5;

    fn positions() -> BTreeMap<String, EphemerisPosition> {
        [
            ("Sun", 10.0, 4.0),
            ("Moon", 130.0, 18.0),
            ("Mars", 250.0, -21.0),
        ]
        .into_iter()
        .map(|(n, ra, dec)| (n.to_string(), EphemerisPosition::new(ra, dec, 1.0, JD)))
        .collect()
    }

    #[test]
    fn standard_batch_emits_eight_lines_per_pair() {
        let config = ParanConfiguration::for_pairs([("Sun", "Moon"), ("Moon", "Mars")]);
        let result = ParanCalculator::new().calculate(&config, &positions()).unwrap();
        assert_eq!(result.lines.len(), 16);
        assert_eq!(result.lines[0].planet_a, "Sun");
        assert_eq!(result.lines[0].event_a, AcgEventType::Mc);
        assert_eq!(result.lines[8].planet_a, "Moon");
        let counted = result.method_counts.closed_form
            + result.method_counts.numerical
            + result.method_counts.failed;
        assert_eq!(counted, 16);
    }

    #[test]
    fn degenerate_combinations_skipped() {
        let mut config = ParanConfiguration::for_pairs([("Sun", "Moon")]);
        config.event_combinations = crate::config_types::EventCombinations::All;
        let calc = ParanCalculator::new();
        let result = calc.calculate(&config, &positions()).unwrap();
        assert_eq!(result.lines.len(), 12);

        config.exclude_degenerate_cases = false;
        let result = calc.calculate(&config, &positions()).unwrap();
        assert_eq!(result.lines.len(), 16);
        // RA 10 vs 130: never simultaneous on the meridian.
        let mm = result
            .lines
            .iter()
            .find(|l| l.pair_type() == ParanPairType::MeridianMeridian)
            .unwrap();
        assert_eq!(mm.failure_reason, Some(FailureKind::NotSimultaneous));
    }

    #[test]
    fn missing_body_is_hard_error() {
        let config = ParanConfiguration::for_pairs([("Sun", "Pluto")]);
        let err = ParanCalculator::new().calculate(&config, &positions()).unwrap_err();
        assert_eq!(err, ParanError::MissingPosition("Pluto".into()));
    }

    #[test]
    fn invalid_config_is_hard_error() {
        let err = ParanCalculator::new()
            .calculate(&ParanConfiguration::default(), &positions())
            .unwrap_err();
        assert!(matches!(err, ParanError::InvalidConfig(_)));
    }

    #[test]
    fn non_finite_position_rejected() {
        let mut pos = positions();
        pos.insert("Moon".into(), EphemerisPosition::new(f64::NAN, 0.0, 1.0, JD));
        let config = ParanConfiguration::for_pairs([("Sun", "Moon")]);
        let err = ParanCalculator::new().calculate(&config, &pos).unwrap_err();
        assert!(matches!(err, ParanError::InvalidPosition { .. }));
    }

    #[test]
    fn statistics_accumulate_and_reset() {
        let config = ParanConfiguration::for_pairs([("Sun", "Moon")]);
        let calc = ParanCalculator::new();
        let first = calc.calculate(&config, &positions()).unwrap();
        assert!(first.solver_statistics.total_calls > 0);
        calc.calculate(&config, &positions()).unwrap();
        assert_eq!(
            calc.solver_statistics().total_calls,
            2 * first.solver_statistics.total_calls
        );
        calc.reset_statistics();
        assert_eq!(calc.solver_statistics(), RootFinderStats::default());
    }

    #[test]
    fn filtered_lines_move_to_filtered_out() {
        let mut config = ParanConfiguration::for_pairs([("Sun", "Mars")]);
        config.visibility_mode = VisibilityMode::BothVisible;
        let result = ParanCalculator::new().calculate(&config, &positions()).unwrap();
        for line in &result.lines {
            match line.status {
                LineStatus::FilteredOut => {
                    assert_eq!(line.failure_reason, Some(FailureKind::FailedVisibilityFilter));
                    assert!(!line.is_valid);
                }
                LineStatus::Solved => assert!(line.is_valid),
                LineStatus::Failed => assert!(line.failure_reason.is_some()),
                LineStatus::Pending => panic!("line left pending"),
            }
        }
    }

    #[test]
    fn greenwich_reference_shifts_longitudes() {
        let config = ParanConfiguration::for_pairs([("Sun", "Moon")]);
        let mut greenwich = config.clone();
        greenwich.longitude_reference = LongitudeReference::Greenwich;
        let calc = ParanCalculator::new();
        let a = calc.calculate(&config, &positions()).unwrap();
        let b = calc.calculate(&greenwich, &positions()).unwrap();
        let shift = paran_math::gmst_deg(JD);
        let la = &a.lines[0];
        let lb = &b.lines[0];
        assert!(la.is_valid && lb.is_valid);
        assert!((la.latitude_deg - lb.latitude_deg).abs() < 1e-9);
        let expected = paran_math::normalize_pm180(la.points[0].point.longitude_deg - shift);
        let got = lb.points[0].point.longitude_deg;
        assert!(paran_math::wrapped_separation_deg(got, expected) < 1e-9);
    }

    #[test]
    fn provider_entry_point() {
        let eph = crate::ephemeris::StaticEphemeris::new()
            .with_body("Sun", 10.0, 4.0, 1.0)
            .with_body("Moon", 130.0, 18.0, 0.0026);
        let config = ParanConfiguration::for_pairs([("Sun", "Moon")]);
        let calc = ParanCalculator::new();
        let via_provider = calc.calculate_with_provider(&config, &eph, JD).unwrap();
        let direct = calc.calculate(&config, &positions()).unwrap();
        let key = |r: &ParanResult| -> Vec<(String, LineStatus, Vec<ParanPoint>)> {
            r.lines
                .iter()
                .map(|l| (l.label(), l.status, l.points.clone()))
                .collect()
        };
        assert_eq!(key(&via_provider), key(&direct));
    }
}
