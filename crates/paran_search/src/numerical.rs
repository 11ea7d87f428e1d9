//! Multi-seed numerical solver for horizon-horizon pairs.
//!
//! Neither body has a fixed hour angle, so the simultaneity equation is
//! transcendental in latitude and not guaranteed monotonic. Each horizon
//! side is searched from several equally spaced seeds; all (side, seed)
//! tasks run on a bounded rayon pool and the merged candidates are sorted
//! before deduplication, so output does not depend on task completion order.

use paran_math::{GeographicPoint, SphericalCoordinates, normalize_pm180, wrapped_separation_deg};
use rayon::prelude::*;
use tracing::debug;

use crate::config_types::{LongitudeConstraint, ParanConfiguration, SolverConfig};
use crate::error::{FailureKind, ParanError};
use crate::paran_types::{AcgEventType, HorizonSide, ParanPoint};
use crate::residual::SimultaneityEquation;
use crate::root_finder::{BrentRootFinder, RootOutcome, RootSearch};
use crate::stats::RootFinderStats;

/// Points closer than this in both latitude and wrapped longitude merge.
pub const DEDUP_TOLERANCE_DEG: f64 = 0.03;

/// Successful numerical solve.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericalSolution {
    /// Deduplicated points sorted by (latitude, longitude).
    pub points: Vec<ParanPoint>,
    /// Widest final root interval among the points, degrees.
    pub precision_deg: f64,
    /// Largest Brent iteration count among the accepted roots.
    pub iterations: u32,
    pub used_fallback: bool,
}

/// Outcome of one horizon-horizon solve, with the root-finder counters it
/// consumed whether or not it succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericalReport {
    pub result: Result<NumericalSolution, FailureKind>,
    /// False when the bodies never share a horizon crossing in range.
    pub domain_valid: bool,
    pub stats: RootFinderStats,
}

#[derive(Debug, Clone, Copy)]
struct SeedTask {
    side: HorizonSide,
    seed: f64,
}

/// Horizon-horizon solver with its own worker pool.
pub struct NumericalHorizonHorizonSolver {
    finder: BrentRootFinder,
    pool: rayon::ThreadPool,
    latitude_range_rad: (f64, f64),
    longitude_constraint: Option<LongitudeConstraint>,
    /// Subtracted from sidereal longitudes (Greenwich sidereal time, degrees).
    longitude_offset_deg: f64,
}

impl std::fmt::Debug for NumericalHorizonHorizonSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumericalHorizonHorizonSolver")
            .field("finder", &self.finder)
            .field("workers", &self.pool.current_num_threads())
            .field("latitude_range_rad", &self.latitude_range_rad)
            .field("longitude_constraint", &self.longitude_constraint)
            .field("longitude_offset_deg", &self.longitude_offset_deg)
            .finish()
    }
}

impl NumericalHorizonHorizonSolver {
    /// Build a solver for `config`, sizing the pool by its precision tier.
    pub fn new(config: &ParanConfiguration) -> Result<Self, ParanError> {
        Self::with_solver_config(
            config.solver_config(),
            config.effective_latitude_range_rad(),
            config.longitude_constraint,
        )
    }

    pub fn with_solver_config(
        solver: SolverConfig,
        latitude_range_rad: (f64, f64),
        longitude_constraint: Option<LongitudeConstraint>,
    ) -> Result<Self, ParanError> {
        solver.validate().map_err(ParanError::InvalidConfig)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(solver.worker_count)
            .thread_name(|i| format!("paran-worker-{i}"))
            .build()?;
        Ok(Self {
            finder: BrentRootFinder::new(solver),
            pool,
            latitude_range_rad,
            longitude_constraint,
            longitude_offset_deg: 0.0,
        })
    }

    /// Report longitudes relative to a sidereal offset instead of LST.
    pub fn with_longitude_offset(mut self, offset_deg: f64) -> Self {
        self.longitude_offset_deg = offset_deg;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Solve one horizon-horizon combination.
    pub fn solve(
        &self,
        event_a: AcgEventType,
        coords_a: &SphericalCoordinates,
        event_b: AcgEventType,
        coords_b: &SphericalCoordinates,
    ) -> NumericalReport {
        let equations = SimultaneityEquation::both_sides(event_a, coords_a, event_b, coords_b);
        let first = &equations[0];

        let (lo, hi) = self.latitude_range_rad;
        let bound = first.domain_bound();
        let range = (lo.max(-bound), hi.min(bound));
        if !(range.0 < range.1) {
            return NumericalReport {
                result: Err(FailureKind::NoHorizonCrossing),
                domain_valid: false,
                stats: RootFinderStats::default(),
            };
        }
        if first.is_latitude_independent() {
            return NumericalReport {
                result: Err(FailureKind::BracketNotFound),
                domain_valid: true,
                stats: RootFinderStats::default(),
            };
        }

        let tasks = seed_tasks(range, self.finder.config().seed_count);
        let searches: Vec<(SeedTask, RootSearch)> = self.pool.install(|| {
            tasks
                .par_iter()
                .map(|task| {
                    let eq = side_equation(&equations, task.side);
                    let search = self.finder.find_root_with_fallback(
                        &|x: f64| eq.evaluate(x),
                        &|x: f64| eq.evaluate_clipped(x),
                        range,
                        Some(task.seed),
                    );
                    (*task, search)
                })
                .collect()
        });

        let mut stats = RootFinderStats::default();
        let mut candidates = Vec::new();
        let mut precision_rad: f64 = 0.0;
        let mut iterations = 0;
        let mut used_fallback = false;
        let mut any_convergence_failure = false;

        for (task, search) in &searches {
            stats.merge(&search.stats);
            let Some(root) = search.root else {
                any_convergence_failure |= search.outcome == RootOutcome::ConvergenceFailed;
                continue;
            };
            let eq = side_equation(&equations, task.side);
            let Some(lst) = eq.sidereal_time_at(coords_a, coords_b, root) else {
                continue;
            };
            precision_rad = precision_rad.max(search.precision);
            iterations = iterations.max(search.iterations);
            used_fallback |= search.outcome == RootOutcome::FallbackConverged;
            let longitude = normalize_pm180(lst.to_degrees() - self.longitude_offset_deg);
            candidates.push(ParanPoint {
                point: GeographicPoint::new(root.to_degrees(), longitude),
                side: task.side,
                residual_rad: eq.evaluate(root).abs(),
            });
        }

        if candidates.is_empty() {
            let reason = if any_convergence_failure {
                FailureKind::ConvergenceFailed
            } else {
                FailureKind::BracketNotFound
            };
            return NumericalReport {
                result: Err(reason),
                domain_valid: true,
                stats,
            };
        }

        if let Some(constraint) = &self.longitude_constraint {
            candidates.retain(|p| constraint.admits(p.point.longitude_deg));
            if candidates.is_empty() {
                return NumericalReport {
                    result: Err(FailureKind::OutOfConfiguredRange),
                    domain_valid: true,
                    stats,
                };
            }
        }

        let points = deduplicate_points(candidates);
        debug!(
            pair = %format!("{event_a}/{event_b}"),
            roots = points.len(),
            calls = stats.total_calls,
            "horizon-horizon solve"
        );
        NumericalReport {
            result: Ok(NumericalSolution {
                points,
                precision_deg: precision_rad.to_degrees(),
                iterations,
                used_fallback,
            }),
            domain_valid: true,
            stats,
        }
    }
}

fn side_equation(
    equations: &[SimultaneityEquation; 2],
    side: HorizonSide,
) -> &SimultaneityEquation {
    match side {
        HorizonSide::Eastern => &equations[0],
        HorizonSide::Western => &equations[1],
    }
}

/// Both sides, `n` seeds each at `lo + (i + 1/2)(hi - lo)/n`.
fn seed_tasks(range: (f64, f64), n: usize) -> Vec<SeedTask> {
    let (lo, hi) = range;
    let width = (hi - lo) / n as f64;
    HorizonSide::BOTH
        .iter()
        .flat_map(|&side| {
            (0..n).map(move |i| SeedTask {
                side,
                seed: lo + (i as f64 + 0.5) * width,
            })
        })
        .collect()
}

/// Sort by (latitude, longitude) and collapse points within
/// [`DEDUP_TOLERANCE_DEG`] of an already kept point. The first point in sort
/// order survives.
pub fn deduplicate_points(mut points: Vec<ParanPoint>) -> Vec<ParanPoint> {
    points.sort_by(|a, b| {
        a.point
            .latitude_deg
            .total_cmp(&b.point.latitude_deg)
            .then(a.point.longitude_deg.total_cmp(&b.point.longitude_deg))
            .then(a.side.cmp(&b.side))
    });

    let mut kept: Vec<ParanPoint> = Vec::with_capacity(points.len());
    for p in points {
        let duplicate = kept
            .iter()
            .rev()
            .take_while(|k| p.point.latitude_deg - k.point.latitude_deg < DEDUP_TOLERANCE_DEG)
            .any(|k| {
                wrapped_separation_deg(p.point.longitude_deg, k.point.longitude_deg)
                    < DEDUP_TOLERANCE_DEG
            });
        if !duplicate {
            kept.push(p);
        }
    }
    kept
}
