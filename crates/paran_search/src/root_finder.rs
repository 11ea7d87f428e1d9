//! Bracket search, Brent refinement, and a golden-section fallback.
//!
//! The residual may be undefined (NaN) over parts of the search range. A
//! bracket is only accepted when both ends are finite and the sign change is
//! a genuine crossing rather than a wrap seam. Wide brackets are bisected a
//! few levels to confirm the crossing survives; a seam hidden inside a window
//! shows up as a `+pi`/`-pi` pair once the interval narrows.

use tracing::trace;

use crate::config_types::SolverConfig;
use crate::residual::is_genuine_crossing;
use crate::stats::RootFinderStats;

/// Failed window expansions before each window is also scanned internally.
const SUBDIVIDE_AFTER_ATTEMPTS: u32 = 3;

/// Minimum sub-intervals when scanning inside a window.
const MIN_SUBDIVISIONS: usize = 8;

/// Coarse samples across the range before golden-section minimization.
const FALLBACK_GRID_SAMPLES: usize = 90;

/// Relative x tolerance of Brent, as a fraction of the residual tolerance.
const X_TOLERANCE_FACTOR: f64 = 1e-3;

const INV_GOLDEN: f64 = 0.618_033_988_749_894_8;

/// Bisection levels used to confirm a sign change is continuous.
const CONTINUITY_BISECTIONS: u32 = 8;

/// An interval with a sign change of the residual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub a: f64,
    pub f_a: f64,
    pub b: f64,
    pub f_b: f64,
    /// Window expansions used to find it.
    pub attempts: u32,
}

/// Result classification of one root-find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootOutcome {
    /// Brent reached the residual tolerance.
    Converged,
    /// Brent missed, the relaxed fallback succeeded.
    FallbackConverged,
    BracketNotFound,
    ConvergenceFailed,
}

impl RootOutcome {
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Converged | Self::FallbackConverged)
    }
}

/// Report of one `find_root` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootSearch {
    /// Root location, when `outcome` is a success.
    pub root: Option<f64>,
    pub outcome: RootOutcome,
    /// |F| at the returned root (or best point found).
    pub residual: f64,
    /// Half-width of the final interval around the root.
    pub precision: f64,
    pub iterations: u32,
    /// Counters for this call only.
    pub stats: RootFinderStats,
}

#[derive(Debug, Clone, Copy)]
struct BrentRun {
    x: f64,
    f_x: f64,
    half_width: f64,
    iterations: u32,
    converged: bool,
}

/// Brent root finder over a latitude range.
///
/// Stateless apart from its configuration; every call returns its own stats
/// delta so concurrent callers never share counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrentRootFinder {
    config: SolverConfig,
}

impl BrentRootFinder {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Find a root of `f` in `range`, starting the bracket search at `seed`
    /// (range midpoint when `None`).
    pub fn find_root<F>(&self, f: F, range: (f64, f64), seed: Option<f64>) -> RootSearch
    where
        F: Fn(f64) -> f64,
    {
        self.find_root_with_fallback(&f, &f, range, seed)
    }

    /// Like [`find_root`](Self::find_root), but the fallback minimizes
    /// `|fallback|` instead of `|f|`. A fallback point is accepted only where
    /// `f` itself is finite and within the fallback tolerance.
    ///
    /// Residuals that are NaN outside a latitude domain pass a clipped
    /// variant here so the minimizer can walk up to the domain edge.
    pub fn find_root_with_fallback<F, G>(
        &self,
        f: &F,
        fallback: &G,
        range: (f64, f64),
        seed: Option<f64>,
    ) -> RootSearch
    where
        F: Fn(f64) -> f64,
        G: Fn(f64) -> f64,
    {
        let mut stats = RootFinderStats {
            total_calls: 1,
            ..RootFinderStats::default()
        };

        let Some(bracket) = self.find_bracket(f, range, seed) else {
            stats.bracket_failures = 1;
            return RootSearch {
                root: None,
                outcome: RootOutcome::BracketNotFound,
                residual: f64::NAN,
                precision: f64::NAN,
                iterations: 0,
                stats,
            };
        };

        let run = self.brent(f, &bracket);
        stats.total_iterations = u64::from(run.iterations);
        trace!(
            a = bracket.a,
            b = bracket.b,
            attempts = bracket.attempts,
            iterations = run.iterations,
            converged = run.converged,
            "brent refinement"
        );

        if run.converged {
            stats.successes = 1;
            return RootSearch {
                root: Some(run.x),
                outcome: RootOutcome::Converged,
                residual: run.f_x.abs(),
                precision: run.half_width,
                iterations: run.iterations,
                stats,
            };
        }

        if self.config.adaptive_precision_enabled {
            if let Some((x, _, width)) = self.minimize_abs(fallback, range) {
                // NaN fails the comparison.
                let r = f(x).abs();
                if r < self.config.fallback_tolerance_rad {
                    stats.successes = 1;
                    stats.fallback_successes = 1;
                    return RootSearch {
                        root: Some(x),
                        outcome: RootOutcome::FallbackConverged,
                        residual: r,
                        precision: width,
                        iterations: run.iterations,
                        stats,
                    };
                }
            }
        }

        stats.convergence_failures = 1;
        RootSearch {
            root: None,
            outcome: RootOutcome::ConvergenceFailed,
            residual: run.f_x.abs(),
            precision: run.half_width,
            iterations: run.iterations,
            stats,
        }
    }

    // -----------------------------------------------------------------------
    // Bracket search
    // -----------------------------------------------------------------------

    /// Expand a window around the seed until its ends straddle a genuine
    /// crossing. Later attempts also scan inside the window, nearest
    /// sub-interval to the seed first.
    pub fn find_bracket<F>(&self, f: &F, range: (f64, f64), seed: Option<f64>) -> Option<Bracket>
    where
        F: Fn(f64) -> f64,
    {
        let (lo, hi) = range;
        if !(lo < hi) {
            return None;
        }
        let center = seed.unwrap_or(0.5 * (lo + hi)).clamp(lo, hi);
        let step = self.config.bracket_search_step_rad;

        for attempt in 1..=self.config.max_bracket_attempts {
            let half = f64::from(attempt) * step;
            let a = (center - half).max(lo);
            let b = (center + half).min(hi);
            if b > a {
                let (f_a, f_b) = (f(a), f(b));
                if f_a.is_finite()
                    && f_b.is_finite()
                    && is_continuous_crossing(f, (a, f_a), (b, f_b))
                {
                    return Some(Bracket {
                        a,
                        f_a,
                        b,
                        f_b,
                        attempts: attempt,
                    });
                }
                if attempt >= SUBDIVIDE_AFTER_ATTEMPTS {
                    let pieces = MIN_SUBDIVISIONS.max(2 * attempt as usize);
                    if let Some(mut br) = scan_window(f, a, b, center, pieces) {
                        br.attempts = attempt;
                        return Some(br);
                    }
                }
            }
            if a <= lo && b >= hi {
                break;
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Brent refinement
    // -----------------------------------------------------------------------

    fn brent<F>(&self, f: &F, bracket: &Bracket) -> BrentRun
    where
        F: Fn(f64) -> f64,
    {
        let tol_f = self.config.tolerance_rad;
        let tol_x = self.config.tolerance_rad * X_TOLERANCE_FACTOR;

        let (mut a, mut fa) = (bracket.a, bracket.f_a);
        let (mut b, mut fb) = (bracket.b, bracket.f_b);
        let (mut c, mut fc) = (a, fa);
        let mut d = b - a;
        let mut e = d;

        for iter in 1..=self.config.max_iterations {
            if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * tol_x;
            let xm = 0.5 * (c - b);

            if fb.abs() <= tol_f {
                return BrentRun {
                    x: b,
                    f_x: fb,
                    half_width: xm.abs(),
                    iterations: iter,
                    converged: true,
                };
            }
            if xm.abs() <= tol1 {
                // Interval collapsed without meeting the residual tolerance:
                // a steep root the fallback may still resolve.
                return BrentRun {
                    x: b,
                    f_x: fb,
                    half_width: xm.abs(),
                    iterations: iter,
                    converged: false,
                };
            }

            if e.abs() >= tol1 && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (mut p, mut q) = if a == c {
                    (2.0 * xm * s, 1.0 - s)
                } else {
                    let q0 = fa / fc;
                    let r = fb / fc;
                    (
                        s * (2.0 * xm * q0 * (q0 - r) - (b - a) * (r - 1.0)),
                        (q0 - 1.0) * (r - 1.0) * (s - 1.0),
                    )
                };
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();
                let min1 = 3.0 * xm * q - (tol1 * q).abs();
                let min2 = (e * q).abs();
                if 2.0 * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            b += if d.abs() > tol1 { d } else { tol1.copysign(xm) };
            fb = f(b);
            if !fb.is_finite() {
                return BrentRun {
                    x: a,
                    f_x: fa,
                    half_width: xm.abs(),
                    iterations: iter,
                    converged: false,
                };
            }
        }

        BrentRun {
            x: b,
            f_x: fb,
            half_width: 0.5 * (c - b).abs(),
            iterations: self.config.max_iterations,
            converged: false,
        }
    }

    // -----------------------------------------------------------------------
    // Fallback minimization
    // -----------------------------------------------------------------------

    /// Minimize |f| over `range`: coarse grid, then golden section around the
    /// best sample. Returns `(x, |f(x)|, half-width)`; non-finite values
    /// count as +inf.
    pub fn minimize_abs<F>(&self, f: &F, range: (f64, f64)) -> Option<(f64, f64, f64)>
    where
        F: Fn(f64) -> f64,
    {
        let (lo, hi) = range;
        if !(lo < hi) {
            return None;
        }
        let g = |x: f64| {
            let v = f(x).abs();
            if v.is_finite() { v } else { f64::INFINITY }
        };

        let n = FALLBACK_GRID_SAMPLES;
        let dx = (hi - lo) / n as f64;
        let mut best_i = 0;
        let mut best_v = f64::INFINITY;
        for i in 0..=n {
            let v = g(lo + i as f64 * dx);
            if v < best_v {
                best_v = v;
                best_i = i;
            }
        }
        if !best_v.is_finite() {
            return None;
        }

        let mut a = (lo + (best_i as f64 - 1.0) * dx).max(lo);
        let mut b = (lo + (best_i as f64 + 1.0) * dx).min(hi);
        let mut x1 = b - INV_GOLDEN * (b - a);
        let mut x2 = a + INV_GOLDEN * (b - a);
        let mut g1 = g(x1);
        let mut g2 = g(x2);
        let tol_x = self.config.tolerance_rad * X_TOLERANCE_FACTOR;

        for _ in 0..self.config.max_iterations {
            if b - a <= tol_x {
                break;
            }
            if g1 <= g2 {
                b = x2;
                x2 = x1;
                g2 = g1;
                x1 = b - INV_GOLDEN * (b - a);
                g1 = g(x1);
            } else {
                a = x1;
                x1 = x2;
                g1 = g2;
                x2 = a + INV_GOLDEN * (b - a);
                g2 = g(x2);
            }
        }

        let (x, v) = if g1 <= g2 { (x1, g1) } else { (x2, g2) };
        // The grid sample itself may beat the refined interior.
        let grid_x = lo + best_i as f64 * dx;
        let (x, v) = if best_v < v { (grid_x, best_v) } else { (x, v) };
        v.is_finite().then_some((x, v, 0.5 * (b - a)))
    }
}

/// Scan `[a, b]` in `pieces` equal sub-intervals for a genuine crossing,
/// returning the one whose midpoint is nearest `center`.
fn scan_window<F>(f: &F, a: f64, b: f64, center: f64, pieces: usize) -> Option<Bracket>
where
    F: Fn(f64) -> f64,
{
    let dx = (b - a) / pieces as f64;
    let xs: Vec<f64> = (0..=pieces).map(|i| a + i as f64 * dx).collect();
    let fs: Vec<f64> = xs.iter().map(|&x| f(x)).collect();

    (0..pieces)
        .filter(|&i| {
            fs[i].is_finite()
                && fs[i + 1].is_finite()
                && is_continuous_crossing(f, (xs[i], fs[i]), (xs[i + 1], fs[i + 1]))
        })
        .min_by(|&i, &j| {
            let di = (0.5 * (xs[i] + xs[i + 1]) - center).abs();
            let dj = (0.5 * (xs[j] + xs[j + 1]) - center).abs();
            di.total_cmp(&dj)
        })
        .map(|i| Bracket {
            a: xs[i],
            f_a: fs[i],
            b: xs[i + 1],
            f_b: fs[i + 1],
            attempts: 0,
        })
}

/// Bisect toward the sign change and require every level to remain a
/// genuine crossing with a finite midpoint.
fn is_continuous_crossing<F>(
    f: &F,
    (mut a, mut f_a): (f64, f64),
    (mut b, mut f_b): (f64, f64),
) -> bool
where
    F: Fn(f64) -> f64,
{
    for _ in 0..CONTINUITY_BISECTIONS {
        if !is_genuine_crossing(f_a, f_b) {
            return false;
        }
        let m = 0.5 * (a + b);
        let f_m = f(m);
        if !f_m.is_finite() {
            return false;
        }
        if f_m == 0.0 {
            return true;
        }
        if f_a * f_m < 0.0 {
            (b, f_b) = (m, f_m);
        } else {
            (a, f_a) = (m, f_m);
        }
    }
    is_genuine_crossing(f_a, f_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_types::PrecisionTier;

    fn finder() -> BrentRootFinder {
        BrentRootFinder::new(SolverConfig::default())
    }

    const RANGE: (f64, f64) = (-1.5, 1.5);

    #[test]
    fn finds_linear_root() {
        let r = finder().find_root(|x| x - 0.3, RANGE, None);
        assert_eq!(r.outcome, RootOutcome::Converged);
        assert!((r.root.unwrap() - 0.3).abs() < 1e-9);
        assert!(r.residual <= 1e-10);
        assert_eq!(r.stats.successes, 1);
        assert_eq!(r.stats.total_calls, 1);
    }

    #[test]
    fn finds_cubic_root_from_seed() {
        let f = |x: f64| x * x * x - 0.2;
        let r = finder().find_root(f, RANGE, Some(0.7));
        assert!(r.outcome.is_success());
        assert!((r.root.unwrap() - 0.2_f64.cbrt()).abs() < 1e-8);
        assert!(r.iterations > 0);
    }

    #[test]
    fn constant_has_no_bracket() {
        let r = finder().find_root(|_| 0.5, RANGE, None);
        assert_eq!(r.outcome, RootOutcome::BracketNotFound);
        assert!(r.root.is_none());
        assert_eq!(r.stats.bracket_failures, 1);
    }

    #[test]
    fn nan_regions_are_skipped() {
        // Undefined outside [0.2, 0.8]; root at 0.5.
        let f = |x: f64| {
            if (0.2..=0.8).contains(&x) {
                x - 0.5
            } else {
                f64::NAN
            }
        };
        let r = finder().find_root(f, RANGE, Some(0.3));
        assert!(r.outcome.is_success(), "{:?}", r.outcome);
        assert!((r.root.unwrap() - 0.5).abs() < 1e-8);
    }

    #[test]
    fn wrap_seam_is_not_a_root() {
        // Jumps from +3 to -3 at 0.4 without crossing zero.
        let f = |x: f64| if x < 0.4 { 3.0 } else { -3.0 };
        let r = finder().find_root(f, RANGE, None);
        assert_eq!(r.outcome, RootOutcome::BracketNotFound);
    }

    #[test]
    fn wide_window_over_wrap_seam_rejected() {
        // Ends differ by less than 1.5 pi but the jump at x = pi/2 - 1 is a seam.
        let f = |x: f64| paran_math::wrap_pm_pi(2.0 + 2.0 * x);
        assert!(is_genuine_crossing(f(0.0), f(1.0)));
        let mut cfg = SolverConfig::default();
        cfg.bracket_search_step_rad = 0.5;
        cfg.max_bracket_attempts = 4;
        let finder = BrentRootFinder::new(cfg);

        let r = finder.find_root(f, (0.0, 1.0), None);
        assert_eq!(r.outcome, RootOutcome::BracketNotFound);
        assert_eq!(r.stats.convergence_failures, 0);

        let r = finder.find_root(f, (-1.5, -0.5), None);
        assert_eq!(r.outcome, RootOutcome::Converged);
        assert!((r.root.unwrap() + 1.0).abs() < 1e-8);
    }

    #[test]
    fn fallback_minimizes_clipped_objective() {
        // Undefined past 0.5; one Brent step is not enough, so the clipped
        // variant drives the fallback and the true residual is checked.
        let mut cfg = SolverConfig::for_tier(PrecisionTier::Standard);
        cfg.max_iterations = 1;
        cfg.fallback_tolerance_rad = 1e-4;
        let g = |x: f64| if x <= 0.5 { (0.3 - x).powi(3) } else { f64::NAN };
        let clipped = |x: f64| (0.3 - x.min(0.5)).powi(3);
        let r = BrentRootFinder::new(cfg).find_root_with_fallback(&g, &clipped, RANGE, Some(0.25));
        assert_eq!(r.outcome, RootOutcome::FallbackConverged);
        let x = r.root.unwrap();
        assert!((x - 0.3).abs() < 0.05);
        assert!(g(x).abs() < 1e-4);
        assert_eq!(r.residual, g(x).abs());
    }

    #[test]
    fn nearest_crossing_to_seed_wins() {
        let f = |x: f64| (3.0 * x).sin();
        let pi_3 = std::f64::consts::PI / 3.0;
        let r = finder().find_root(f, RANGE, Some(1.0));
        assert!((r.root.unwrap() - pi_3).abs() < 1e-8);
        let r = finder().find_root(f, RANGE, Some(-1.0));
        assert!((r.root.unwrap() + pi_3).abs() < 1e-8);
    }

    #[test]
    fn fallback_rescues_when_iterations_run_out() {
        let mut cfg = SolverConfig::for_tier(PrecisionTier::Standard);
        cfg.max_iterations = 2;
        cfg.fallback_tolerance_rad = 1e-3;
        let f = |x: f64| (x - 0.123).powi(3);
        let r = BrentRootFinder::new(cfg).find_root(f, RANGE, None);
        assert_eq!(r.outcome, RootOutcome::FallbackConverged);
        assert_eq!(r.stats.fallback_successes, 1);
        assert!(r.residual < 1e-3);
    }

    #[test]
    fn no_fallback_when_disabled() {
        let mut cfg = SolverConfig::for_tier(PrecisionTier::Fast);
        cfg.max_iterations = 1;
        let f = |x: f64| (x - 0.123).powi(3);
        let r = BrentRootFinder::new(cfg).find_root(f, RANGE, None);
        assert_eq!(r.outcome, RootOutcome::ConvergenceFailed);
        assert_eq!(r.stats.convergence_failures, 1);
    }

    #[test]
    fn minimize_abs_locates_touching_zero() {
        // |f| touches zero without a sign change.
        let f = |x: f64| (x - 0.7) * (x - 0.7);
        let (x, v, _) = finder().minimize_abs(&f, RANGE).unwrap();
        assert!((x - 0.7).abs() < 1e-4);
        assert!(v < 1e-8);
    }

    #[test]
    fn empty_range_has_no_bracket() {
        assert!(finder().find_bracket(&|x: f64| x, (0.5, 0.5), None).is_none());
    }
}
