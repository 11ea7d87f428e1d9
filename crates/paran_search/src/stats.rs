//! Root-finder call statistics.
//!
//! Each root-find produces its own [`RootFinderStats`] delta; callers merge
//! them. Nothing here is global. [`SharedRootFinderStats`] is the atomic
//! accumulator a long-lived calculator keeps so monitoring can read totals
//! while a batch is running on another thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing one or more root-finder calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RootFinderStats {
    /// Number of `find_root` invocations.
    pub total_calls: u64,
    /// Calls that returned a root (direct Brent or fallback).
    pub successes: u64,
    /// Calls that found no bracketing interval.
    pub bracket_failures: u64,
    /// Calls whose Brent refinement (and fallback) missed tolerance.
    pub convergence_failures: u64,
    /// Successes that came from the relaxed fallback minimization.
    pub fallback_successes: u64,
    /// Brent iterations summed over all calls.
    pub total_iterations: u64,
}

impl RootFinderStats {
    /// Fraction of calls that produced a root, in [0, 1]. Zero when idle.
    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_calls as f64
        }
    }

    /// Add another set of counters into this one.
    pub fn merge(&mut self, other: &RootFinderStats) {
        self.total_calls += other.total_calls;
        self.successes += other.successes;
        self.bracket_failures += other.bracket_failures;
        self.convergence_failures += other.convergence_failures;
        self.fallback_successes += other.fallback_successes;
        self.total_iterations += other.total_iterations;
    }
}

impl std::fmt::Display for RootFinderStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Root Finder Statistics:")?;
        writeln!(f, "  Total Calls: {}", self.total_calls)?;
        writeln!(f, "  Successes: {}", self.successes)?;
        writeln!(f, "  Bracket Failures: {}", self.bracket_failures)?;
        writeln!(f, "  Convergence Failures: {}", self.convergence_failures)?;
        writeln!(f, "  Fallback Successes: {}", self.fallback_successes)?;
        writeln!(f, "  Brent Iterations: {}", self.total_iterations)?;
        write!(f, "  Success Rate: {:.3}", self.success_rate())
    }
}

/// Thread-safe running totals of [`RootFinderStats`].
#[derive(Debug, Default)]
pub struct SharedRootFinderStats {
    total_calls: AtomicU64,
    successes: AtomicU64,
    bracket_failures: AtomicU64,
    convergence_failures: AtomicU64,
    fallback_successes: AtomicU64,
    total_iterations: AtomicU64,
}

impl SharedRootFinderStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a batch delta into the totals.
    pub fn record(&self, delta: &RootFinderStats) {
        self.total_calls.fetch_add(delta.total_calls, Ordering::Relaxed);
        self.successes.fetch_add(delta.successes, Ordering::Relaxed);
        self.bracket_failures
            .fetch_add(delta.bracket_failures, Ordering::Relaxed);
        self.convergence_failures
            .fetch_add(delta.convergence_failures, Ordering::Relaxed);
        self.fallback_successes
            .fetch_add(delta.fallback_successes, Ordering::Relaxed);
        self.total_iterations
            .fetch_add(delta.total_iterations, Ordering::Relaxed);
    }

    /// Point-in-time copy of the totals.
    pub fn snapshot(&self) -> RootFinderStats {
        RootFinderStats {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            bracket_failures: self.bracket_failures.load(Ordering::Relaxed),
            convergence_failures: self.convergence_failures.load(Ordering::Relaxed),
            fallback_successes: self.fallback_successes.load(Ordering::Relaxed),
            total_iterations: self.total_iterations.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.total_calls.store(0, Ordering::Relaxed);
        self.successes.store(0, Ordering::Relaxed);
        self.bracket_failures.store(0, Ordering::Relaxed);
        self.convergence_failures.store(0, Ordering::Relaxed);
        self.fallback_successes.store(0, Ordering::Relaxed);
        self.total_iterations.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RootFinderStats {
        RootFinderStats {
            total_calls: 4,
            successes: 3,
            bracket_failures: 1,
            convergence_failures: 0,
            fallback_successes: 1,
            total_iterations: 40,
        }
    }

    #[test]
    fn success_rate_idle_is_zero() {
        assert_eq!(RootFinderStats::default().success_rate(), 0.0);
    }

    #[test]
    fn success_rate_ratio() {
        assert!((sample().success_rate() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn merge_adds_fields() {
        let mut a = sample();
        a.merge(&sample());
        assert_eq!(a.total_calls, 8);
        assert_eq!(a.successes, 6);
        assert_eq!(a.total_iterations, 80);
    }

    #[test]
    fn shared_record_and_reset() {
        let shared = SharedRootFinderStats::new();
        shared.record(&sample());
        shared.record(&sample());
        assert_eq!(shared.snapshot().bracket_failures, 2);
        shared.reset();
        assert_eq!(shared.snapshot(), RootFinderStats::default());
    }

    #[test]
    fn display_lists_counters() {
        let s = sample().to_string();
        assert!(s.contains("Total Calls: 4"));
        assert!(s.contains("Success Rate: 0.750"));
    }
}
