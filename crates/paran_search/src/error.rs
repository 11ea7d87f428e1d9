//! Error types for paran searches.
//!
//! Two layers: [`ParanError`] aborts a whole batch (malformed input or
//! configuration, worker pool failure), while [`FailureKind`] records why a
//! single line has no solution and never crosses a function boundary as an
//! `Err`.

use thiserror::Error;

/// Batch-level errors from [`crate::ParanCalculator`].
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ParanError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A configured body has no entry in the supplied positions.
    #[error("no position supplied for body '{0}'")]
    MissingPosition(String),
    /// A supplied position is non-finite or out of range.
    #[error("invalid position for body '{body}': {reason}")]
    InvalidPosition { body: String, reason: &'static str },
    /// The solver worker pool could not be built.
    #[error("worker pool error: {0}")]
    WorkerPool(String),
    /// The ephemeris collaborator failed.
    #[error("ephemeris provider error: {0}")]
    Provider(String),
}

impl From<rayon::ThreadPoolBuildError> for ParanError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Self::WorkerPool(e.to_string())
    }
}

/// Why a single paran line was not solved (or was rejected afterwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureKind {
    /// A body never reaches the reference altitude at the latitudes tried.
    NoHorizonCrossing,
    /// Closed-form path is singular for the horizon body: at a celestial
    /// pole it never crosses the horizon, and on the celestial equator its
    /// horizon hour angle is 90 deg at every latitude.
    CelestialPoleDegeneracy,
    /// No sign change of the residual found within the bracket attempts.
    BracketNotFound,
    /// Brent iteration (and the relaxed fallback, if enabled) missed tolerance.
    ConvergenceFailed,
    /// Solution outside the configured latitude range or +/-89.99 deg.
    OutOfConfiguredRange,
    /// Geometrically valid but rejected by the visibility policy.
    FailedVisibilityFilter,
    /// Meridian-meridian pair whose right ascensions are not simultaneous.
    NotSimultaneous,
}

impl FailureKind {
    /// Short stable label, for logs and external monitoring.
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoHorizonCrossing => "no_horizon_crossing",
            Self::CelestialPoleDegeneracy => "celestial_pole_degeneracy",
            Self::BracketNotFound => "bracket_not_found",
            Self::ConvergenceFailed => "convergence_failed",
            Self::OutOfConfiguredRange => "out_of_configured_range",
            Self::FailedVisibilityFilter => "failed_visibility_filter",
            Self::NotSimultaneous => "not_simultaneous",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = ParanError::InvalidConfig("max_iterations must be > 0");
        assert_eq!(e.to_string(), "invalid configuration: max_iterations must be > 0");
        let e = ParanError::MissingPosition("Mars".into());
        assert!(e.to_string().contains("Mars"));
    }

    #[test]
    fn failure_labels_unique() {
        let all = [
            FailureKind::NoHorizonCrossing,
            FailureKind::CelestialPoleDegeneracy,
            FailureKind::BracketNotFound,
            FailureKind::ConvergenceFailed,
            FailureKind::OutOfConfiguredRange,
            FailureKind::FailedVisibilityFilter,
            FailureKind::NotSimultaneous,
        ];
        let mut labels: Vec<_> = all.iter().map(|k| k.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), all.len());
    }
}
