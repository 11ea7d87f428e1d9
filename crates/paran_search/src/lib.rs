//! Astrocartography paran line search: the latitudes at which two bodies
//! reach their angular events at the same sidereal instant.
//!
//! This crate provides:
//! - Closed-form solutions for meridian/horizon and meridian/meridian pairs
//! - Brent-based numerical search for horizon/horizon pairs, fanned out
//!   over a rayon worker pool
//! - Visibility filtering under geometric or apparent horizon conventions
//! - Post-hoc geometric validation and batch quality scoring
//! - Batch orchestration with per-line diagnostics and shared solver statistics

pub mod calculator;
pub mod closed_form;
pub mod config_types;
pub mod ephemeris;
pub mod error;
pub mod numerical;
pub mod paran_types;
pub mod residual;
pub mod root_finder;
pub mod stats;
pub mod validator;
pub mod visibility;

pub use calculator::{BATCH_TARGET_MS, ParanCalculator};
pub use closed_form::{CLOSED_FORM_PRECISION_DEG, ClosedFormSolution, ClosedFormSolver};
pub use config_types::{
    APPARENT_HORIZON_DEG, EventCombinations, HorizonConvention, LongitudeConstraint,
    LongitudeReference, MAX_ABS_LATITUDE_DEG, ParanConfiguration, PrecisionTier, SolverConfig,
    VisibilityMode,
};
pub use ephemeris::{EphemerisPosition, EphemerisProvider, StaticEphemeris};
pub use error::{FailureKind, ParanError};
pub use numerical::{
    DEDUP_TOLERANCE_DEG, NumericalHorizonHorizonSolver, NumericalReport, NumericalSolution,
    deduplicate_points,
};
pub use paran_types::{
    AcgEventType, CalculationMethod, HorizonSide, LineStatus, MethodCounts, ParanLine,
    ParanPairType, ParanPoint, ParanResult, PerformanceMetrics, QualityReport,
};
pub use residual::{SimultaneityEquation, best_side_residual, is_genuine_crossing};
pub use root_finder::{Bracket, BrentRootFinder, RootOutcome, RootSearch};
pub use stats::{RootFinderStats, SharedRootFinderStats};
pub use validator::{POLAR_CIRCLE_DEG, ParanSolutionValidator};
pub use visibility::AcgVisibilityFilter;

pub use paran_math::{GeographicPoint, SphericalCoordinates};
