//! Configuration for paran batches and the numerical solver.

use crate::paran_types::AcgEventType;

/// Absolute latitude bound for any returned solution, degrees.
pub const MAX_ABS_LATITUDE_DEG: f64 = 89.99;

/// Atmospheric refraction depression of the apparent horizon, degrees (34').
pub const APPARENT_HORIZON_DEG: f64 = -0.5667;

/// Solver effort tier. Scales tolerances, bracket search, and worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrecisionTier {
    Fast,
    #[default]
    Standard,
    High,
    UltraHigh,
}

impl PrecisionTier {
    /// Worker threads for the horizon-horizon search.
    pub const fn worker_count(self) -> usize {
        match self {
            Self::Fast => 1,
            Self::Standard => 2,
            Self::High => 4,
            Self::UltraHigh => 6,
        }
    }
}

/// Parameters of the bracket search + Brent root finder.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Maximum Brent iterations per bracket.
    pub max_iterations: u32,
    /// Residual tolerance for an accepted root, radians.
    pub tolerance_rad: f64,
    /// Half-width growth of the bracket window per attempt, radians.
    pub bracket_search_step_rad: f64,
    /// Window expansions before giving up.
    pub max_bracket_attempts: u32,
    /// Worker threads for the eastern/western searches.
    pub worker_count: usize,
    /// Fall back to minimizing |F| when Brent misses tolerance.
    pub adaptive_precision_enabled: bool,
    /// Residual tolerance accepted from the fallback, radians.
    pub fallback_tolerance_rad: f64,
    /// Equally spaced seeds per horizon side.
    pub seed_count: usize,
}

impl SolverConfig {
    /// Defaults for a precision tier.
    pub fn for_tier(tier: PrecisionTier) -> Self {
        let step_deg: f64 = match tier {
            PrecisionTier::Fast => 2.0,
            PrecisionTier::Standard => 1.0,
            PrecisionTier::High => 0.5,
            PrecisionTier::UltraHigh => 0.25,
        };
        let (max_iterations, tolerance_rad, max_bracket_attempts, fallback, seed_count) =
            match tier {
                PrecisionTier::Fast => (50, 1e-8, 15, 1e-5, 3),
                PrecisionTier::Standard => (100, 1e-10, 20, 1e-6, 5),
                PrecisionTier::High => (200, 1e-12, 40, 1e-7, 5),
                PrecisionTier::UltraHigh => (500, 1e-13, 80, 1e-8, 7),
            };
        Self {
            max_iterations,
            tolerance_rad,
            bracket_search_step_rad: step_deg.to_radians(),
            max_bracket_attempts,
            worker_count: tier.worker_count(),
            adaptive_precision_enabled: !matches!(tier, PrecisionTier::Fast),
            fallback_tolerance_rad: fallback,
            seed_count,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0");
        }
        if !self.tolerance_rad.is_finite() || self.tolerance_rad <= 0.0 {
            return Err("tolerance_rad must be positive");
        }
        if !self.bracket_search_step_rad.is_finite() || self.bracket_search_step_rad <= 0.0 {
            return Err("bracket_search_step_rad must be positive");
        }
        if self.max_bracket_attempts == 0 {
            return Err("max_bracket_attempts must be > 0");
        }
        if self.worker_count == 0 {
            return Err("worker_count must be > 0");
        }
        if !self.fallback_tolerance_rad.is_finite()
            || self.fallback_tolerance_rad < self.tolerance_rad
        {
            return Err("fallback_tolerance_rad must be finite and >= tolerance_rad");
        }
        if self.seed_count == 0 {
            return Err("seed_count must be > 0");
        }
        Ok(())
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::for_tier(PrecisionTier::Standard)
    }
}

/// Which points survive the visibility filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VisibilityMode {
    /// No filtering.
    #[default]
    All,
    /// Both bodies at or above the horizon limit at their events.
    BothVisible,
    /// Only the meridian body (or bodies) must clear the horizon limit.
    MeridianVisibleOnly,
}

/// Reference horizon for visibility decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HorizonConvention {
    /// True horizon, 0 deg.
    #[default]
    Geometric,
    /// Refraction-corrected horizon, -0.5667 deg.
    Apparent,
}

impl HorizonConvention {
    /// Minimum altitude counted as visible, degrees.
    pub const fn horizon_limit_deg(self) -> f64 {
        match self {
            Self::Geometric => 0.0,
            Self::Apparent => APPARENT_HORIZON_DEG,
        }
    }
}

/// How geographic longitudes are referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LongitudeReference {
    /// Longitude equals local sidereal time (Greenwich sidereal time = 0).
    #[default]
    SiderealProxy,
    /// Subtract Greenwich mean sidereal time at the epoch.
    Greenwich,
}

/// Keep only points within `tolerance_deg` of `center_deg` in longitude.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LongitudeConstraint {
    pub center_deg: f64,
    pub tolerance_deg: f64,
}

impl LongitudeConstraint {
    /// Default window half-width, degrees.
    pub const DEFAULT_TOLERANCE_DEG: f64 = 5.0;

    pub fn around(center_deg: f64) -> Self {
        Self {
            center_deg,
            tolerance_deg: Self::DEFAULT_TOLERANCE_DEG,
        }
    }

    pub fn admits(&self, longitude_deg: f64) -> bool {
        paran_math::wrapped_separation_deg(longitude_deg, self.center_deg) <= self.tolerance_deg
    }
}

/// Which event combinations to evaluate for each pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventCombinations {
    /// MC/R, MC/S, IC/R, IC/S, R/R, R/S, S/R, S/S.
    #[default]
    Standard,
    /// All 16 ordered combinations.
    All,
    /// Caller-specified list, evaluated in the given order.
    Custom(Vec<(AcgEventType, AcgEventType)>),
}

impl EventCombinations {
    /// Expand into an ordered list.
    pub fn expand(&self) -> Vec<(AcgEventType, AcgEventType)> {
        use AcgEventType::*;
        match self {
            Self::Standard => vec![
                (Mc, Rise),
                (Mc, Set),
                (Ic, Rise),
                (Ic, Set),
                (Rise, Rise),
                (Rise, Set),
                (Set, Rise),
                (Set, Set),
            ],
            Self::All => AcgEventType::ALL
                .iter()
                .flat_map(|&a| AcgEventType::ALL.iter().map(move |&b| (a, b)))
                .collect(),
            Self::Custom(list) => list.clone(),
        }
    }
}

/// Full configuration of a paran batch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParanConfiguration {
    /// Body pairs, by ephemeris name.
    pub planet_pairs: Vec<(String, String)>,
    pub event_combinations: EventCombinations,
    pub visibility_mode: VisibilityMode,
    pub horizon_convention: HorizonConvention,
    /// Average precision regarded as meeting the standard, degrees.
    pub precision_target_deg: f64,
    /// Inclusive (min, max) latitude, degrees.
    pub latitude_range: (f64, f64),
    pub precision_tier: PrecisionTier,
    /// Overrides the tier's Brent iteration cap.
    pub max_iterations: u32,
    /// Overrides the tier's residual tolerance, radians.
    pub convergence_tolerance_rad: f64,
    /// Skip meridian-meridian combinations entirely.
    pub exclude_degenerate_cases: bool,
    /// Right-ascension tolerance for meridian-meridian simultaneity, degrees.
    pub meridian_tolerance_deg: f64,
    /// Latitude spacing of meridian-meridian samples, degrees.
    pub degenerate_sample_step_deg: f64,
    pub longitude_reference: LongitudeReference,
    pub longitude_constraint: Option<LongitudeConstraint>,
}

impl Default for ParanConfiguration {
    fn default() -> Self {
        let solver = SolverConfig::for_tier(PrecisionTier::Standard);
        Self {
            planet_pairs: Vec::new(),
            event_combinations: EventCombinations::Standard,
            visibility_mode: VisibilityMode::All,
            horizon_convention: HorizonConvention::Geometric,
            precision_target_deg: 0.03,
            latitude_range: (-MAX_ABS_LATITUDE_DEG, MAX_ABS_LATITUDE_DEG),
            precision_tier: PrecisionTier::Standard,
            max_iterations: solver.max_iterations,
            convergence_tolerance_rad: solver.tolerance_rad,
            exclude_degenerate_cases: true,
            meridian_tolerance_deg: 1.0,
            degenerate_sample_step_deg: 10.0,
            longitude_reference: LongitudeReference::SiderealProxy,
            longitude_constraint: None,
        }
    }
}

impl ParanConfiguration {
    /// Configuration for explicit pairs, defaults elsewhere.
    pub fn for_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, S)>) -> Self {
        Self {
            planet_pairs: pairs.into_iter().map(|(a, b)| (a.into(), b.into())).collect(),
            ..Self::default()
        }
    }

    /// Configuration covering every unordered pair of `bodies`, in input order.
    pub fn for_all_pairs(bodies: &[&str]) -> Self {
        let mut pairs = Vec::new();
        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                pairs.push((a.to_string(), b.to_string()));
            }
        }
        Self {
            planet_pairs: pairs,
            ..Self::default()
        }
    }

    /// Apply a precision tier, resetting the iteration and tolerance overrides.
    pub fn with_tier(mut self, tier: PrecisionTier) -> Self {
        let solver = SolverConfig::for_tier(tier);
        self.precision_tier = tier;
        self.max_iterations = solver.max_iterations;
        self.convergence_tolerance_rad = solver.tolerance_rad;
        self
    }

    /// Solver configuration: the tier defaults with this configuration's
    /// iteration cap and tolerance.
    pub fn solver_config(&self) -> SolverConfig {
        let mut solver = SolverConfig::for_tier(self.precision_tier);
        solver.max_iterations = self.max_iterations;
        solver.tolerance_rad = self.convergence_tolerance_rad;
        solver.fallback_tolerance_rad = solver
            .fallback_tolerance_rad
            .max(self.convergence_tolerance_rad);
        solver
    }

    /// Latitude range clipped to +/-89.99 deg, radians.
    pub fn effective_latitude_range_rad(&self) -> (f64, f64) {
        let (lo, hi) = self.latitude_range;
        (
            lo.max(-MAX_ABS_LATITUDE_DEG).to_radians(),
            hi.min(MAX_ABS_LATITUDE_DEG).to_radians(),
        )
    }

    /// Whether `latitude_deg` is inside both the configured and absolute bounds.
    pub fn admits_latitude(&self, latitude_deg: f64) -> bool {
        let (lo, hi) = self.latitude_range;
        latitude_deg.is_finite()
            && latitude_deg.abs() <= MAX_ABS_LATITUDE_DEG
            && latitude_deg >= lo
            && latitude_deg <= hi
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.planet_pairs.is_empty() {
            return Err("planet_pairs must not be empty");
        }
        if self.planet_pairs.iter().any(|(a, b)| a == b) {
            return Err("a planet pair must name two different bodies");
        }
        if let EventCombinations::Custom(list) = &self.event_combinations {
            if list.is_empty() {
                return Err("custom event combinations must not be empty");
            }
        }
        if !self.precision_target_deg.is_finite() || self.precision_target_deg <= 0.0 {
            return Err("precision_target_deg must be positive");
        }
        let (lo, hi) = self.latitude_range;
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err("latitude_range must be a finite, increasing interval");
        }
        if lo < -90.0 || hi > 90.0 {
            return Err("latitude_range must lie within [-90, 90]");
        }
        if lo >= MAX_ABS_LATITUDE_DEG || hi <= -MAX_ABS_LATITUDE_DEG {
            return Err("latitude_range must overlap [-89.99, 89.99]");
        }
        if !self.meridian_tolerance_deg.is_finite() || self.meridian_tolerance_deg <= 0.0 {
            return Err("meridian_tolerance_deg must be positive");
        }
        if !self.degenerate_sample_step_deg.is_finite() || self.degenerate_sample_step_deg <= 0.0 {
            return Err("degenerate_sample_step_deg must be positive");
        }
        if let Some(c) = &self.longitude_constraint {
            if !c.center_deg.is_finite() || !c.tolerance_deg.is_finite() || c.tolerance_deg <= 0.0 {
                return Err("longitude constraint must be finite with positive tolerance");
            }
        }
        self.solver_config().validate()
    }
}
