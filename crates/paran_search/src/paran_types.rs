//! Types for paran events, lines, and batch results.

use std::f64::consts::PI;

use paran_math::{
    GeographicPoint, SphericalCoordinates, clipped_horizon_hour_angle,
    geometric_horizon_hour_angle,
};

use crate::error::FailureKind;
use crate::stats::RootFinderStats;

/// Angular event of a body relative to the local horizon or meridian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AcgEventType {
    /// Upper culmination (MC): hour angle 0.
    Mc,
    /// Lower culmination (IC): hour angle pi.
    Ic,
    /// Rising on the eastern horizon: negative hour angle.
    Rise,
    /// Setting on the western horizon: positive hour angle.
    Set,
}

impl AcgEventType {
    /// All four events in canonical order.
    pub const ALL: [AcgEventType; 4] = [Self::Mc, Self::Ic, Self::Rise, Self::Set];

    /// Conventional chart symbol.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Mc => "MC",
            Self::Ic => "IC",
            Self::Rise => "R",
            Self::Set => "S",
        }
    }

    /// Whether the event is a meridian crossing (MC or IC).
    pub const fn is_meridian(self) -> bool {
        matches!(self, Self::Mc | Self::Ic)
    }

    /// Whether the event is a horizon crossing (rise or set).
    pub const fn is_horizon(self) -> bool {
        matches!(self, Self::Rise | Self::Set)
    }

    /// Fixed hour angle of a meridian event; `None` for horizon events.
    pub const fn meridian_hour_angle(self) -> Option<f64> {
        match self {
            Self::Mc => Some(0.0),
            Self::Ic => Some(PI),
            Self::Rise | Self::Set => None,
        }
    }

    /// Sign applied to the horizon hour angle: -1 rising, +1 setting, 0 meridian.
    pub const fn horizon_sign(self) -> f64 {
        match self {
            Self::Rise => -1.0,
            Self::Set => 1.0,
            Self::Mc | Self::Ic => 0.0,
        }
    }

    /// Signed hour angle of this event for a body at `declination` seen from
    /// `latitude`. `None` when a horizon event does not occur there.
    pub fn hour_angle_at(self, declination: f64, latitude: f64) -> Option<f64> {
        match self {
            Self::Mc => Some(0.0),
            Self::Ic => Some(PI),
            Self::Rise | Self::Set => geometric_horizon_hour_angle(declination, latitude)
                .map(|h| self.horizon_sign() * h),
        }
    }

    /// Signed hour angle with the horizon argument clipped, always finite.
    pub fn clipped_hour_angle_at(self, declination: f64, latitude: f64) -> f64 {
        match self {
            Self::Mc => 0.0,
            Self::Ic => PI,
            Self::Rise | Self::Set => {
                self.horizon_sign() * clipped_horizon_hour_angle(declination, latitude)
            }
        }
    }
}

impl std::fmt::Display for AcgEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Classification of an (event_a, event_b) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParanPairType {
    /// Body A on the meridian, body B on the horizon.
    MeridianHorizon,
    /// Body A on the horizon, body B on the meridian.
    HorizonMeridian,
    /// Both on the meridian: latitude-independent, degenerate.
    MeridianMeridian,
    /// Both on the horizon: transcendental, solved numerically.
    HorizonHorizon,
}

impl ParanPairType {
    /// Classify an event combination.
    pub const fn classify(event_a: AcgEventType, event_b: AcgEventType) -> Self {
        match (event_a.is_meridian(), event_b.is_meridian()) {
            (true, false) => Self::MeridianHorizon,
            (false, true) => Self::HorizonMeridian,
            (true, true) => Self::MeridianMeridian,
            (false, false) => Self::HorizonHorizon,
        }
    }

    /// Whether this pair type has an analytic solution.
    pub const fn is_closed_form(self) -> bool {
        !matches!(self, Self::HorizonHorizon)
    }
}

/// How a line was solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalculationMethod {
    ClosedForm,
    Numerical,
    Failed,
}

/// Sense in which hour angles are counted when imposing simultaneity.
///
/// `Western` counts hour angle westward from the meridian (`LST = alpha + H`),
/// `Eastern` counts it eastward (`LST = alpha - H`). Both are searched; the
/// side that satisfied simultaneity is recorded on each point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HorizonSide {
    Eastern,
    Western,
}

impl HorizonSide {
    pub const BOTH: [HorizonSide; 2] = [Self::Eastern, Self::Western];

    /// Multiplier on H in `LST = alpha + sign * H`.
    pub const fn sidereal_sign(self) -> f64 {
        match self {
            Self::Eastern => -1.0,
            Self::Western => 1.0,
        }
    }
}

/// Lifecycle of a line within one calculation pass.
///
/// `Pending -> Solved | Failed`, then optionally `Solved -> FilteredOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineStatus {
    Pending,
    Solved,
    Failed,
    FilteredOut,
}

impl LineStatus {
    /// Whether moving from `self` to `next` is a forward transition.
    pub const fn can_transition_to(self, next: LineStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Solved)
                | (Self::Pending, Self::Failed)
                | (Self::Solved, Self::FilteredOut)
        )
    }
}

/// One solution point of a paran line.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParanPoint {
    /// Geographic location.
    pub point: GeographicPoint,
    /// Hour-angle sense that satisfied simultaneity.
    pub side: HorizonSide,
    /// Absolute simultaneity residual at the point, radians.
    pub residual_rad: f64,
}

/// A paran line: one body pair and one event combination.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParanLine {
    pub planet_a: String,
    pub event_a: AcgEventType,
    pub planet_b: String,
    pub event_b: AcgEventType,
    /// Latitude of the first solution point; meaningless when not valid.
    pub latitude_deg: f64,
    pub method: CalculationMethod,
    /// Estimated latitude uncertainty of the solution, degrees.
    pub precision_achieved_deg: f64,
    pub is_valid: bool,
    pub failure_reason: Option<FailureKind>,
    /// Whether the inputs lay inside the solver's mathematical domain.
    pub domain_valid: bool,
    pub convergence_iterations: Option<u32>,
    /// Equatorial snapshot of body A.
    pub coords_a: SphericalCoordinates,
    /// Equatorial snapshot of body B.
    pub coords_b: SphericalCoordinates,
    /// Epoch of the positions, Julian Day.
    pub epoch_jd: f64,
    /// Solution points sorted by (latitude, longitude).
    pub points: Vec<ParanPoint>,
    /// True for meridian-meridian lines: `points` is a representative
    /// latitude sample of a line that holds at every latitude.
    pub sampled_continuum: bool,
    pub status: LineStatus,
}

impl ParanLine {
    /// Create a pending line.
    pub fn new(
        planet_a: impl Into<String>,
        event_a: AcgEventType,
        coords_a: SphericalCoordinates,
        planet_b: impl Into<String>,
        event_b: AcgEventType,
        coords_b: SphericalCoordinates,
        epoch_jd: f64,
    ) -> Self {
        Self {
            planet_a: planet_a.into(),
            event_a,
            planet_b: planet_b.into(),
            event_b,
            latitude_deg: f64::NAN,
            method: CalculationMethod::Failed,
            precision_achieved_deg: f64::NAN,
            is_valid: false,
            failure_reason: None,
            domain_valid: true,
            convergence_iterations: None,
            coords_a,
            coords_b,
            epoch_jd,
            points: Vec::new(),
            sampled_continuum: false,
            status: LineStatus::Pending,
        }
    }

    /// Pair classification of this line's events.
    pub fn pair_type(&self) -> ParanPairType {
        ParanPairType::classify(self.event_a, self.event_b)
    }

    /// Record a solver success. Points must be non-empty.
    pub(crate) fn mark_solved(
        &mut self,
        points: Vec<ParanPoint>,
        method: CalculationMethod,
        precision_deg: f64,
        iterations: Option<u32>,
    ) {
        debug_assert!(self.status.can_transition_to(LineStatus::Solved));
        debug_assert!(!points.is_empty());
        self.latitude_deg = points.first().map_or(f64::NAN, |p| p.point.latitude_deg);
        self.points = points;
        self.method = method;
        self.precision_achieved_deg = precision_deg;
        self.convergence_iterations = iterations;
        self.is_valid = true;
        self.domain_valid = true;
        self.failure_reason = None;
        self.status = LineStatus::Solved;
    }

    /// Record a solver failure.
    pub(crate) fn mark_failed(&mut self, reason: FailureKind, domain_valid: bool) {
        debug_assert!(self.status.can_transition_to(LineStatus::Failed));
        self.method = CalculationMethod::Failed;
        self.is_valid = false;
        self.failure_reason = Some(reason);
        self.domain_valid = domain_valid;
        self.latitude_deg = f64::NAN;
        self.points.clear();
        self.status = LineStatus::Failed;
    }

    /// Replace the points after visibility filtering. An empty survivor set
    /// moves the line to `FilteredOut`.
    pub(crate) fn apply_filter(&mut self, survivors: Vec<ParanPoint>) {
        if self.status != LineStatus::Solved {
            return;
        }
        if survivors.is_empty() {
            self.is_valid = false;
            self.failure_reason = Some(FailureKind::FailedVisibilityFilter);
            self.points.clear();
            self.status = LineStatus::FilteredOut;
        } else {
            self.latitude_deg = survivors[0].point.latitude_deg;
            self.points = survivors;
        }
    }

    /// Short label like `Sun R / Moon MC`.
    pub fn label(&self) -> String {
        format!(
            "{} {} / {} {}",
            self.planet_a, self.event_a, self.planet_b, self.event_b
        )
    }
}

/// Number of lines per solving method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodCounts {
    pub closed_form: usize,
    pub numerical: usize,
    pub failed: usize,
}

/// Wall-clock performance of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerformanceMetrics {
    pub total_time_ms: f64,
    /// Batch finished under the 800 ms soft target.
    pub meets_800ms_target: bool,
    /// Average achieved precision at or below 0.03 deg.
    pub meets_precision_standard: bool,
}

/// Non-gating diagnostic summary of a solution set.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualityReport {
    pub solution_count: usize,
    /// Max minus min latitude over all solution points, degrees.
    pub latitude_spread_deg: f64,
    /// Fraction of points poleward of the polar circles.
    pub extreme_latitude_fraction: f64,
    /// 1.0 for a clean set, decreasing with extreme-latitude share.
    pub score: f64,
}

/// Aggregate outcome of one `calculate` call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParanResult {
    /// Lines in configuration order (pair order, then event order).
    pub lines: Vec<ParanLine>,
    pub method_counts: MethodCounts,
    /// Valid lines over all emitted lines, [0, 1].
    pub success_rate: f64,
    /// Mean achieved precision over valid lines, degrees. NaN when none.
    pub average_precision_deg: f64,
    pub performance: PerformanceMetrics,
    /// Root-finder counters for this batch only.
    pub solver_statistics: RootFinderStats,
    pub quality: QualityReport,
    /// Points the independent validator could not confirm.
    pub validation_rejections: usize,
}

impl ParanResult {
    /// Lines that survived solving and filtering.
    pub fn valid_lines(&self) -> impl Iterator<Item = &ParanLine> {
        self.lines.iter().filter(|l| l.is_valid)
    }

    /// `(line index, reason)` for every invalid line.
    pub fn failures(&self) -> Vec<(usize, FailureKind)> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.failure_reason.map(|r| (i, r)))
            .collect()
    }

    /// Number of lines solved with `method`.
    pub fn method_count(&self, method: CalculationMethod) -> usize {
        match method {
            CalculationMethod::ClosedForm => self.method_counts.closed_form,
            CalculationMethod::Numerical => self.method_counts.numerical,
            CalculationMethod::Failed => self.method_counts.failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_line() -> ParanLine {
        ParanLine::new(
            "Sun",
            AcgEventType::Mc,
            SphericalCoordinates::from_degrees(0.0, 0.0),
            "Moon",
            AcgEventType::Rise,
            SphericalCoordinates::from_degrees(30.0, 10.0),
            2_460_000.5,
        )
    }

    fn point(lat: f64) -> ParanPoint {
        ParanPoint {
            point: GeographicPoint::new(lat, 0.0),
            side: HorizonSide::Western,
            residual_rad: 0.0,
        }
    }

    #[test]
    fn classify_pairs() {
        use AcgEventType::*;
        assert_eq!(ParanPairType::classify(Mc, Rise), ParanPairType::MeridianHorizon);
        assert_eq!(ParanPairType::classify(Set, Ic), ParanPairType::HorizonMeridian);
        assert_eq!(ParanPairType::classify(Ic, Mc), ParanPairType::MeridianMeridian);
        assert_eq!(ParanPairType::classify(Rise, Set), ParanPairType::HorizonHorizon);
    }

    #[test]
    fn meridian_hour_angles() {
        assert_eq!(AcgEventType::Mc.meridian_hour_angle(), Some(0.0));
        assert_eq!(AcgEventType::Ic.meridian_hour_angle(), Some(PI));
        assert_eq!(AcgEventType::Rise.meridian_hour_angle(), None);
    }

    #[test]
    fn rise_negative_set_positive() {
        let dec = 10.0_f64.to_radians();
        let lat = 40.0_f64.to_radians();
        let r = AcgEventType::Rise.hour_angle_at(dec, lat).unwrap();
        let s = AcgEventType::Set.hour_angle_at(dec, lat).unwrap();
        assert!(r < 0.0 && s > 0.0);
        assert!((r + s).abs() < 1e-12);
    }

    #[test]
    fn horizon_event_absent_for_circumpolar() {
        let dec = 75.0_f64.to_radians();
        let lat = 50.0_f64.to_radians();
        assert!(AcgEventType::Rise.hour_angle_at(dec, lat).is_none());
        assert!(AcgEventType::Set.clipped_hour_angle_at(dec, lat).is_finite());
    }

    #[test]
    fn status_transitions_forward_only() {
        assert!(LineStatus::Pending.can_transition_to(LineStatus::Solved));
        assert!(LineStatus::Pending.can_transition_to(LineStatus::Failed));
        assert!(LineStatus::Solved.can_transition_to(LineStatus::FilteredOut));
        assert!(!LineStatus::Failed.can_transition_to(LineStatus::Solved));
        assert!(!LineStatus::FilteredOut.can_transition_to(LineStatus::Solved));
        assert!(!LineStatus::Solved.can_transition_to(LineStatus::Pending));
    }

    #[test]
    fn failed_line_is_invalid() {
        let mut line = pending_line();
        line.mark_failed(FailureKind::BracketNotFound, true);
        assert_eq!(line.method, CalculationMethod::Failed);
        assert!(!line.is_valid);
        assert!(line.latitude_deg.is_nan());
        assert_eq!(line.status, LineStatus::Failed);
    }

    #[test]
    fn filter_to_empty_marks_filtered_out() {
        let mut line = pending_line();
        line.mark_solved(vec![point(10.0)], CalculationMethod::ClosedForm, 1e-3, None);
        assert!(line.is_valid);
        line.apply_filter(Vec::new());
        assert_eq!(line.status, LineStatus::FilteredOut);
        assert_eq!(line.failure_reason, Some(FailureKind::FailedVisibilityFilter));
        assert!(!line.is_valid);
    }

    #[test]
    fn filter_keeps_survivors() {
        let mut line = pending_line();
        line.mark_solved(
            vec![point(-5.0), point(10.0)],
            CalculationMethod::Numerical,
            1e-6,
            Some(12),
        );
        line.apply_filter(vec![point(10.0)]);
        assert_eq!(line.status, LineStatus::Solved);
        assert!((line.latitude_deg - 10.0).abs() < 1e-12);
    }

    #[test]
    fn label_format() {
        assert_eq!(pending_line().label(), "Sun MC / Moon R");
    }
}
