//! Safety score model shared by the scoring, heatmap and routing crates.
//!
//! A [`SafetyScore`] is the output contract of any [`PreciseScore`]
//! implementation. Dependants only rely on this contract, never on how a
//! particular implementation derives its numbers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use geo::Coord;

use crate::ScoreError;

/// Inclusive range a score is clamped into.
///
/// Different consumers clamp to different ranges, so the range is data
/// rather than a constant baked into [`SafetyScore`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreRange {
    /// Lowest admissible score.
    pub min: f64,
    /// Highest admissible score.
    pub max: f64,
}

impl ScoreRange {
    /// Construct a range from its bounds.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range; non-finite values map to the minimum.
    ///
    /// # Examples
    ///
    /// ```
    /// use safepath_core::ScoreRange;
    ///
    /// let range = ScoreRange::new(10.0, 95.0);
    /// assert_eq!(range.clamp(120.0), 95.0);
    /// assert_eq!(range.clamp(f64::NAN), 10.0);
    /// ```
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Report whether `value` lies inside the range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Coarse classification of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AlertLevel {
    /// Score of 80 or more.
    Safe,
    /// Score of 60 up to 80.
    Caution,
    /// Score of 40 up to 60.
    Warning,
    /// Score below 40.
    Danger,
}

impl AlertLevel {
    /// Map a score onto its alert level.
    ///
    /// # Examples
    ///
    /// ```
    /// use safepath_core::AlertLevel;
    ///
    /// assert_eq!(AlertLevel::from_score(80.0), AlertLevel::Safe);
    /// assert_eq!(AlertLevel::from_score(79.9), AlertLevel::Caution);
    /// assert_eq!(AlertLevel::from_score(39.9), AlertLevel::Danger);
    /// ```
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Safe
        } else if score >= 60.0 {
            Self::Caution
        } else if score >= 40.0 {
            Self::Warning
        } else {
            Self::Danger
        }
    }

    /// Lowercase label used in serialised output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Caution => "caution",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// Direction a score is expected to move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TrendDirection {
    /// Conditions are getting better.
    Improving,
    /// No meaningful change expected.
    Stable,
    /// Conditions are getting worse.
    Declining,
}

/// Short-term forecast attached to a score.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trend {
    /// Expected direction of travel.
    pub direction: TrendDirection,
    /// Score expected one hour from now.
    pub predicted_score_in_1h: f64,
    /// How unsettled the estimate is, `0.0..=100.0`.
    pub volatility: f64,
}

impl Trend {
    /// A flat trend predicting no change.
    #[must_use]
    pub const fn stable(score: f64) -> Self {
        Self {
            direction: TrendDirection::Stable,
            predicted_score_in_1h: score,
            volatility: 0.0,
        }
    }
}

/// Weighted contribution of each factor family to the overall score.
///
/// Each field already has its family weight applied, so
/// `base + sum of fields` is the unclamped score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FactorBreakdown {
    /// Starting point before any factor is applied.
    pub base: f64,
    /// Time of day, day of week and lighting.
    pub time: f64,
    /// Weather and population density.
    pub environment: f64,
    /// Business activity, transit, emergency response, crime and community.
    pub location: f64,
    /// Area-reputation provider signal.
    pub external: f64,
    /// Current events, traffic and crowds; zero unless requested.
    pub realtime: f64,
}

impl FactorBreakdown {
    /// Sum of the base and all contributions, before clamping.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.base + self.time + self.environment + self.location + self.external + self.realtime
    }
}

/// Where the inputs for a score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScoreSource {
    /// The reputation provider answered and its signal was blended in.
    Provider,
    /// The provider was unavailable; only local estimates were used.
    LocalHeuristic,
}

/// A weighted multi-factor safety estimate for a single point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SafetyScore {
    /// Scored coordinate.
    pub point: Coord<f64>,
    /// Clamped overall score.
    pub overall_score: f64,
    /// Supporting-data confidence, `0.0..=95.0`.
    pub confidence: f64,
    /// Weighted factor contributions.
    pub factors: FactorBreakdown,
    /// Alert level derived from [`SafetyScore::overall_score`].
    pub alert_level: AlertLevel,
    /// At most four human-readable suggestions.
    pub recommendations: Vec<String>,
    /// Short-term forecast.
    pub trend: Trend,
    /// Inputs used.
    pub source: ScoreSource,
    /// Provider narrative, only kept for detailed requests.
    pub narrative: Option<String>,
    /// When the score was computed.
    pub computed_at: DateTime<FixedOffset>,
}

/// Maximum number of recommendations attached to a score.
pub const MAX_RECOMMENDATIONS: usize = 4;

/// Score assumed for a sample point whose scoring failed.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Amount of explanation requested from a scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DetailLevel {
    /// Score and alert level only; no recommendations.
    Basic,
    /// Adds recommendations.
    #[default]
    Standard,
    /// Adds the provider narrative.
    Detailed,
}

/// Flags accepted by [`PreciseScore::score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreOptions {
    /// Blend in current events, traffic and crowd signals.
    pub include_realtime: bool,
    /// Derive a trend rather than reporting a flat one.
    pub include_prediction: bool,
    /// How much explanation to attach.
    pub detail: DetailLevel,
}

impl ScoreOptions {
    /// Cheapest option set, used for bulk sampling along routes.
    #[must_use]
    pub const fn basic() -> Self {
        Self {
            include_realtime: false,
            include_prediction: false,
            detail: DetailLevel::Basic,
        }
    }

    /// Everything switched on.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            include_realtime: true,
            include_prediction: true,
            detail: DetailLevel::Detailed,
        }
    }
}

/// Precise, per-point scoring strategy.
///
/// Implementations may consult external providers and should cache. They
/// return [`ScoreError`] only when they cannot produce any estimate; callers
/// scoring in bulk substitute [`NEUTRAL_SCORE`] on failure.
#[async_trait]
pub trait PreciseScore: Send + Sync {
    /// Score `point` according to `options`.
    async fn score(
        &self,
        point: Coord<f64>,
        options: ScoreOptions,
    ) -> Result<SafetyScore, ScoreError>;
}

#[async_trait]
impl<T> PreciseScore for Arc<T>
where
    T: PreciseScore + ?Sized,
{
    async fn score(
        &self,
        point: Coord<f64>,
        options: ScoreOptions,
    ) -> Result<SafetyScore, ScoreError> {
        (**self).score(point, options).await
    }
}
