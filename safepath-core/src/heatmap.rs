//! Heatmap sample points and their visual encoding.

use chrono::{DateTime, FixedOffset};
use geo::Coord;

/// Lightest weight a point can carry; keeps safe areas faintly visible.
pub const MIN_WEIGHT: f64 = 0.1;

/// Heaviest weight a point can carry.
pub const MAX_WEIGHT: f64 = 1.0;

/// Visual weight for a safety score: `clamp((100 - score) / 100, 0.1, 1.0)`.
///
/// # Examples
///
/// ```
/// use safepath_core::heatmap_weight;
///
/// assert_eq!(heatmap_weight(25.0), 0.75);
/// assert_eq!(heatmap_weight(95.0), 0.1);
/// ```
#[must_use]
pub fn heatmap_weight(safety_score: f64) -> f64 {
    ((100.0 - safety_score) / 100.0).clamp(MIN_WEIGHT, MAX_WEIGHT)
}

/// Scale a weight for the current zoom so sparse, zoomed-out grids still
/// read clearly and dense, zoomed-in grids do not saturate.
#[must_use]
pub fn zoom_adjusted_intensity(weight: f64, zoom: f64) -> f64 {
    let factor = (zoom / 15.0).clamp(0.6, 1.4);
    (weight * factor).clamp(0.0, 1.0)
}

/// Colour band a score falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HeatColor {
    /// Score of 80 or more.
    Green,
    /// Score of 60 up to 80.
    Yellow,
    /// Score of 40 up to 60.
    Orange,
    /// Score below 40.
    Red,
}

impl HeatColor {
    /// Band a score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Green
        } else if score >= 60.0 {
            Self::Yellow
        } else if score >= 40.0 {
            Self::Orange
        } else {
            Self::Red
        }
    }

    /// CSS hex colour for the band.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Green => "#22c55e",
            Self::Yellow => "#eab308",
            Self::Orange => "#f97316",
            Self::Red => "#ef4444",
        }
    }
}

/// A sampled point carrying a visualisation weight.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeatmapPoint {
    /// Sampled coordinate.
    pub point: Coord<f64>,
    /// Visual weight derived from the score.
    pub weight: f64,
    /// Zoom-adjusted weight used for rendering.
    pub intensity: f64,
    /// Colour band of the score.
    pub color: HeatColor,
    /// Score the point was sampled at.
    pub safety_score: f64,
    /// When the score was last (re)computed.
    pub last_update: DateTime<FixedOffset>,
}

impl HeatmapPoint {
    /// Build a point with weight, intensity and colour derived from `score`.
    #[must_use]
    pub fn new(point: Coord<f64>, score: f64, zoom: f64, at: DateTime<FixedOffset>) -> Self {
        let weight = heatmap_weight(score);
        Self {
            point,
            weight,
            intensity: zoom_adjusted_intensity(weight, zoom),
            color: HeatColor::from_score(score),
            safety_score: score,
            last_update: at,
        }
    }

    /// Replace the score in place, re-deriving everything that depends on it.
    pub fn rescore(&mut self, score: f64, zoom: f64, at: DateTime<FixedOffset>) {
        *self = Self::new(self.point, score, zoom, at);
    }
}

/// Device capability used to size adaptive grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PerformanceTier {
    /// Constrained devices: sparser grids.
    Low,
    /// Baseline.
    #[default]
    Medium,
    /// Capable devices: denser grids.
    High,
}

impl PerformanceTier {
    /// Multiplier applied to the grid spacing.
    #[must_use]
    pub const fn spacing_multiplier(self) -> f64 {
        match self {
            Self::Low => 2.0,
            Self::Medium => 1.0,
            Self::High => 0.7,
        }
    }

    /// Multiplier applied to the point budget.
    #[must_use]
    pub const fn point_multiplier(self) -> f64 {
        match self {
            Self::Low => 0.5,
            Self::Medium => 1.0,
            Self::High => 1.5,
        }
    }
}
