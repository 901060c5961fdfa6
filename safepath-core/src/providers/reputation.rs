//! Area reputation provider and the report it returns.

use std::sync::Arc;

use async_trait::async_trait;
use geo::Coord;

use crate::ProviderError;

/// Street-lighting quality around a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LightingQuality {
    /// Continuous, bright lighting.
    Excellent,
    /// Well lit.
    Good,
    /// Patchy.
    Moderate,
    /// Mostly dark.
    Poor,
    /// No usable lighting.
    VeryPoor,
}

impl LightingQuality {
    /// Contribution of the lighting level to the time factor.
    #[must_use]
    pub const fn score_adjustment(self) -> f64 {
        match self {
            Self::Excellent => 20.0,
            Self::Good => 10.0,
            Self::Moderate => 0.0,
            Self::Poor => -15.0,
            Self::VeryPoor => -25.0,
        }
    }

    /// Report whether the lighting warrants a warning.
    #[must_use]
    pub const fn is_poor(self) -> bool {
        matches!(self, Self::Poor | Self::VeryPoor)
    }
}

/// Prevailing weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WeatherCondition {
    /// Dry and clear.
    Clear,
    /// Overcast.
    Cloudy,
    /// Rain.
    Rain,
    /// Fog or mist.
    Fog,
    /// Snow or ice.
    Snow,
    /// Thunderstorms or high wind.
    Storm,
}

impl WeatherCondition {
    /// Contribution of the weather to the environment factor.
    #[must_use]
    pub const fn score_adjustment(self) -> f64 {
        match self {
            Self::Clear => 10.0,
            Self::Cloudy => 5.0,
            Self::Rain => -5.0,
            Self::Fog => -10.0,
            Self::Snow => -10.0,
            Self::Storm => -20.0,
        }
    }
}

/// Local conditions reported alongside an area score.
///
/// Every field is optional; missing dimensions are estimated locally.
/// Percentages are on a `0..=100` scale.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AreaFactors {
    /// Street-lighting quality.
    pub lighting: Option<LightingQuality>,
    /// Current weather.
    pub weather: Option<WeatherCondition>,
    /// Population density percentile.
    pub population_density: Option<f64>,
    /// Share of nearby businesses currently open.
    pub business_activity: Option<f64>,
    /// Public transport availability.
    pub transit_access: Option<f64>,
    /// Expected emergency response time in minutes.
    pub emergency_response_minutes: Option<f64>,
    /// Historical crime rate percentile; higher is worse.
    pub crime_rate: Option<f64>,
    /// Community engagement level.
    pub community_engagement: Option<f64>,
    /// Signed impact of current events, `-100..=100`; positive is safer.
    pub current_events: Option<f64>,
    /// Traffic flow level.
    pub traffic_flow: Option<f64>,
    /// Crowd density level.
    pub crowd_density: Option<f64>,
}

impl AreaFactors {
    /// Number of dimensions the provider supplied.
    #[must_use]
    pub fn populated_dimensions(&self) -> usize {
        let numeric = [
            self.population_density,
            self.business_activity,
            self.transit_access,
            self.emergency_response_minutes,
            self.crime_rate,
            self.community_engagement,
            self.current_events,
            self.traffic_flow,
            self.crowd_density,
        ];
        numeric.iter().filter(|value| value.is_some()).count()
            + usize::from(self.lighting.is_some())
            + usize::from(self.weather.is_some())
    }
}

/// Reputation of the area around a point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaReport {
    /// Area score on a `0..=100` scale.
    pub score: f64,
    /// Provider confidence on a `0..=100` scale.
    pub confidence: f64,
    /// Local conditions, where known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub factors: AreaFactors,
    /// Free-text summary of the area.
    #[cfg_attr(feature = "serde", serde(default))]
    pub narrative: Option<String>,
}

/// Supplies an external reputation signal for an area.
#[async_trait]
pub trait ReputationProvider: Send + Sync {
    /// Analyse the area around `point`.
    async fn analyse(&self, point: Coord<f64>) -> Result<AreaReport, ProviderError>;
}

#[async_trait]
impl<T> ReputationProvider for Arc<T>
where
    T: ReputationProvider + ?Sized,
{
    async fn analyse(&self, point: Coord<f64>) -> Result<AreaReport, ProviderError> {
        (**self).analyse(point).await
    }
}

/// A provider that is never reachable.
///
/// Used when no reputation service is configured; scorers then rely on
/// their local heuristic alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableReputationProvider;

#[async_trait]
impl ReputationProvider for UnavailableReputationProvider {
    async fn analyse(&self, _point: Coord<f64>) -> Result<AreaReport, ProviderError> {
        Err(ProviderError::Unavailable {
            reason: "no reputation service configured".into(),
        })
    }
}
