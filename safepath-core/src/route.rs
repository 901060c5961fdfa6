//! Route planning requests and results.

use std::time::Duration;

use geo::Coord;

/// How the traveller moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TravelMode {
    /// On foot.
    #[default]
    Walking,
    /// By bicycle.
    Bicycling,
    /// By car.
    Driving,
    /// By public transport.
    Transit,
}

impl TravelMode {
    /// Average speed used when no routing provider is available, in m/s.
    #[must_use]
    pub const fn fallback_speed_mps(self) -> f64 {
        match self {
            Self::Walking => 1.4,
            Self::Bicycling => 4.2,
            Self::Driving => 13.9,
            Self::Transit => 8.3,
        }
    }

    /// Lowercase name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Bicycling => "bicycling",
            Self::Driving => "driving",
            Self::Transit => "transit",
        }
    }
}

impl std::str::FromStr for TravelMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "walking" | "walk" | "foot" => Ok(Self::Walking),
            "bicycling" | "cycling" | "bike" => Ok(Self::Bicycling),
            "driving" | "car" => Ok(Self::Driving),
            "transit" => Ok(Self::Transit),
            other => Err(format!("unknown travel mode '{other}'")),
        }
    }
}

/// Caller preferences for safe route planning.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteOptions {
    /// Relocate checkpoints that score below the minimum.
    pub avoid_danger_zones: bool,
    /// Threshold below which a sampled point counts as a danger zone.
    pub minimum_safety_score: f64,
    /// Let safety dominate distance when ranking candidates.
    pub prefer_safe_routes: bool,
    /// Travel mode passed to the routing provider.
    pub travel_mode: TravelMode,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            avoid_danger_zones: true,
            minimum_safety_score: 60.0,
            prefer_safe_routes: true,
            travel_mode: TravelMode::Walking,
        }
    }
}

/// Which planning path produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RouteSource {
    /// Direct origin-to-destination request.
    Direct,
    /// Request constrained through safety checkpoints.
    Waypoints,
    /// Synthesised straight line; no provider route was available.
    StraightLineFallback,
}

/// A step instruction annotated with the safety of its stretch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepAnnotation {
    /// Human-readable manoeuvre.
    pub instruction: String,
    /// Step length in metres.
    pub distance_m: f64,
    /// Step travel time.
    pub duration: Duration,
    /// Score mapped onto the step from the sampled geometry.
    pub safety_score: f64,
}

/// One complete route with derived safety statistics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteCandidate {
    /// Ordered geometry.
    pub path: Vec<Coord<f64>>,
    /// Length in metres.
    pub total_distance_m: f64,
    /// Expected travel time.
    pub total_duration: Duration,
    /// Mean of the sampled point scores.
    pub average_safety_score: f64,
    /// Checkpoints relocated away from low-scoring areas.
    pub danger_zones_avoided: usize,
    /// Sampled points still below the caller's minimum.
    pub danger_point_count: usize,
    /// Per-step instructions with safety annotations.
    pub steps: Vec<StepAnnotation>,
    /// Planning path that produced the candidate.
    pub source: RouteSource,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("walking", TravelMode::Walking)]
    #[case("BIKE", TravelMode::Bicycling)]
    #[case("car", TravelMode::Driving)]
    #[case("transit", TravelMode::Transit)]
    fn parses_travel_modes(#[case] raw: &str, #[case] expected: TravelMode) {
        assert_eq!(raw.parse::<TravelMode>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_travel_mode() {
        assert!("hovercraft".parse::<TravelMode>().is_err());
    }

    #[rstest]
    fn default_options_avoid_danger() {
        let options = RouteOptions::default();
        assert!(options.avoid_danger_zones);
        assert!(options.prefer_safe_routes);
        assert_eq!(options.travel_mode, TravelMode::Walking);
    }
}
