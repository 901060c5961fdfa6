//! Core domain types for the SafePath engine.
//!
//! This crate holds the data model shared by the scoring, heatmap, routing
//! and overlay services, the traits for their external collaborators, and
//! the small pieces of infrastructure they all lean on: a TTL cache, a
//! clock, a timer scheduler and a subscriber registry.
//!
//! Coordinates are [`geo::Coord<f64>`] with `x` as longitude and `y` as
//! latitude throughout.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cache;
pub mod clock;
pub mod error;
pub mod geodesy;
pub mod heatmap;
pub mod observe;
pub mod providers;
pub mod route;
pub mod scheduler;
pub mod score;
pub mod surface;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use cache::{CoordKey, KEY_PRECISION_DECIMALS, TtlCache};
pub use clock::{Clock, SystemClock, time_bucket};
pub use error::{InputError, ProviderError, ScoreError};
pub use geodesy::{
    Bounds, EARTH_RADIUS_M, METRES_PER_DEGREE_LAT, great_circle_distance, interpolate,
    offset_metres, validate_coord,
};
pub use heatmap::{
    HeatColor, HeatmapPoint, MAX_WEIGHT, MIN_WEIGHT, PerformanceTier, heatmap_weight,
    zoom_adjusted_intensity,
};
pub use observe::{Callback, Subscribers, Subscription};
pub use providers::{
    AreaFactors, AreaReport, DirectionsRequest, FeatureFlags, LightingQuality, ProviderRoute,
    ProviderStep, ReputationProvider, RoutingProvider, StaticFeatureFlags,
    UnavailableReputationProvider, WeatherCondition,
};
pub use route::{RouteCandidate, RouteOptions, RouteSource, StepAnnotation, TravelMode};
pub use scheduler::{ScheduledTask, Scheduler, TimerHandle, TokioScheduler};
pub use score::{
    AlertLevel, DetailLevel, FactorBreakdown, MAX_RECOMMENDATIONS, NEUTRAL_SCORE, PreciseScore,
    SafetyScore, ScoreOptions, ScoreRange, ScoreSource, Trend, TrendDirection,
};
pub use surface::{
    HeatmapLayer, LayerId, ListenerId, MapSurface, Viewport, ViewportListener, WeightedPoint,
};
