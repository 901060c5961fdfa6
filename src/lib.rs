//! Facade crate for the SafePath safety engine.
//!
//! This crate re-exports the core domain types and the scoring, heatmap,
//! planning, and overlay components, and wires them together in
//! [`SafetyEngine`]. HTTP-backed providers are available behind the `http`
//! feature.

#![forbid(unsafe_code)]

mod engine;

pub use engine::{EngineConfig, SafetyEngine};

pub use safepath_core::{
    AlertLevel, Bounds, Clock, DetailLevel, DirectionsRequest, FactorBreakdown, FeatureFlags,
    HeatmapLayer, HeatmapPoint, InputError, MapSurface, PerformanceTier, PreciseScore,
    ProviderError, ProviderRoute, ReputationProvider, RouteCandidate, RouteOptions, RouteSource,
    RoutingProvider, SafetyScore, Scheduler, ScoreError, ScoreOptions, StaticFeatureFlags,
    StepAnnotation, SystemClock, TokioScheduler, TravelMode, UnavailableReputationProvider,
    Viewport,
};
pub use safepath_heatmap::{GridHeatmapGenerator, HeatmapConfig, HeatmapUpdate, UpdateKind};
pub use safepath_overlay::{OverlayConfig, OverlayController, OverlayError, OverlaySessionState};
pub use safepath_planner::{PlannerConfig, RoutePlanner};
pub use safepath_scorer::{ScoreCalculator, ScoreConfig};

#[cfg(feature = "http")]
pub use safepath_data::{
    HttpReputationProvider, HttpReputationProviderConfig, OsrmRoutingProvider,
    OsrmRoutingProviderConfig, ProviderBuildError,
};
