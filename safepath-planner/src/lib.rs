//! Risk-aware route planning.
//!
//! [`RoutePlanner`] samples checkpoints along the straight line between two
//! points, nudges low-scoring ones onto nearby safer ground, asks a
//! [`RoutingProvider`](safepath_core::RoutingProvider) for a direct route and
//! a route through the checkpoints, scores each candidate with a
//! [`PreciseScore`](safepath_core::PreciseScore) implementation and keeps the
//! best. When no provider route is available a straight-line estimate is
//! returned instead, so a well-formed request always yields a route.

#![forbid(unsafe_code)]

mod config;
mod geometry;
mod planner;
mod ranking;

pub use config::{
    DEFAULT_CHECKPOINT_COUNT, DEFAULT_FALLBACK_SAFETY, DEFAULT_MAX_WAYPOINTS,
    DEFAULT_RELOCATION_RADIUS_M, DEFAULT_SAFETY_MARGIN, DEFAULT_SAMPLE_POINTS, PlannerConfig,
};
pub use geometry::{
    RADIAL_DIRECTIONS, annotate_steps, checkpoint_positions, downsample, mean, radial_alternatives,
};
pub use planner::{CheckpointPlan, RoutePlanner};
pub use ranking::{challenger_wins, select_best};
