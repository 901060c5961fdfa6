//! Viewport risk heatmaps.
//!
//! [`GridHeatmapGenerator`] partitions a map viewport into a jittered grid
//! sized by zoom level and scores each cell with [`FastHeuristicScore`], a
//! deterministic per-point heuristic cheap enough to run on every viewport
//! change. Jitter is drawn from a `ChaCha8Rng` seeded from the viewport and
//! the current time bucket, so repeated requests inside one window produce
//! the same grid.

#![forbid(unsafe_code)]

mod config;
mod fast;
mod generator;
mod grid;

pub use config::{
    DEFAULT_AREA_TTL, DEFAULT_HEATMAP_RANGE, DEFAULT_JITTER_FRACTION, DEFAULT_TIME_BUCKET,
    HeatmapConfig, PREVIEW_POINT_CAP,
};
pub use fast::{AreaType, FastHeuristicScore, area_type};
pub use generator::{GridHeatmapGenerator, HeatmapStats, HeatmapUpdate, UpdateKind};
pub use grid::{Resolution, grid_shape, sample_points};
