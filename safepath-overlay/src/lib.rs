//! Risk overlay lifecycle for a live map.
//!
//! [`OverlayController`] owns one overlay session: it generates heatmap
//! points for the visible viewport with a
//! [`safepath_heatmap::GridHeatmapGenerator`], keeps exactly one heat layer
//! attached to a [`safepath_core::MapSurface`], regenerates after the map
//! settles, and publishes an [`OverlaySessionState`] for the host UI.

#![forbid(unsafe_code)]

mod config;
mod controller;
mod error;
mod state;

pub use config::{
    DEFAULT_DEBOUNCE, DEFAULT_OPACITY, DEFAULT_UPDATE_INTERVAL, OverlayConfig, layer_radius_px,
};
pub use controller::OverlayController;
pub use error::OverlayError;
pub use state::{OverlaySessionState, coverage_description};

#[cfg(test)]
mod tests;
