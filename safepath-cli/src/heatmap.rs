//! Heatmap command implementation for the SafePath CLI.

use std::io::Write;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use safepath_engine::{
    Bounds, GridHeatmapGenerator, HeatmapPoint, PerformanceTier, StaticFeatureFlags,
    TokioScheduler,
};
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use crate::output::write_json;
use crate::{
    ARG_EAST, ARG_GRID, ARG_NORTH, ARG_SOUTH, ARG_TIER, ARG_WEST, ARG_ZOOM, CliError,
    ENV_HEATMAP_EAST, ENV_HEATMAP_NORTH, ENV_HEATMAP_SOUTH, ENV_HEATMAP_WEST, ENV_HEATMAP_ZOOM,
};

/// Which grid to sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum GridArg {
    /// Full grid sized for the zoom level.
    #[default]
    Area,
    /// Coarse grid of at most 30 points.
    Preview,
    /// Grid spacing scaled by the device tier.
    Adaptive,
}

/// Device capability for adaptive grids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TierArg {
    Low,
    #[default]
    Medium,
    High,
}

impl From<TierArg> for PerformanceTier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Low => Self::Low,
            TierArg::Medium => Self::Medium,
            TierArg::High => Self::High,
        }
    }
}

/// CLI arguments for the `heatmap` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Sample a jittered grid of fast heuristic scores over a \
                 bounding box. Grid density follows the zoom level; the \
                 adaptive grid also scales with the device tier.",
    about = "Sample a risk heatmap over a bounding box"
)]
#[ortho_config(prefix = "SAFEPATH")]
pub(crate) struct HeatmapArgs {
    /// Northern edge in decimal degrees.
    #[arg(long = ARG_NORTH, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) north: Option<f64>,
    /// Southern edge in decimal degrees.
    #[arg(long = ARG_SOUTH, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) south: Option<f64>,
    /// Eastern edge in decimal degrees.
    #[arg(long = ARG_EAST, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) east: Option<f64>,
    /// Western edge in decimal degrees.
    #[arg(long = ARG_WEST, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) west: Option<f64>,
    /// Map zoom level the grid is sized for.
    #[arg(long = ARG_ZOOM, value_name = "level")]
    #[serde(default)]
    pub(crate) zoom: Option<f64>,
    /// Grid to sample.
    #[arg(long = ARG_GRID, value_enum, value_name = "grid")]
    #[serde(default)]
    pub(crate) grid: Option<GridArg>,
    /// Device tier for the adaptive grid.
    #[arg(long = ARG_TIER, value_enum, value_name = "tier")]
    #[serde(default)]
    pub(crate) tier: Option<TierArg>,
}

impl HeatmapArgs {
    pub(crate) fn into_settings(self) -> Result<HeatmapSettings, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        HeatmapSettings::try_from(merged)
    }
}

/// Resolved `heatmap` command configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HeatmapSettings {
    pub(crate) bounds: Bounds,
    pub(crate) zoom: f64,
    pub(crate) grid: GridArg,
    pub(crate) tier: PerformanceTier,
}

fn required(value: Option<f64>, field: &'static str, env: &'static str) -> Result<f64, CliError> {
    value.ok_or(CliError::MissingArgument { field, env })
}

impl TryFrom<HeatmapArgs> for HeatmapSettings {
    type Error = CliError;

    fn try_from(args: HeatmapArgs) -> Result<Self, Self::Error> {
        let north = required(args.north, ARG_NORTH, ENV_HEATMAP_NORTH)?;
        let south = required(args.south, ARG_SOUTH, ENV_HEATMAP_SOUTH)?;
        let east = required(args.east, ARG_EAST, ENV_HEATMAP_EAST)?;
        let west = required(args.west, ARG_WEST, ENV_HEATMAP_WEST)?;
        let zoom = required(args.zoom, ARG_ZOOM, ENV_HEATMAP_ZOOM)?;
        Ok(Self {
            bounds: Bounds::new(north, south, east, west)?,
            zoom,
            grid: args.grid.unwrap_or_default(),
            tier: args.tier.unwrap_or_default().into(),
        })
    }
}

pub(crate) fn run_heatmap_with(
    args: HeatmapArgs,
    runtime: &Runtime,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let settings = args.into_settings()?;
    let points = generate(&settings, runtime)?;
    write_json(writer, &points)
}

pub(crate) fn generate(
    settings: &HeatmapSettings,
    runtime: &Runtime,
) -> Result<Vec<HeatmapPoint>, CliError> {
    let generator = GridHeatmapGenerator::new(
        Arc::new(StaticFeatureFlags::new(true)),
        Arc::new(TokioScheduler::new(runtime.handle().clone())),
    );
    let HeatmapSettings {
        bounds,
        zoom,
        grid,
        tier,
    } = *settings;
    let points = runtime.block_on(async {
        match grid {
            GridArg::Area => generator.generate_area(bounds, zoom).await,
            GridArg::Preview => generator.generate_quick_preview(bounds, zoom).await,
            GridArg::Adaptive => generator.generate_adaptive(bounds, zoom, tier).await,
        }
    })?;
    log::debug!("sampled {} heatmap points at zoom {zoom}", points.len());
    Ok(points)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<HeatmapSettings, CliError> {
    let merged = HeatmapArgs::merge_from_layers(layers).map_err(CliError::from)?;
    HeatmapSettings::try_from(merged)
}
