//! Command-line interface for the SafePath safety engine.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;

mod error;
mod heatmap;
mod output;
mod providers;
mod route;
mod score;

pub use error::CliError;

use heatmap::{HeatmapArgs, run_heatmap_with};
use providers::{DefaultProviderBuilder, ProviderBuilder};
use route::{RouteArgs, run_route_with};
use score::{ScoreArgs, run_score_with};

pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LNG: &str = "lng";
pub(crate) const ARG_DETAIL: &str = "detail";
pub(crate) const ARG_NORTH: &str = "north";
pub(crate) const ARG_SOUTH: &str = "south";
pub(crate) const ARG_EAST: &str = "east";
pub(crate) const ARG_WEST: &str = "west";
pub(crate) const ARG_ZOOM: &str = "zoom";
pub(crate) const ARG_GRID: &str = "grid";
pub(crate) const ARG_TIER: &str = "tier";
pub(crate) const ARG_ORIGIN_LAT: &str = "origin-lat";
pub(crate) const ARG_ORIGIN_LNG: &str = "origin-lng";
pub(crate) const ARG_DESTINATION_LAT: &str = "destination-lat";
pub(crate) const ARG_DESTINATION_LNG: &str = "destination-lng";
pub(crate) const ARG_MODE: &str = "mode";
pub(crate) const ARG_MIN_SAFETY: &str = "min-safety";
pub(crate) const ARG_AVOID_DANGER_ZONES: &str = "avoid-danger-zones";
pub(crate) const ARG_PREFER_SAFE_ROUTES: &str = "prefer-safe-routes";
pub(crate) const ARG_OSRM_BASE_URL: &str = "osrm-base-url";
pub(crate) const ARG_REPUTATION_BASE_URL: &str = "reputation-base-url";
pub(crate) const ARG_REPUTATION_API_KEY: &str = "reputation-api-key";

pub(crate) const ENV_SCORE_LAT: &str = "SAFEPATH_CMDS_SCORE_LAT";
pub(crate) const ENV_SCORE_LNG: &str = "SAFEPATH_CMDS_SCORE_LNG";
pub(crate) const ENV_HEATMAP_NORTH: &str = "SAFEPATH_CMDS_HEATMAP_NORTH";
pub(crate) const ENV_HEATMAP_SOUTH: &str = "SAFEPATH_CMDS_HEATMAP_SOUTH";
pub(crate) const ENV_HEATMAP_EAST: &str = "SAFEPATH_CMDS_HEATMAP_EAST";
pub(crate) const ENV_HEATMAP_WEST: &str = "SAFEPATH_CMDS_HEATMAP_WEST";
pub(crate) const ENV_HEATMAP_ZOOM: &str = "SAFEPATH_CMDS_HEATMAP_ZOOM";
pub(crate) const ENV_ROUTE_ORIGIN_LAT: &str = "SAFEPATH_CMDS_ROUTE_ORIGIN_LAT";
pub(crate) const ENV_ROUTE_ORIGIN_LNG: &str = "SAFEPATH_CMDS_ROUTE_ORIGIN_LNG";
pub(crate) const ENV_ROUTE_DESTINATION_LAT: &str = "SAFEPATH_CMDS_ROUTE_DESTINATION_LAT";
pub(crate) const ENV_ROUTE_DESTINATION_LNG: &str = "SAFEPATH_CMDS_ROUTE_DESTINATION_LNG";

/// Run the SafePath CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let runtime = build_runtime()?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &runtime, &DefaultProviderBuilder, &mut stdout)
}

fn build_runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

fn dispatch(
    command: Command,
    runtime: &Runtime,
    builder: &dyn ProviderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Score(args) => run_score_with(args, runtime, builder, writer),
        Command::Heatmap(args) => run_heatmap_with(args, runtime, writer),
        Command::Route(args) => run_route_with(args, runtime, builder, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "safepath",
    about = "Safety scores, risk heatmaps, and safer routes from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score the safety of a single point.
    Score(ScoreArgs),
    /// Sample a risk heatmap over a bounding box.
    Heatmap(HeatmapArgs),
    /// Plan a route that steers around low-scoring areas.
    Route(RouteArgs),
}

#[cfg(test)]
mod tests;
