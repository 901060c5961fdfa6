//! Route command implementation for the SafePath CLI.

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use safepath_engine::{
    RouteCandidate, RouteOptions, SafetyEngine, StaticFeatureFlags, TokioScheduler, TravelMode,
};
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use crate::output::write_json;
use crate::providers::{ProviderBuilder, ReputationSettings, default_osrm_base_url};
use crate::{
    ARG_AVOID_DANGER_ZONES, ARG_DESTINATION_LAT, ARG_DESTINATION_LNG, ARG_MIN_SAFETY, ARG_MODE,
    ARG_ORIGIN_LAT, ARG_ORIGIN_LNG, ARG_OSRM_BASE_URL, ARG_PREFER_SAFE_ROUTES,
    ARG_REPUTATION_API_KEY, ARG_REPUTATION_BASE_URL, CliError, ENV_ROUTE_DESTINATION_LAT,
    ENV_ROUTE_DESTINATION_LNG, ENV_ROUTE_ORIGIN_LAT, ENV_ROUTE_ORIGIN_LNG,
};

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Plan a route between two points that steers around \
                 low-scoring areas. Candidate routes come from an OSRM \
                 instance; when none is reachable a straight-line estimate \
                 is returned instead.",
    about = "Plan a route that steers around low-scoring areas"
)]
#[ortho_config(prefix = "SAFEPATH")]
pub(crate) struct RouteArgs {
    /// Origin latitude in decimal degrees.
    #[arg(long = ARG_ORIGIN_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) origin_lat: Option<f64>,
    /// Origin longitude in decimal degrees.
    #[arg(long = ARG_ORIGIN_LNG, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) origin_lng: Option<f64>,
    /// Destination latitude in decimal degrees.
    #[arg(long = ARG_DESTINATION_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) destination_lat: Option<f64>,
    /// Destination longitude in decimal degrees.
    #[arg(long = ARG_DESTINATION_LNG, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) destination_lng: Option<f64>,
    /// Travel mode: walking, bicycling, driving, or transit.
    #[arg(long = ARG_MODE, value_name = "mode")]
    #[serde(default)]
    pub(crate) mode: Option<String>,
    /// Scores below this mark a danger zone (0-100, default 60).
    #[arg(long = ARG_MIN_SAFETY, value_name = "score")]
    #[serde(default)]
    pub(crate) min_safety: Option<f64>,
    /// Move checkpoints out of danger zones (default true).
    #[arg(long = ARG_AVOID_DANGER_ZONES, value_name = "bool")]
    #[serde(default)]
    pub(crate) avoid_danger_zones: Option<bool>,
    /// Let clearly safer routes beat shorter ones (default true).
    #[arg(long = ARG_PREFER_SAFE_ROUTES, value_name = "bool")]
    #[serde(default)]
    pub(crate) prefer_safe_routes: Option<bool>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// Base URL of the area reputation service.
    #[arg(long = ARG_REPUTATION_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) reputation_base_url: Option<String>,
    /// Bearer token for the area reputation service.
    #[arg(long = ARG_REPUTATION_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) reputation_api_key: Option<String>,
}

impl RouteArgs {
    pub(crate) fn into_settings(self) -> Result<RouteSettings, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RouteSettings::try_from(merged)
    }
}

/// Resolved `route` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteSettings {
    pub(crate) origin: Coord<f64>,
    pub(crate) destination: Coord<f64>,
    pub(crate) options: RouteOptions,
    pub(crate) osrm_base_url: String,
    pub(crate) reputation: ReputationSettings,
}

fn required(value: Option<f64>, field: &'static str, env: &'static str) -> Result<f64, CliError> {
    value.ok_or(CliError::MissingArgument { field, env })
}

fn parse_mode(mode: Option<String>) -> Result<TravelMode, CliError> {
    mode.map_or(Ok(TravelMode::default()), |value| {
        value
            .parse()
            .map_err(|reason| CliError::InvalidArgument {
                field: ARG_MODE,
                value,
                reason,
            })
    })
}

impl TryFrom<RouteArgs> for RouteSettings {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let origin = Coord {
            x: required(args.origin_lng, ARG_ORIGIN_LNG, ENV_ROUTE_ORIGIN_LNG)?,
            y: required(args.origin_lat, ARG_ORIGIN_LAT, ENV_ROUTE_ORIGIN_LAT)?,
        };
        let destination = Coord {
            x: required(
                args.destination_lng,
                ARG_DESTINATION_LNG,
                ENV_ROUTE_DESTINATION_LNG,
            )?,
            y: required(
                args.destination_lat,
                ARG_DESTINATION_LAT,
                ENV_ROUTE_DESTINATION_LAT,
            )?,
        };
        let defaults = RouteOptions::default();
        let options = RouteOptions {
            travel_mode: parse_mode(args.mode)?,
            minimum_safety_score: args.min_safety.unwrap_or(defaults.minimum_safety_score),
            avoid_danger_zones: args.avoid_danger_zones.unwrap_or(defaults.avoid_danger_zones),
            prefer_safe_routes: args.prefer_safe_routes.unwrap_or(defaults.prefer_safe_routes),
        };
        Ok(Self {
            origin,
            destination,
            options,
            osrm_base_url: args.osrm_base_url.unwrap_or_else(default_osrm_base_url),
            reputation: ReputationSettings {
                base_url: args.reputation_base_url,
                api_key: args.reputation_api_key,
            },
        })
    }
}

pub(crate) fn run_route_with(
    args: RouteArgs,
    runtime: &Runtime,
    builder: &dyn ProviderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let settings = args.into_settings()?;
    let route = plan(&settings, runtime, builder)?;
    write_json(writer, &route)
}

pub(crate) fn plan(
    settings: &RouteSettings,
    runtime: &Runtime,
    builder: &dyn ProviderBuilder,
) -> Result<RouteCandidate, CliError> {
    let engine = SafetyEngine::new(
        builder.reputation(&settings.reputation)?,
        builder.routing(&settings.osrm_base_url)?,
        Arc::new(StaticFeatureFlags::new(true)),
        Arc::new(TokioScheduler::new(runtime.handle().clone())),
    );
    let route = runtime.block_on(engine.plan_route(
        settings.origin,
        settings.destination,
        settings.options,
    ))?;
    log::debug!(
        "planned {:?} route of {:.0} m averaging {:.1}",
        route.source,
        route.total_distance_m,
        route.average_safety_score
    );
    Ok(route)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RouteSettings, CliError> {
    let merged = RouteArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RouteSettings::try_from(merged)
}
