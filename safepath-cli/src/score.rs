//! Score command implementation for the SafePath CLI.

use std::io::Write;

use clap::{Parser, ValueEnum};
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use safepath_engine::{ScoreCalculator, ScoreOptions};
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use crate::output::write_json;
use crate::providers::{ProviderBuilder, ReputationSettings};
use crate::{
    ARG_DETAIL, ARG_LAT, ARG_LNG, ARG_REPUTATION_API_KEY, ARG_REPUTATION_BASE_URL, CliError,
    ENV_SCORE_LAT, ENV_SCORE_LNG,
};

/// How much of the score to compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum DetailArg {
    /// Overall score, confidence, and alert level.
    #[default]
    Basic,
    /// Adds the factor breakdown, recommendations, and trend.
    Full,
}

impl DetailArg {
    const fn options(self) -> ScoreOptions {
        match self {
            Self::Basic => ScoreOptions::basic(),
            Self::Full => ScoreOptions::full(),
        }
    }
}

/// CLI arguments for the `score` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Score how safe a single point is right now. Area \
                 reputation comes from the configured reputation service; \
                 without one the score falls back to local heuristics with \
                 reduced confidence.",
    about = "Score the safety of a single point"
)]
#[ortho_config(prefix = "SAFEPATH")]
pub(crate) struct ScoreArgs {
    /// Latitude in decimal degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude in decimal degrees.
    #[arg(long = ARG_LNG, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lng: Option<f64>,
    /// Level of detail to compute.
    #[arg(long = ARG_DETAIL, value_enum, value_name = "level")]
    #[serde(default)]
    pub(crate) detail: Option<DetailArg>,
    /// Base URL of the area reputation service.
    #[arg(long = ARG_REPUTATION_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) reputation_base_url: Option<String>,
    /// Bearer token for the area reputation service.
    #[arg(long = ARG_REPUTATION_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) reputation_api_key: Option<String>,
}

impl ScoreArgs {
    pub(crate) fn into_settings(self) -> Result<ScoreSettings, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreSettings::try_from(merged)
    }
}

/// Resolved `score` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreSettings {
    pub(crate) point: Coord<f64>,
    pub(crate) options: ScoreOptions,
    pub(crate) reputation: ReputationSettings,
}

impl TryFrom<ScoreArgs> for ScoreSettings {
    type Error = CliError;

    fn try_from(args: ScoreArgs) -> Result<Self, Self::Error> {
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_SCORE_LAT,
        })?;
        let lng = args.lng.ok_or(CliError::MissingArgument {
            field: ARG_LNG,
            env: ENV_SCORE_LNG,
        })?;
        Ok(Self {
            point: Coord { x: lng, y: lat },
            options: args.detail.unwrap_or_default().options(),
            reputation: ReputationSettings {
                base_url: args.reputation_base_url,
                api_key: args.reputation_api_key,
            },
        })
    }
}

pub(crate) fn run_score_with(
    args: ScoreArgs,
    runtime: &Runtime,
    builder: &dyn ProviderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let settings = args.into_settings()?;
    execute_score(&settings, runtime, builder, writer)
}

pub(crate) fn execute_score(
    settings: &ScoreSettings,
    runtime: &Runtime,
    builder: &dyn ProviderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let calculator = ScoreCalculator::new(builder.reputation(&settings.reputation)?);
    let score = runtime.block_on(calculator.score(settings.point, settings.options))?;
    write_json(writer, &score)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ScoreSettings, CliError> {
    let merged = ScoreArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ScoreSettings::try_from(merged)
}
