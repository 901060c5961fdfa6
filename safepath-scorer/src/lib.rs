//! Precise safety scoring for single coordinates.
//!
//! [`ScoreCalculator`] blends five factor families into a score on a
//! `0..=100` scale:
//! - **time**: daylight, weekday and street lighting;
//! - **environment**: weather and a population-density sweet spot;
//! - **location**: business activity, transit, emergency response, crime
//!   history and community engagement;
//! - **external**: the reputation provider's own score;
//! - **realtime** (on request): current events, traffic and crowds.
//!
//! Conditions the provider does not report are estimated deterministically
//! from the coordinate and the hour. The calculator implements
//! [`PreciseScore`](safepath_core::PreciseScore) so it can back the route
//! planner.

#![forbid(unsafe_code)]

mod advice;
mod calculator;
mod conditions;
mod config;
mod factors;

pub use calculator::ScoreCalculator;
pub use conditions::LocalConditions;
pub use config::{
    CONFIDENCE_PER_DIMENSION, DEFAULT_FALLBACK_CONFIDENCE, DEFAULT_SCORE_RANGE, DEFAULT_SCORE_TTL,
    FactorWeights, MAX_CONFIDENCE, ScoreConfig,
};
pub use factors::{BASE_SCORE, sweet_spot};
