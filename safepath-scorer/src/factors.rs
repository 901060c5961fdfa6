//! Raw factor-family values, each roughly centred on zero.
//!
//! [`crate::ScoreCalculator`] multiplies every value by its family weight
//! and adds the results to a base of 50.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Weekday};

use crate::conditions::{LocalConditions, is_daytime, is_night};

/// Starting score before any factor applies.
pub const BASE_SCORE: f64 = 50.0;

/// Peaked response: `peak` at `ideal`, falling linearly to zero at
/// `ideal ± width` and continuing below zero beyond it, floored at `-peak`.
///
/// Used for quantities where both too little and too much are unsafe.
#[must_use]
pub fn sweet_spot(value: f64, ideal: f64, width: f64, peak: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    (peak * (1.0 - (value - ideal).abs() / width)).clamp(-peak, peak)
}

/// Daylight and weekday bonuses plus the lighting term.
#[must_use]
pub fn time_factor(at: DateTime<FixedOffset>, conditions: &LocalConditions) -> f64 {
    let hour = at.hour();
    let daylight = if is_daytime(hour) {
        20.0
    } else if is_night(hour) {
        -25.0
    } else {
        0.0
    };
    let weekday = if matches!(at.weekday(), Weekday::Sat | Weekday::Sun) {
        0.0
    } else {
        5.0
    };
    daylight + weekday + conditions.lighting.score_adjustment()
}

/// Weather plus a population-density sweet spot around the 60th percentile.
#[must_use]
pub fn environment_factor(conditions: &LocalConditions) -> f64 {
    conditions.weather.score_adjustment() + sweet_spot(conditions.population_density, 60.0, 40.0, 20.0)
}

/// Business activity, transit, emergency response, inverted crime rate and
/// community engagement, re-centred on zero.
#[must_use]
pub fn location_factor(conditions: &LocalConditions) -> f64 {
    let business = conditions.business_activity.clamp(0.0, 100.0) * 0.2;
    let transit = conditions.transit_access.clamp(0.0, 100.0) * 0.1;
    let response = ((10.0 - conditions.emergency_response_minutes) * 2.0).clamp(-20.0, 10.0);
    let safety_record = (50.0 - conditions.crime_rate.clamp(0.0, 100.0)) * 0.4;
    let community = conditions.community_engagement.clamp(0.0, 100.0) * 0.1;
    business + transit + response + safety_record + community - 20.0
}

/// Reputation score re-centred on zero.
#[must_use]
pub fn external_signal(provider_score: Option<f64>) -> f64 {
    provider_score
        .filter(|score| score.is_finite())
        .map_or(0.0, |score| score.clamp(0.0, 100.0) - BASE_SCORE)
}

/// Current events plus traffic-flow and crowd-density sweet spots.
#[must_use]
pub fn realtime_factor(conditions: &LocalConditions) -> f64 {
    conditions.current_events.clamp(-100.0, 100.0) * 0.3
        + sweet_spot(conditions.traffic_flow, 50.0, 50.0, 15.0)
        + sweet_spot(conditions.crowd_density, 40.0, 40.0, 15.0)
}
