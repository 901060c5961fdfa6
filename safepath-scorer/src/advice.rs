//! Recommendations and short-term trends attached to a score.

use safepath_core::{MAX_RECOMMENDATIONS, ScoreRange, Trend, TrendDirection};

use crate::conditions::{LocalConditions, is_night};

/// Threshold rules in priority order; the first four that match are kept.
#[must_use]
pub fn recommendations(score: f64, hour: u32, conditions: &LocalConditions) -> Vec<String> {
    let rules: [(bool, &str); 6] = [
        (
            score < 40.0,
            "Consider an alternative route or travel with company",
        ),
        (conditions.lighting.is_poor(), "Stick to well-lit streets"),
        (
            conditions.emergency_response_minutes > 10.0,
            "Emergency response is slow here; share your location with a trusted contact",
        ),
        (is_night(hour), "Stay on main roads and avoid shortcuts after dark"),
        (
            conditions.crowd_density > 80.0,
            "Keep valuables secure in crowded areas",
        ),
        (score >= 80.0, "Area looks safe; stay aware of your surroundings"),
    ];
    rules
        .into_iter()
        .filter(|(applies, _)| *applies)
        .map(|(_, text)| text.to_owned())
        .take(MAX_RECOMMENDATIONS)
        .collect()
}

/// Score change expected over the next hour from the day/night cycle.
#[must_use]
pub const fn transition_delta(hour: u32) -> f64 {
    match hour {
        17..=20 => -8.0,
        5..=6 => 6.0,
        _ => 0.0,
    }
}

/// Forecast the score one hour ahead from current events and the
/// day/night transition.
#[must_use]
pub fn forecast(
    score: f64,
    confidence: f64,
    hour: u32,
    conditions: &LocalConditions,
    range: ScoreRange,
) -> Trend {
    let events = conditions.current_events.clamp(-100.0, 100.0);
    let transition = transition_delta(hour);
    let delta = events * 0.05 + transition;
    let direction = if delta > 2.0 {
        TrendDirection::Improving
    } else if delta < -2.0 {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };
    let volatility =
        (events.abs() * 0.4 + transition.abs() * 2.0 + (95.0 - confidence).max(0.0) * 0.3)
            .clamp(0.0, 100.0);
    Trend {
        direction,
        predicted_score_in_1h: range.clamp(score + delta),
        volatility,
    }
}
