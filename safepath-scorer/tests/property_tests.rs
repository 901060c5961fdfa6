//! Property-based tests for the score calculator.
//!
//! # Invariants tested
//!
//! - **Range:** every score for a valid coordinate lies in `10..=95`.
//! - **Alert level:** the alert level is a pure function of the score.
//! - **Confidence:** confidence never exceeds 95.

use std::sync::Arc;

use geo::Coord;
use proptest::prelude::*;
use safepath_core::test_support::{CountingReputationProvider, ManualClock};
use safepath_core::{
    AlertLevel, AreaFactors, AreaReport, DetailLevel, LightingQuality, ScoreOptions,
    WeatherCondition,
};
use safepath_scorer::ScoreCalculator;

fn lighting_strategy() -> impl Strategy<Value = Option<LightingQuality>> {
    prop_oneof![
        Just(None),
        Just(Some(LightingQuality::Excellent)),
        Just(Some(LightingQuality::Good)),
        Just(Some(LightingQuality::Moderate)),
        Just(Some(LightingQuality::Poor)),
        Just(Some(LightingQuality::VeryPoor)),
    ]
}

fn weather_strategy() -> impl Strategy<Value = Option<WeatherCondition>> {
    prop_oneof![
        Just(None),
        Just(Some(WeatherCondition::Clear)),
        Just(Some(WeatherCondition::Rain)),
        Just(Some(WeatherCondition::Storm)),
    ]
}

fn report_strategy() -> impl Strategy<Value = Option<AreaReport>> {
    let factors = (
        lighting_strategy(),
        weather_strategy(),
        proptest::option::of(-50.0_f64..150.0),
        proptest::option::of(0.0_f64..60.0),
        proptest::option::of(-200.0_f64..200.0),
        proptest::option::of(0.0_f64..100.0),
    )
        .prop_map(
            |(lighting, weather, crime_rate, emergency_response_minutes, current_events, crowd_density)| {
                AreaFactors {
                    lighting,
                    weather,
                    crime_rate,
                    emergency_response_minutes,
                    current_events,
                    crowd_density,
                    ..AreaFactors::default()
                }
            },
        );
    proptest::option::of((-20.0_f64..120.0, 0.0_f64..100.0, factors).prop_map(
        |(score, confidence, factors)| AreaReport {
            score,
            confidence,
            factors,
            narrative: None,
        },
    ))
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: any valid coordinate at any hour scores inside `10..=95`,
    /// with or without a provider.
    #[test]
    fn scores_stay_in_declared_range(
        lat in -90.0_f64..=90.0,
        lng in -180.0_f64..=180.0,
        hour in 0_u32..24,
        realtime in any::<bool>(),
        report in report_strategy(),
    ) {
        let provider = report.map_or_else(
            CountingReputationProvider::unavailable,
            CountingReputationProvider::with_report,
        );
        let clock = ManualClock::at_utc(2024, 5, 4, hour, 30);
        let calculator = ScoreCalculator::new(provider).with_clock(Arc::new(clock));
        let options = ScoreOptions {
            include_realtime: realtime,
            include_prediction: true,
            detail: DetailLevel::Detailed,
        };

        let score = block_on(calculator.score(Coord { x: lng, y: lat }, options))
            .expect("coordinate is valid");

        prop_assert!((10.0..=95.0).contains(&score.overall_score));
        prop_assert!((10.0..=95.0).contains(&score.trend.predicted_score_in_1h));
        prop_assert!((0.0..=100.0).contains(&score.trend.volatility));
        prop_assert!((0.0..=95.0).contains(&score.confidence));
        prop_assert_eq!(score.alert_level, AlertLevel::from_score(score.overall_score));
        prop_assert!(score.recommendations.len() <= 4);
    }
}
