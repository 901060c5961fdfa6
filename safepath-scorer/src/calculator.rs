//! The precise, cache-first safety scorer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Timelike};
use geo::Coord;
use safepath_core::{
    AlertLevel, AreaReport, Clock, CoordKey, DetailLevel, FactorBreakdown, InputError,
    PreciseScore, ReputationProvider, SafetyScore, ScoreError, ScoreOptions, ScoreSource,
    SystemClock, Trend, TtlCache, validate_coord,
};

use crate::advice::{forecast, recommendations};
use crate::conditions::LocalConditions;
use crate::config::{CONFIDENCE_PER_DIMENSION, MAX_CONFIDENCE, ScoreConfig};
use crate::factors::{
    BASE_SCORE, environment_factor, external_signal, location_factor, realtime_factor, time_factor,
};

type CacheKey = (CoordKey, ScoreOptions);

/// Weighted multi-factor scorer backed by a reputation provider.
///
/// Results are cached per rounded coordinate and option set. When the
/// provider fails the score is computed from local estimates alone with
/// reduced confidence; only an invalid coordinate is reported as an error.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use safepath_core::{ScoreOptions, UnavailableReputationProvider};
/// use safepath_scorer::ScoreCalculator;
///
/// let runtime = tokio::runtime::Builder::new_current_thread()
///     .build()
///     .expect("runtime");
/// let calculator = ScoreCalculator::new(UnavailableReputationProvider);
/// let score = runtime
///     .block_on(calculator.score(Coord { x: -0.1276, y: 51.5072 }, ScoreOptions::default()))
///     .expect("valid coordinate");
/// assert!((10.0..=95.0).contains(&score.overall_score));
/// assert!(score.confidence <= 30.0);
/// ```
pub struct ScoreCalculator<P> {
    provider: P,
    clock: Arc<dyn Clock>,
    config: ScoreConfig,
    cache: Mutex<TtlCache<CacheKey, SafetyScore>>,
}

impl<P> std::fmt::Debug for ScoreCalculator<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreCalculator")
            .field("config", &self.config)
            .field("cached", &self.cache_len())
            .finish_non_exhaustive()
    }
}

impl<P> ScoreCalculator<P> {
    /// Create a calculator with the default configuration and system clock.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ScoreConfig::default())
    }

    /// Create a calculator with an explicit configuration.
    #[must_use]
    pub fn with_config(provider: P, config: ScoreConfig) -> Self {
        Self {
            provider,
            clock: Arc::new(SystemClock),
            config,
            cache: Mutex::new(TtlCache::new(config.ttl())),
        }
    }

    /// Read time from `clock` instead of the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Drop every cached score.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    /// Number of cached scores, including any not yet purged as stale.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> MutexGuard<'_, TtlCache<CacheKey, SafetyScore>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: ReputationProvider> ScoreCalculator<P> {
    /// Score `point`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] when the coordinate is not finite or out of
    /// range. Provider failures are absorbed.
    pub async fn score(
        &self,
        point: Coord<f64>,
        options: ScoreOptions,
    ) -> Result<SafetyScore, InputError> {
        validate_coord(point)?;
        let key = (CoordKey::from_coord(point), options);
        let now = self.clock.now();
        if let Some(hit) = self.lock_cache().get(&key, now) {
            log::debug!("score cache hit for {key:?}");
            return Ok(hit);
        }

        let report = match self.provider.analyse(point).await {
            Ok(report) => Some(report),
            Err(err) => {
                log::warn!(
                    "reputation provider failed for ({}, {}): {err}; using local heuristic",
                    point.y,
                    point.x
                );
                None
            }
        };

        let computed = self.compute(point, options, report.as_ref(), now);
        self.lock_cache().insert(key, computed.clone(), now);
        Ok(computed)
    }

    fn compute(
        &self,
        point: Coord<f64>,
        options: ScoreOptions,
        report: Option<&AreaReport>,
        now: DateTime<FixedOffset>,
    ) -> SafetyScore {
        let hour = now.hour();
        let estimate = LocalConditions::estimate(point, now);
        let conditions = report.map_or(estimate, |r| estimate.overlay(&r.factors));
        let weights = self.config.weights();

        let factors = FactorBreakdown {
            base: BASE_SCORE,
            time: time_factor(now, &conditions) * weights.time,
            environment: environment_factor(&conditions) * weights.environment,
            location: location_factor(&conditions) * weights.location,
            external: external_signal(report.map(|r| r.score)) * weights.external,
            realtime: if options.include_realtime {
                realtime_factor(&conditions) * weights.realtime
            } else {
                0.0
            },
        };
        let range = self.config.range();
        let overall_score = range.clamp(factors.total());

        let (confidence, source) = report.map_or(
            (self.config.fallback_confidence(), ScoreSource::LocalHeuristic),
            |r| (provider_confidence(r), ScoreSource::Provider),
        );

        let recommendations = if options.detail == DetailLevel::Basic {
            Vec::new()
        } else {
            recommendations(overall_score, hour, &conditions)
        };
        let trend = if options.include_prediction {
            forecast(overall_score, confidence, hour, &conditions, range)
        } else {
            Trend::stable(overall_score)
        };
        let narrative = if options.detail == DetailLevel::Detailed {
            report.and_then(|r| r.narrative.clone())
        } else {
            None
        };

        SafetyScore {
            point,
            overall_score,
            confidence,
            factors,
            alert_level: AlertLevel::from_score(overall_score),
            recommendations,
            trend,
            source,
            narrative,
            computed_at: now,
        }
    }
}

/// Provider confidence plus a bonus per populated dimension, capped.
fn provider_confidence(report: &AreaReport) -> f64 {
    let base = if report.confidence.is_finite() {
        report.confidence
    } else {
        0.0
    };
    let dimensions = u32::try_from(report.factors.populated_dimensions()).unwrap_or(u32::MAX);
    (base + CONFIDENCE_PER_DIMENSION * f64::from(dimensions)).clamp(0.0, MAX_CONFIDENCE)
}

#[async_trait]
impl<P: ReputationProvider> PreciseScore for ScoreCalculator<P> {
    async fn score(
        &self,
        point: Coord<f64>,
        options: ScoreOptions,
    ) -> Result<SafetyScore, ScoreError> {
        Self::score(self, point, options).await.map_err(ScoreError::from)
    }
}
