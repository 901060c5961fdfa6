//! Tunables for [`crate::ScoreCalculator`].

use std::time::Duration;

use safepath_core::ScoreRange;

/// Default lifetime of a cached score.
pub const DEFAULT_SCORE_TTL: Duration = Duration::from_secs(15 * 60);

/// Default clamp range for precise scores.
pub const DEFAULT_SCORE_RANGE: ScoreRange = ScoreRange::new(10.0, 95.0);

/// Highest confidence reported when the reputation provider is unavailable.
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 30.0;

/// Upper bound on any reported confidence.
pub const MAX_CONFIDENCE: f64 = 95.0;

/// Confidence added for each factor dimension the provider populated.
pub const CONFIDENCE_PER_DIMENSION: f64 = 3.0;

/// Relative weight of each factor family in the overall score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorWeights {
    /// Time of day, day of week and lighting.
    pub time: f64,
    /// Weather and population density.
    pub environment: f64,
    /// Business activity, transit, emergency response, crime and community.
    pub location: f64,
    /// Reputation provider signal.
    pub external: f64,
    /// Current events, traffic and crowds.
    pub realtime: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            time: 0.25,
            environment: 0.20,
            location: 0.25,
            external: 0.20,
            realtime: 0.10,
        }
    }
}

/// Configuration for [`crate::ScoreCalculator`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use safepath_scorer::ScoreConfig;
///
/// let config = ScoreConfig::default().with_ttl(Duration::from_secs(60));
/// assert_eq!(config.ttl(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreConfig {
    ttl: Duration,
    range: ScoreRange,
    fallback_confidence: f64,
    weights: FactorWeights,
}

impl ScoreConfig {
    /// Override the cache lifetime.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the clamp range.
    #[must_use]
    pub const fn with_range(mut self, range: ScoreRange) -> Self {
        self.range = range;
        self
    }

    /// Override the confidence reported without a provider.
    #[must_use]
    pub const fn with_fallback_confidence(mut self, confidence: f64) -> Self {
        self.fallback_confidence = confidence;
        self
    }

    /// Override the factor weights.
    #[must_use]
    pub const fn with_weights(mut self, weights: FactorWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Cache lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Clamp range.
    #[must_use]
    pub const fn range(&self) -> ScoreRange {
        self.range
    }

    /// Confidence reported without a provider.
    #[must_use]
    pub const fn fallback_confidence(&self) -> f64 {
        self.fallback_confidence
    }

    /// Factor weights.
    #[must_use]
    pub const fn weights(&self) -> FactorWeights {
        self.weights
    }
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SCORE_TTL,
            range: DEFAULT_SCORE_RANGE,
            fallback_confidence: DEFAULT_FALLBACK_CONFIDENCE,
            weights: FactorWeights::default(),
        }
    }
}
