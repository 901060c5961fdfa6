//! Tunables for [`crate::GridHeatmapGenerator`].

use std::time::Duration;

use safepath_core::ScoreRange;

/// Default lifetime of a cached area.
pub const DEFAULT_AREA_TTL: Duration = Duration::from_secs(30 * 60);

/// Default clamp range for fast heuristic scores.
pub const DEFAULT_HEATMAP_RANGE: ScoreRange = ScoreRange::new(20.0, 95.0);

/// Default jitter, as a fraction of the cell size.
pub const DEFAULT_JITTER_FRACTION: f64 = 0.3;

/// Default width of the window within which results are reproducible.
pub const DEFAULT_TIME_BUCKET: Duration = Duration::from_secs(10 * 60);

/// Hard cap on quick-preview points.
pub const PREVIEW_POINT_CAP: usize = 30;

/// Configuration for [`crate::GridHeatmapGenerator`].
///
/// # Examples
///
/// ```
/// use safepath_heatmap::HeatmapConfig;
///
/// let config = HeatmapConfig::default().with_jitter_fraction(0.9);
/// // Jitter never lets a point leave its cell.
/// assert!(config.jitter_fraction() < 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapConfig {
    ttl: Duration,
    range: ScoreRange,
    jitter_fraction: f64,
    time_bucket: Duration,
}

impl HeatmapConfig {
    /// Override the area cache lifetime.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the score clamp range.
    #[must_use]
    pub const fn with_range(mut self, range: ScoreRange) -> Self {
        self.range = range;
        self
    }

    /// Override the jitter fraction; clamped to `0.0..=0.45`.
    #[must_use]
    pub fn with_jitter_fraction(mut self, fraction: f64) -> Self {
        self.jitter_fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 0.45)
        } else {
            0.0
        };
        self
    }

    /// Override the reproducibility window.
    #[must_use]
    pub const fn with_time_bucket(mut self, bucket: Duration) -> Self {
        self.time_bucket = bucket;
        self
    }

    /// Area cache lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Score clamp range.
    #[must_use]
    pub const fn range(&self) -> ScoreRange {
        self.range
    }

    /// Jitter as a fraction of the cell size.
    #[must_use]
    pub const fn jitter_fraction(&self) -> f64 {
        self.jitter_fraction
    }

    /// Reproducibility window.
    #[must_use]
    pub const fn time_bucket(&self) -> Duration {
        self.time_bucket
    }
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_AREA_TTL,
            range: DEFAULT_HEATMAP_RANGE,
            jitter_fraction: DEFAULT_JITTER_FRACTION,
            time_bucket: DEFAULT_TIME_BUCKET,
        }
    }
}
