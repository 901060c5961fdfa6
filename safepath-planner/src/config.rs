//! Tunables for [`crate::RoutePlanner`].

use safepath_core::ScoreOptions;

/// Interior checkpoints sampled on the straight line.
pub const DEFAULT_CHECKPOINT_COUNT: usize = 5;

/// Distance of each radial alternative from its checkpoint, in metres.
pub const DEFAULT_RELOCATION_RADIUS_M: f64 = 200.0;

/// Points scored along each candidate's geometry.
pub const DEFAULT_SAMPLE_POINTS: usize = 20;

/// Most waypoints passed to the routing provider.
pub const DEFAULT_MAX_WAYPOINTS: usize = 8;

/// Average-score gap above which the safer candidate wins outright.
pub const DEFAULT_SAFETY_MARGIN: f64 = 10.0;

/// Safety assigned to the straight-line fallback.
pub const DEFAULT_FALLBACK_SAFETY: f64 = 65.0;

/// Configuration for [`crate::RoutePlanner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerConfig {
    checkpoint_count: usize,
    relocation_radius_m: f64,
    sample_points: usize,
    max_waypoints: usize,
    safety_margin: f64,
    fallback_safety: f64,
    score_options: ScoreOptions,
}

impl PlannerConfig {
    /// Override the number of interior checkpoints.
    #[must_use]
    pub const fn with_checkpoint_count(mut self, count: usize) -> Self {
        self.checkpoint_count = count;
        self
    }

    /// Override the radial search distance.
    #[must_use]
    pub const fn with_relocation_radius_m(mut self, radius_m: f64) -> Self {
        self.relocation_radius_m = radius_m;
        self
    }

    /// Override how many points are scored per candidate; at least two.
    #[must_use]
    pub fn with_sample_points(mut self, points: usize) -> Self {
        self.sample_points = points.max(2);
        self
    }

    /// Override the waypoint cap.
    #[must_use]
    pub const fn with_max_waypoints(mut self, max: usize) -> Self {
        self.max_waypoints = max;
        self
    }

    /// Override the ranking margin.
    #[must_use]
    pub const fn with_safety_margin(mut self, margin: f64) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Override the straight-line fallback safety.
    #[must_use]
    pub const fn with_fallback_safety(mut self, safety: f64) -> Self {
        self.fallback_safety = safety;
        self
    }

    /// Override the options used when scoring checkpoints and samples.
    #[must_use]
    pub const fn with_score_options(mut self, options: ScoreOptions) -> Self {
        self.score_options = options;
        self
    }

    /// Interior checkpoints sampled on the straight line.
    #[must_use]
    pub const fn checkpoint_count(&self) -> usize {
        self.checkpoint_count
    }

    /// Radial search distance in metres.
    #[must_use]
    pub const fn relocation_radius_m(&self) -> f64 {
        self.relocation_radius_m
    }

    /// Points scored per candidate.
    #[must_use]
    pub const fn sample_points(&self) -> usize {
        self.sample_points
    }

    /// Waypoint cap.
    #[must_use]
    pub const fn max_waypoints(&self) -> usize {
        self.max_waypoints
    }

    /// Ranking margin.
    #[must_use]
    pub const fn safety_margin(&self) -> f64 {
        self.safety_margin
    }

    /// Straight-line fallback safety.
    #[must_use]
    pub const fn fallback_safety(&self) -> f64 {
        self.fallback_safety
    }

    /// Options used for every score request.
    #[must_use]
    pub const fn score_options(&self) -> ScoreOptions {
        self.score_options
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            checkpoint_count: DEFAULT_CHECKPOINT_COUNT,
            relocation_radius_m: DEFAULT_RELOCATION_RADIUS_M,
            sample_points: DEFAULT_SAMPLE_POINTS,
            max_waypoints: DEFAULT_MAX_WAYPOINTS,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            fallback_safety: DEFAULT_FALLBACK_SAFETY,
            score_options: ScoreOptions::basic(),
        }
    }
}
