//! Viewport grid generation, area caching and periodic refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use safepath_core::{
    Bounds, Clock, CoordKey, FeatureFlags, HeatmapPoint, InputError, PerformanceTier,
    ScheduledTask, Scheduler, Subscribers, Subscription, SystemClock, TimerHandle, TtlCache,
    time_bucket,
};
use xxhash_rust::xxh3::xxh3_64;

use crate::config::HeatmapConfig;
use crate::fast::FastHeuristicScore;
use crate::grid::{Resolution, grid_shape, sample_points};

/// Which grid variant produced a point set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GridMode {
    Full,
    Preview,
    Adaptive(PerformanceTier),
}

impl GridMode {
    fn resolution(self, zoom: f64) -> Resolution {
        let base = Resolution::for_zoom(zoom);
        match self {
            Self::Full => base,
            Self::Preview => base.preview(),
            Self::Adaptive(tier) => base.adapted(tier),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AreaKey {
    center: CoordKey,
    radius_m: i64,
    zoom_e2: i64,
    mode: GridMode,
}

impl AreaKey {
    fn new(bounds: &Bounds, zoom: f64, mode: GridMode) -> Self {
        Self {
            center: CoordKey::from_coord(bounds.center()),
            radius_m: scaled(bounds.radius_m(), 1.0),
            zoom_e2: scaled(zoom, 100.0),
            mode,
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "validated coordinates, radii and zooms fit in i64 once scaled"
)]
fn scaled(value: f64, factor: f64) -> i64 {
    (value * factor).round() as i64
}

/// What caused a [`HeatmapUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// A new point set replaced the previous one.
    Generated,
    /// The existing points were re-scored in place.
    Refreshed,
    /// The point set and caches were dropped.
    Cleared,
}

/// Notification delivered to heatmap subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapUpdate {
    /// Current point set.
    pub points: Vec<HeatmapPoint>,
    /// Points whose score moved; equals `points.len()` for new sets.
    pub changed: usize,
    /// Cause of the update.
    pub kind: UpdateKind,
    /// When the update was produced.
    pub at: DateTime<FixedOffset>,
}

/// Snapshot returned by [`GridHeatmapGenerator::stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapStats {
    /// Points in the current set.
    pub point_count: usize,
    /// Mean score of the current set; `None` when empty.
    pub average_safety: Option<f64>,
    /// Zoom the current set was generated at.
    pub zoom: f64,
    /// Points scored since construction, refreshes included.
    pub points_scored: u64,
    /// Area results held in the cache.
    pub cached_areas: usize,
    /// Calls answered from the cache.
    pub cache_hits: u64,
    /// Whether periodic refresh is running.
    pub real_time_active: bool,
    /// When the current set was generated.
    pub last_generated: Option<DateTime<FixedOffset>>,
}

struct State {
    // Bumped by `clear`; generations that began earlier are not committed.
    generation: u64,
    points: Vec<HeatmapPoint>,
    zoom: f64,
    cache: TtlCache<AreaKey, Vec<HeatmapPoint>>,
    timer: Option<TimerHandle>,
    last_generated: Option<DateTime<FixedOffset>>,
    cache_hits: u64,
}

struct Shared {
    state: Mutex<State>,
    subscribers: Subscribers<HeatmapUpdate>,
    points_scored: AtomicU64,
    scheduler: Arc<dyn Scheduler>,
}

impl Shared {
    fn new(config: &HeatmapConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            state: Mutex::new(State {
                generation: 0,
                points: Vec::new(),
                zoom: 0.0,
                cache: TtlCache::new(config.ttl()),
                timer: None,
                last_generated: None,
                cache_hits: 0,
            }),
            subscribers: Subscribers::new("heatmap"),
            points_scored: AtomicU64::new(0),
            scheduler,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_scored(&self, count: usize) {
        self.points_scored
            .fetch_add(u64::try_from(count).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    fn refresh(&self, strategy: &FastHeuristicScore, now: DateTime<FixedOffset>) {
        let update = {
            let mut state = self.lock();
            if state.points.is_empty() {
                return;
            }
            let zoom = state.zoom;
            let mut changed = 0;
            for point in &mut state.points {
                let score = strategy.score(point.point, now);
                if (score - point.safety_score).abs() > f64::EPSILON {
                    changed += 1;
                }
                point.rescore(score, zoom, now);
            }
            HeatmapUpdate {
                points: state.points.clone(),
                changed,
                kind: UpdateKind::Refreshed,
                at: now,
            }
        };
        self.record_scored(update.points.len());
        log::debug!(
            "refreshed {} heatmap points, {} changed",
            update.points.len(),
            update.changed
        );
        self.subscribers.notify(&update);
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let timer = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .timer
            .take();
        if let Some(handle) = timer {
            self.scheduler.cancel(handle);
        }
    }
}

/// Budgeted, jittered grid of fast-scored points over a viewport.
///
/// Every call to a `generate_*` method replaces the current point set.
/// Cloning yields another handle onto the same state.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use safepath_core::{Bounds, StaticFeatureFlags, TokioScheduler};
/// use safepath_heatmap::GridHeatmapGenerator;
///
/// let runtime = tokio::runtime::Builder::new_current_thread()
///     .enable_time()
///     .build()
///     .expect("runtime");
/// let scheduler = TokioScheduler::new(runtime.handle().clone());
/// let generator = GridHeatmapGenerator::new(
///     Arc::new(StaticFeatureFlags::new(true)),
///     Arc::new(scheduler),
/// );
/// let bounds = Bounds::new(51.52, 51.50, -0.10, -0.14).expect("bounds");
/// let points = runtime
///     .block_on(generator.generate_area(bounds, 16.0))
///     .expect("valid zoom");
/// assert!(!points.is_empty() && points.len() <= 60);
/// ```
#[derive(Clone)]
pub struct GridHeatmapGenerator {
    flags: Arc<dyn FeatureFlags>,
    clock: Arc<dyn Clock>,
    config: HeatmapConfig,
    strategy: FastHeuristicScore,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for GridHeatmapGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridHeatmapGenerator")
            .field("config", &self.config)
            .field("points", &self.shared.lock().points.len())
            .finish_non_exhaustive()
    }
}

impl GridHeatmapGenerator {
    /// Create a generator with the default configuration and system clock.
    #[must_use]
    pub fn new(flags: Arc<dyn FeatureFlags>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_config(flags, scheduler, HeatmapConfig::default())
    }

    /// Create a generator with an explicit configuration.
    #[must_use]
    pub fn with_config(
        flags: Arc<dyn FeatureFlags>,
        scheduler: Arc<dyn Scheduler>,
        config: HeatmapConfig,
    ) -> Self {
        Self {
            flags,
            clock: Arc::new(SystemClock),
            config,
            strategy: FastHeuristicScore::new(config.range(), config.time_bucket()),
            shared: Arc::new(Shared::new(&config, scheduler)),
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
    pub const fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    /// Sample and score a grid over `bounds` sized for `zoom`.
    ///
    /// Returns an empty set, without scoring anything, when the risk overlay
    /// flag is off or cannot be read.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidZoom`] for a negative or non-finite zoom.
    pub async fn generate_area(
        &self,
        bounds: Bounds,
        zoom: f64,
    ) -> Result<Vec<HeatmapPoint>, InputError> {
        self.generate(bounds, zoom, GridMode::Full).await
    }

    /// Coarser grid for a fast first paint: at most 30 points.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidZoom`] for a negative or non-finite zoom.
    pub async fn generate_quick_preview(
        &self,
        bounds: Bounds,
        zoom: f64,
    ) -> Result<Vec<HeatmapPoint>, InputError> {
        self.generate(bounds, zoom, GridMode::Preview).await
    }

    /// Grid scaled for a device's performance tier.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidZoom`] for a negative or non-finite zoom.
    pub async fn generate_adaptive(
        &self,
        bounds: Bounds,
        zoom: f64,
        tier: PerformanceTier,
    ) -> Result<Vec<HeatmapPoint>, InputError> {
        self.generate(bounds, zoom, GridMode::Adaptive(tier)).await
    }

    async fn generate(
        &self,
        bounds: Bounds,
        zoom: f64,
        mode: GridMode,
    ) -> Result<Vec<HeatmapPoint>, InputError> {
        if !zoom.is_finite() || zoom < 0.0 {
            return Err(InputError::InvalidZoom { zoom });
        }
        let generation = self.shared.lock().generation;
        if !overlay_enabled(self.flags.as_ref()).await {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let key = AreaKey::new(&bounds, zoom, mode);
        let cached = self.shared.lock().cache.get(&key, now);
        let is_hit = cached.is_some();
        let points = cached.unwrap_or_else(|| self.sample(&bounds, zoom, mode, now));

        {
            let mut state = self.shared.lock();
            if state.generation != generation {
                log::debug!("discarding heatmap generation started before the last clear");
                return Ok(points);
            }
            if is_hit {
                log::debug!("heatmap cache hit for {key:?}");
                state.cache_hits += 1;
            } else {
                state.cache.insert(key, points.clone(), now);
            }
            state.points.clone_from(&points);
            state.zoom = zoom;
            state.last_generated = Some(now);
        }
        self.shared.subscribers.notify(&HeatmapUpdate {
            points: points.clone(),
            changed: points.len(),
            kind: UpdateKind::Generated,
            at: now,
        });
        Ok(points)
    }

    fn sample(
        &self,
        bounds: &Bounds,
        zoom: f64,
        mode: GridMode,
        now: DateTime<FixedOffset>,
    ) -> Vec<HeatmapPoint> {
        let started = Instant::now();
        let (rows, cols) = grid_shape(bounds, mode.resolution(zoom));
        let bucket = time_bucket(now, self.config.time_bucket());
        let mut rng = ChaCha8Rng::seed_from_u64(grid_seed(bounds, zoom, bucket));

        let points: Vec<HeatmapPoint> =
            sample_points(bounds, rows, cols, self.config.jitter_fraction(), &mut rng)
                .into_iter()
                .map(|point| HeatmapPoint::new(point, self.strategy.score(point, now), zoom, now))
                .collect();
        self.shared.record_scored(points.len());
        log::debug!(
            "sampled {} heatmap points on a {rows}x{cols} grid in {:?}",
            points.len(),
            started.elapsed()
        );
        points
    }

    /// Re-score the current point set every `interval` and notify
    /// subscribers. Replaces any refresh already running.
    pub fn start_real_time_updates(&self, interval: Duration) {
        let task = refresh_task(
            Arc::downgrade(&self.shared),
            Arc::clone(&self.flags),
            Arc::clone(&self.clock),
            self.strategy,
        );
        let handle = self.shared.scheduler.schedule_repeating(interval, task);
        let previous = self.shared.lock().timer.replace(handle);
        if let Some(previous) = previous {
            self.shared.scheduler.cancel(previous);
        }
        log::debug!("heatmap refresh every {interval:?}");
    }

    /// Stop periodic refresh. Does nothing when none is running.
    pub fn stop_real_time_updates(&self) {
        let timer = self.shared.lock().timer.take();
        if let Some(handle) = timer {
            self.shared.scheduler.cancel(handle);
            log::debug!("heatmap refresh stopped");
        }
    }

    /// Register `callback` for every change to the point set.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&HeatmapUpdate) + Send + Sync + 'static,
    {
        self.shared.subscribers.subscribe(callback)
    }

    /// Current point set.
    #[must_use]
    pub fn points(&self) -> Vec<HeatmapPoint> {
        self.shared.lock().points.clone()
    }

    /// Counters and a summary of the current point set.
    #[must_use]
    pub fn stats(&self) -> HeatmapStats {
        let points_scored = self.shared.points_scored.load(Ordering::Relaxed);
        let state = self.shared.lock();
        let average_safety = (!state.points.is_empty()).then(|| {
            let total: f64 = state.points.iter().map(|p| p.safety_score).sum();
            #[expect(
                clippy::cast_precision_loss,
                reason = "point sets hold at most a few hundred entries"
            )]
            let count = state.points.len() as f64;
            total / count
        });
        HeatmapStats {
            point_count: state.points.len(),
            average_safety,
            zoom: state.zoom,
            points_scored,
            cached_areas: state.cache.len(),
            cache_hits: state.cache_hits,
            real_time_active: state.timer.is_some(),
            last_generated: state.last_generated,
        }
    }

    /// Drop the current point set and every cached area.
    ///
    /// A generation still awaiting the feature flag when this runs returns
    /// its points to its caller but leaves the cleared state alone.
    pub fn clear(&self) {
        {
            let mut state = self.shared.lock();
            state.generation += 1;
            state.points.clear();
            state.cache.clear();
            state.last_generated = None;
        }
        self.shared.subscribers.notify(&HeatmapUpdate {
            points: Vec::new(),
            changed: 0,
            kind: UpdateKind::Cleared,
            at: self.clock.now(),
        });
    }
}

async fn overlay_enabled(flags: &dyn FeatureFlags) -> bool {
    match flags.risk_overlay_enabled().await {
        Ok(enabled) => enabled,
        Err(err) => {
            log::warn!("risk overlay flag lookup failed: {err}; treating as disabled");
            false
        }
    }
}

fn grid_seed(bounds: &Bounds, zoom: f64, bucket: i64) -> u64 {
    let mut bytes = Vec::with_capacity(48);
    for edge in [bounds.north(), bounds.south(), bounds.east(), bounds.west()] {
        bytes.extend_from_slice(&scaled(edge, 10_000.0).to_le_bytes());
    }
    bytes.extend_from_slice(&scaled(zoom, 100.0).to_le_bytes());
    bytes.extend_from_slice(&bucket.to_le_bytes());
    xxh3_64(&bytes)
}

fn refresh_task(
    shared: Weak<Shared>,
    flags: Arc<dyn FeatureFlags>,
    clock: Arc<dyn Clock>,
    strategy: FastHeuristicScore,
) -> ScheduledTask {
    Box::new(move || {
        let shared = shared.clone();
        let flags = Arc::clone(&flags);
        let clock = Arc::clone(&clock);
        Box::pin(async move {
            if !overlay_enabled(flags.as_ref()).await {
                log::debug!("risk overlay disabled; skipping heatmap refresh");
                return;
            }
            if let Some(shared) = shared.upgrade() {
                shared.refresh(&strategy, clock.now());
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use safepath_core::StaticFeatureFlags;
    use safepath_core::test_support::{GatedFeatureFlags, ManualClock, ManualScheduler};
    use std::sync::atomic::AtomicUsize;

    struct Harness {
        generator: GridHeatmapGenerator,
        flags: Arc<StaticFeatureFlags>,
        scheduler: ManualScheduler,
    }

    #[fixture]
    fn harness() -> Harness {
        let clock = ManualClock::at_utc(2024, 5, 1, 14, 0);
        let scheduler = ManualScheduler::new(clock.clone());
        let flags = Arc::new(StaticFeatureFlags::new(true));
        let generator = GridHeatmapGenerator::new(
            Arc::clone(&flags) as Arc<dyn FeatureFlags>,
            Arc::new(scheduler.clone()),
        )
        .with_clock(Arc::new(clock));
        Harness {
            generator,
            flags,
            scheduler,
        }
    }

    fn bounds() -> Bounds {
        Bounds::new(51.52, 51.50, -0.10, -0.14).expect("valid bounds")
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_call_is_served_from_cache(harness: Harness) {
        let first = harness
            .generator
            .generate_area(bounds(), 16.0)
            .await
            .expect("valid zoom");
        let scored = harness.generator.stats().points_scored;
        let second = harness
            .generator
            .generate_area(bounds(), 16.0)
            .await
            .expect("valid zoom");

        assert_eq!(first, second);
        let stats = harness.generator.stats();
        assert_eq!(stats.points_scored, scored);
        assert_eq!(stats.cache_hits, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn new_call_replaces_point_set(harness: Harness) {
        harness
            .generator
            .generate_area(bounds(), 18.0)
            .await
            .expect("valid zoom");
        let preview = harness
            .generator
            .generate_quick_preview(bounds(), 18.0)
            .await
            .expect("valid zoom");

        assert_eq!(harness.generator.points(), preview);
        assert!(preview.len() <= 30);
    }

    #[rstest]
    #[tokio::test]
    async fn disabled_flag_yields_nothing(harness: Harness) {
        harness.flags.set_risk_overlay(false);
        let points = harness
            .generator
            .generate_area(bounds(), 16.0)
            .await
            .expect("valid zoom");

        assert!(points.is_empty());
        assert_eq!(harness.generator.stats().points_scored, 0);
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(-1.0)]
    #[tokio::test]
    async fn invalid_zoom_is_rejected(harness: Harness, #[case] zoom: f64) {
        let result = harness.generator.generate_area(bounds(), zoom).await;
        assert!(matches!(result, Err(InputError::InvalidZoom { .. })));
    }

    #[rstest]
    #[tokio::test]
    async fn refresh_rescores_in_place_and_notifies(harness: Harness) {
        let generated = harness
            .generator
            .generate_area(bounds(), 15.0)
            .await
            .expect("valid zoom");
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshes);
        let _subscription = harness.generator.subscribe(move |update| {
            if update.kind == UpdateKind::Refreshed {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        harness
            .generator
            .start_real_time_updates(Duration::from_secs(120));
        harness
            .generator
            .start_real_time_updates(Duration::from_secs(120));
        assert_eq!(harness.scheduler.pending_count(), 1);

        harness.scheduler.advance(Duration::from_secs(5 * 60)).await;

        assert_eq!(refreshes.load(Ordering::SeqCst), 2);
        let refreshed = harness.generator.points();
        assert_eq!(refreshed.len(), generated.len());
        assert!(
            refreshed
                .iter()
                .zip(&generated)
                .all(|(after, before)| after.point == before.point)
        );

        harness.generator.stop_real_time_updates();
        assert_eq!(harness.scheduler.pending_count(), 0);
        assert!(!harness.generator.stats().real_time_active);
    }

    #[rstest]
    #[tokio::test]
    async fn stale_areas_are_swept_on_later_misses(harness: Harness) {
        harness
            .generator
            .generate_area(bounds(), 16.0)
            .await
            .expect("valid zoom");
        harness
            .generator
            .generate_quick_preview(bounds(), 16.0)
            .await
            .expect("valid zoom");
        assert_eq!(harness.generator.stats().cached_areas, 2);

        harness
            .scheduler
            .clock()
            .advance(Duration::from_secs(24 * 60 * 60));
        harness
            .generator
            .generate_area(bounds(), 14.0)
            .await
            .expect("valid zoom");

        assert_eq!(harness.generator.stats().cached_areas, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn clear_drops_points_and_cache(harness: Harness) {
        harness
            .generator
            .generate_area(bounds(), 16.0)
            .await
            .expect("valid zoom");
        harness.generator.clear();

        let stats = harness.generator.stats();
        assert_eq!(stats.point_count, 0);
        assert_eq!(stats.cached_areas, 0);
        assert!(stats.average_safety.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn clearing_mid_generation_keeps_the_result_out() {
        let gate = Arc::new(GatedFeatureFlags::holding_all());
        let generator = GridHeatmapGenerator::new(
            Arc::clone(&gate) as Arc<dyn FeatureFlags>,
            Arc::new(ManualScheduler::default()),
        );
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let _subscription = generator.subscribe(move |update| {
            if update.kind == UpdateKind::Generated {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let (generated, ()) = tokio::join!(generator.generate_area(bounds(), 16.0), async {
            tokio::task::yield_now().await;
            generator.clear();
            gate.release();
        });

        assert!(!generated.expect("valid zoom").is_empty());
        assert!(generator.points().is_empty());
        assert_eq!(generator.stats().cached_areas, 0);
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    fn seed_depends_on_time_bucket() {
        let b = bounds();
        assert_eq!(grid_seed(&b, 16.0, 10), grid_seed(&b, 16.0, 10));
        assert_ne!(grid_seed(&b, 16.0, 10), grid_seed(&b, 16.0, 11));
    }
}
