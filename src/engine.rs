//! Composition root tying providers to the engine components.

use std::sync::Arc;

use geo::Coord;
use safepath_core::{
    Clock, FeatureFlags, InputError, MapSurface, ReputationProvider, RouteCandidate, RouteOptions,
    RoutingProvider, SafetyScore, Scheduler, ScoreOptions, SystemClock,
};
use safepath_heatmap::{GridHeatmapGenerator, HeatmapConfig};
use safepath_overlay::{OverlayConfig, OverlayController};
use safepath_planner::{PlannerConfig, RoutePlanner};
use safepath_scorer::{ScoreCalculator, ScoreConfig};

/// Configuration for every component built by [`SafetyEngine`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineConfig {
    /// Precise scorer settings.
    pub score: ScoreConfig,
    /// Heatmap grid settings.
    pub heatmap: HeatmapConfig,
    /// Route planner settings.
    pub planner: PlannerConfig,
    /// Overlay session settings.
    pub overlay: OverlayConfig,
}

impl EngineConfig {
    /// Replace the scorer settings.
    #[must_use]
    pub const fn with_score(mut self, score: ScoreConfig) -> Self {
        self.score = score;
        self
    }

    /// Replace the heatmap settings.
    #[must_use]
    pub const fn with_heatmap(mut self, heatmap: HeatmapConfig) -> Self {
        self.heatmap = heatmap;
        self
    }

    /// Replace the planner settings.
    #[must_use]
    pub const fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    /// Replace the overlay settings.
    #[must_use]
    pub const fn with_overlay(mut self, overlay: OverlayConfig) -> Self {
        self.overlay = overlay;
        self
    }
}

/// One scorer, heatmap generator, and route planner sharing a clock,
/// scheduler, and score cache.
///
/// The planner scores checkpoints and route samples through the same
/// [`ScoreCalculator`] callers use directly, so repeated lookups of a point
/// are served from one cache.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use geo::Coord;
/// use safepath_engine::{
///     SafetyEngine, ScoreOptions, StaticFeatureFlags, TokioScheduler,
///     UnavailableReputationProvider,
/// };
/// # use safepath_engine::{DirectionsRequest, ProviderError, ProviderRoute, RoutingProvider};
/// # struct NoRoutes;
/// # #[async_trait::async_trait]
/// # impl RoutingProvider for NoRoutes {
/// #     async fn directions(
/// #         &self,
/// #         _request: &DirectionsRequest,
/// #     ) -> Result<Vec<ProviderRoute>, ProviderError> {
/// #         Ok(Vec::new())
/// #     }
/// # }
///
/// let runtime = tokio::runtime::Builder::new_current_thread()
///     .enable_time()
///     .build()
///     .expect("runtime");
/// let engine = SafetyEngine::new(
///     UnavailableReputationProvider,
///     NoRoutes,
///     Arc::new(StaticFeatureFlags::new(true)),
///     Arc::new(TokioScheduler::new(runtime.handle().clone())),
/// );
/// let score = runtime
///     .block_on(engine.score(Coord { x: -0.1276, y: 51.5072 }, ScoreOptions::basic()))
///     .expect("valid coordinate");
/// assert!((10.0..=95.0).contains(&score.overall_score));
/// ```
pub struct SafetyEngine<P, R> {
    scorer: Arc<ScoreCalculator<P>>,
    heatmap: GridHeatmapGenerator,
    planner: RoutePlanner<R, Arc<ScoreCalculator<P>>>,
    scheduler: Arc<dyn Scheduler>,
    config: EngineConfig,
}

impl<P, R> std::fmt::Debug for SafetyEngine<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyEngine")
            .field("scorer", &self.scorer)
            .field("heatmap", &self.heatmap)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<P, R> SafetyEngine<P, R>
where
    P: ReputationProvider,
    R: RoutingProvider,
{
    /// Build an engine with default configuration and the system clock.
    #[must_use]
    pub fn new(
        reputation: P,
        routing: R,
        flags: Arc<dyn FeatureFlags>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self::with_config(reputation, routing, flags, scheduler, EngineConfig::default())
    }

    /// Build an engine with explicit configuration and the system clock.
    #[must_use]
    pub fn with_config(
        reputation: P,
        routing: R,
        flags: Arc<dyn FeatureFlags>,
        scheduler: Arc<dyn Scheduler>,
        config: EngineConfig,
    ) -> Self {
        Self::with_clock(
            reputation,
            routing,
            flags,
            scheduler,
            config,
            Arc::new(SystemClock),
        )
    }

    /// Build an engine whose components all read time from `clock`.
    #[must_use]
    pub fn with_clock(
        reputation: P,
        routing: R,
        flags: Arc<dyn FeatureFlags>,
        scheduler: Arc<dyn Scheduler>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let scorer = Arc::new(
            ScoreCalculator::with_config(reputation, config.score).with_clock(Arc::clone(&clock)),
        );
        let heatmap =
            GridHeatmapGenerator::with_config(flags, Arc::clone(&scheduler), config.heatmap)
                .with_clock(clock);
        let planner = RoutePlanner::with_config(routing, Arc::clone(&scorer), config.planner);
        log::debug!("safety engine assembled with {config:?}");
        Self {
            scorer,
            heatmap,
            planner,
            scheduler,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared precise scorer.
    #[must_use]
    pub fn scorer(&self) -> &ScoreCalculator<P> {
        &self.scorer
    }

    /// The heatmap generator. Overlays built by [`Self::overlay`] share its
    /// state.
    #[must_use]
    pub const fn heatmap(&self) -> &GridHeatmapGenerator {
        &self.heatmap
    }

    /// The route planner.
    #[must_use]
    pub const fn planner(&self) -> &RoutePlanner<R, Arc<ScoreCalculator<P>>> {
        &self.planner
    }

    /// Score `point` with the precise scorer.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] when `point` is not a valid coordinate.
    pub async fn score(
        &self,
        point: Coord<f64>,
        options: ScoreOptions,
    ) -> Result<SafetyScore, InputError> {
        self.scorer.score(point, options).await
    }

    /// Plan the safest sensible route between two points.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] for invalid coordinates, identical endpoints,
    /// or a minimum safety score outside `0..=100`.
    pub async fn plan_route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: RouteOptions,
    ) -> Result<RouteCandidate, InputError> {
        self.planner
            .plan_safe_route(origin, destination, options)
            .await
    }

    /// An overlay controller drawing onto `surface`.
    ///
    /// The controller drives this engine's heatmap generator, so at most one
    /// overlay per engine should be enabled at a time.
    #[must_use]
    pub fn overlay(&self, surface: Arc<dyn MapSurface>) -> OverlayController {
        OverlayController::with_config(
            surface,
            self.heatmap.clone(),
            Arc::clone(&self.scheduler),
            self.config.overlay,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use safepath_core::test_support::{
        CountingReputationProvider, ManualClock, ManualScheduler, RecordingSurface,
        StubRoutingProvider,
    };
    use safepath_core::{Bounds, RouteSource, StaticFeatureFlags, Viewport};

    type TestEngine = SafetyEngine<Arc<CountingReputationProvider>, StubRoutingProvider>;

    const ORIGIN: Coord<f64> = Coord {
        x: -0.1276,
        y: 51.5072,
    };
    const DESTINATION: Coord<f64> = Coord {
        x: -0.0899,
        y: 51.5136,
    };

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime")
            .block_on(future)
    }

    struct Harness {
        reputation: Arc<CountingReputationProvider>,
        scheduler: Arc<ManualScheduler>,
        engine: TestEngine,
    }

    #[fixture]
    fn harness() -> Harness {
        let reputation = Arc::new(CountingReputationProvider::unavailable());
        let scheduler = Arc::new(ManualScheduler::new(ManualClock::at_utc(2024, 5, 1, 12, 0)));
        let engine = SafetyEngine::with_clock(
            Arc::clone(&reputation),
            StubRoutingProvider::failing(),
            Arc::new(StaticFeatureFlags::new(true)),
            Arc::clone(&scheduler) as _,
            EngineConfig::default(),
            Arc::new(scheduler.clock()),
        );
        Harness {
            reputation,
            scheduler,
            engine,
        }
    }

    #[rstest]
    fn repeated_scores_share_one_cache(harness: Harness) {
        let first = block_on(harness.engine.score(ORIGIN, ScoreOptions::basic())).expect("valid");
        let second = block_on(harness.engine.score(ORIGIN, ScoreOptions::basic())).expect("valid");

        assert_eq!(first, second);
        assert_eq!(harness.reputation.calls(), 1);
        assert_eq!(harness.engine.scorer().cache_len(), 1);
    }

    #[rstest]
    fn planning_without_routes_falls_back_to_a_straight_line(harness: Harness) {
        let route = block_on(harness.engine.plan_route(
            ORIGIN,
            DESTINATION,
            RouteOptions::default(),
        ))
        .expect("valid");

        assert_eq!(route.source, RouteSource::StraightLineFallback);
        assert_eq!(route.path, vec![ORIGIN, DESTINATION]);
        assert!(harness.engine.scorer().cache_len() > 0, "checkpoints were scored");
    }

    #[rstest]
    fn planning_rejects_identical_endpoints(harness: Harness) {
        let result = block_on(harness.engine.plan_route(ORIGIN, ORIGIN, RouteOptions::default()));
        assert_eq!(result, Err(InputError::IdenticalEndpoints));
    }

    #[rstest]
    fn overlays_drive_the_shared_generator(harness: Harness) {
        let surface = Arc::new(RecordingSurface::with_viewport(Viewport {
            bounds: Bounds::new(51.515, 51.497, -0.110, -0.145).expect("valid bounds"),
            zoom: 14.0,
        }));
        let overlay = harness.engine.overlay(Arc::clone(&surface) as _);

        block_on(overlay.enable()).expect("enabled");

        assert_eq!(surface.layer_count(), 1);
        assert!(!harness.engine.heatmap().points().is_empty());
        assert_eq!(harness.scheduler.pending_count(), 1);

        overlay.disable();
        assert_eq!(surface.layer_count(), 0);
        assert!(harness.engine.heatmap().points().is_empty());
    }

    #[rstest]
    fn configuration_reaches_every_component() {
        let config = EngineConfig::default()
            .with_planner(PlannerConfig::default().with_fallback_safety(70.0));
        let engine = SafetyEngine::with_config(
            CountingReputationProvider::unavailable(),
            StubRoutingProvider::failing(),
            Arc::new(StaticFeatureFlags::new(true)),
            Arc::new(ManualScheduler::default()),
            config,
        );

        let route = block_on(engine.plan_route(ORIGIN, DESTINATION, RouteOptions::default()))
            .expect("valid");

        assert!((route.average_safety_score - 70.0).abs() < f64::EPSILON);
        assert_eq!(engine.config(), &config);
    }
}
