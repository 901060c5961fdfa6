//! `RoutePlanner`: checkpointing, candidate retrieval, scoring and ranking.

use std::time::{Duration, Instant};

use futures_util::future::{join, join_all};
use geo::Coord;
use safepath_core::{
    CoordKey, DirectionsRequest, InputError, NEUTRAL_SCORE, PreciseScore, ProviderRoute,
    RouteCandidate, RouteOptions, RouteSource, RoutingProvider, StepAnnotation, TravelMode,
    great_circle_distance, validate_coord,
};

use crate::config::PlannerConfig;
use crate::geometry::{
    annotate_steps, checkpoint_positions, downsample, mean, radial_alternatives,
};
use crate::ranking::select_best;

/// Checkpoints chosen for a planning call.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointPlan {
    /// Checkpoints in travel order, relocated where that helped.
    pub points: Vec<Coord<f64>>,
    /// How many checkpoints were moved to a radial alternative.
    pub relocated: usize,
}

/// Plans routes that steer around low-scoring areas.
///
/// Generic over the routing provider and the precise scorer. Planning
/// never fails for well-formed input: when the provider returns nothing a
/// straight-line candidate is synthesised.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use safepath_core::RouteOptions;
/// use safepath_core::test_support::{FnScorer, StubRoutingProvider};
/// use safepath_planner::RoutePlanner;
///
/// let planner = RoutePlanner::new(StubRoutingProvider::failing(), FnScorer::constant(70.0));
/// let runtime = tokio::runtime::Builder::new_current_thread()
///     .build()
///     .expect("runtime");
/// let route = runtime
///     .block_on(planner.plan_safe_route(
///         Coord { x: -0.1276, y: 51.5072 },
///         Coord { x: -0.0899, y: 51.5136 },
///         RouteOptions::default(),
///     ))
///     .expect("valid input");
/// assert_eq!(route.average_safety_score, 65.0);
/// ```
#[derive(Debug)]
pub struct RoutePlanner<R, S> {
    routing: R,
    scorer: S,
    config: PlannerConfig,
}

impl<R, S> RoutePlanner<R, S>
where
    R: RoutingProvider,
    S: PreciseScore,
{
    /// Construct a planner using default configuration.
    #[must_use]
    pub fn new(routing: R, scorer: S) -> Self {
        Self::with_config(routing, scorer, PlannerConfig::default())
    }

    /// Construct a planner with explicit configuration.
    #[must_use]
    pub const fn with_config(routing: R, scorer: S, config: PlannerConfig) -> Self {
        Self {
            routing,
            scorer,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan the best route from `origin` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] for an invalid coordinate, for endpoints that
    /// round to the same point, or for a minimum score outside `0..=100`.
    /// Provider and scoring failures are absorbed.
    pub async fn plan_safe_route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: RouteOptions,
    ) -> Result<RouteCandidate, InputError> {
        validate_request(origin, destination, &options)?;
        let started = Instant::now();

        let checkpoints = self.plan_checkpoints(origin, destination, &options).await;
        let waypoints: Vec<Coord<f64>> = checkpoints
            .points
            .iter()
            .copied()
            .take(self.config.max_waypoints())
            .collect();
        let direct = DirectionsRequest::direct(origin, destination, options.travel_mode);
        let via = (!waypoints.is_empty()).then(|| {
            DirectionsRequest::via(origin, destination, waypoints, options.travel_mode)
        });

        let (direct_routes, via_routes) =
            join(self.fetch(&direct, "direct"), self.fetch_via(via.as_ref())).await;

        let mut candidates = Vec::with_capacity(direct_routes.len() + via_routes.len());
        for route in direct_routes {
            candidates.extend(self.analyse(route, RouteSource::Direct, 0, &options).await);
        }
        for route in via_routes {
            candidates.extend(
                self.analyse(
                    route,
                    RouteSource::Waypoints,
                    checkpoints.relocated,
                    &options,
                )
                .await,
            );
        }

        let evaluated = candidates.len();
        let best = select_best(
            candidates,
            self.config.safety_margin(),
            options.prefer_safe_routes,
        )
        .unwrap_or_else(|| {
            log::warn!("no route candidates available; falling back to a straight line");
            self.straight_line(origin, destination, options.travel_mode)
        });
        log::debug!(
            "planned {:?} route from {evaluated} candidates in {:?}",
            best.source,
            started.elapsed()
        );
        Ok(best)
    }

    /// Place checkpoints on the straight line and, when danger zones are
    /// avoided, move each low-scoring one to the first radial alternative
    /// that meets the minimum.
    pub async fn plan_checkpoints(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RouteOptions,
    ) -> CheckpointPlan {
        let mut points = Vec::with_capacity(self.config.checkpoint_count());
        let mut relocated = 0;
        for checkpoint in
            checkpoint_positions(origin, destination, self.config.checkpoint_count())
        {
            let score = self.score_or_neutral(checkpoint).await;
            if !options.avoid_danger_zones || score >= options.minimum_safety_score {
                points.push(checkpoint);
                continue;
            }
            let alternative = self.first_safe_alternative(checkpoint, options).await;
            if alternative.is_some() {
                relocated += 1;
            } else {
                log::debug!(
                    "no safer alternative near ({}, {}); keeping checkpoint",
                    checkpoint.y,
                    checkpoint.x
                );
            }
            points.push(alternative.unwrap_or(checkpoint));
        }
        CheckpointPlan { points, relocated }
    }

    async fn first_safe_alternative(
        &self,
        checkpoint: Coord<f64>,
        options: &RouteOptions,
    ) -> Option<Coord<f64>> {
        for alternative in radial_alternatives(checkpoint, self.config.relocation_radius_m()) {
            if validate_coord(alternative).is_err() {
                continue;
            }
            match self
                .scorer
                .score(alternative, self.config.score_options())
                .await
            {
                Ok(score) if score.overall_score >= options.minimum_safety_score => {
                    return Some(alternative);
                }
                Ok(_) => {}
                Err(err) => log::warn!("scoring radial alternative failed: {err}"),
            }
        }
        None
    }

    async fn fetch(&self, request: &DirectionsRequest, label: &str) -> Vec<ProviderRoute> {
        match self.routing.directions(request).await {
            Ok(routes) => routes,
            Err(err) => {
                log::warn!("{label} route request failed: {err}");
                Vec::new()
            }
        }
    }

    async fn fetch_via(&self, request: Option<&DirectionsRequest>) -> Vec<ProviderRoute> {
        let Some(request) = request else {
            log::debug!("no checkpoints; skipping the waypoint request");
            return Vec::new();
        };
        self.fetch(request, "waypoint").await
    }

    async fn analyse(
        &self,
        route: ProviderRoute,
        source: RouteSource,
        avoided: usize,
        options: &RouteOptions,
    ) -> Option<RouteCandidate> {
        if route.geometry.len() < 2 {
            log::warn!("dropping {source:?} route without usable geometry");
            return None;
        }
        let samples = downsample(&route.geometry, self.config.sample_points());
        let scores = join_all(samples.iter().map(|p| self.score_or_neutral(*p))).await;
        let average_safety_score = mean(&scores).unwrap_or(NEUTRAL_SCORE);
        let danger_point_count = scores
            .iter()
            .filter(|score| **score < options.minimum_safety_score)
            .count();
        Some(RouteCandidate {
            steps: annotate_steps(&route.steps, &scores),
            path: route.geometry,
            total_distance_m: route.distance_m,
            total_duration: route.duration,
            average_safety_score,
            danger_zones_avoided: avoided,
            danger_point_count,
            source,
        })
    }

    async fn score_or_neutral(&self, point: Coord<f64>) -> f64 {
        match self.scorer.score(point, self.config.score_options()).await {
            Ok(score) => score.overall_score,
            Err(err) => {
                log::warn!(
                    "scoring ({}, {}) failed: {err}; assuming {NEUTRAL_SCORE}",
                    point.y,
                    point.x
                );
                NEUTRAL_SCORE
            }
        }
    }

    fn straight_line(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        mode: TravelMode,
    ) -> RouteCandidate {
        let distance_m = great_circle_distance(origin, destination);
        let duration = Duration::try_from_secs_f64(distance_m / mode.fallback_speed_mps())
            .unwrap_or(Duration::MAX);
        let safety = self.config.fallback_safety();
        RouteCandidate {
            path: vec![origin, destination],
            total_distance_m: distance_m,
            total_duration: duration,
            average_safety_score: safety,
            danger_zones_avoided: 0,
            danger_point_count: 0,
            steps: vec![StepAnnotation {
                instruction: format!("Continue towards your destination ({})", mode.as_str()),
                distance_m,
                duration,
                safety_score: safety,
            }],
            source: RouteSource::StraightLineFallback,
        }
    }
}

fn validate_request(
    origin: Coord<f64>,
    destination: Coord<f64>,
    options: &RouteOptions,
) -> Result<(), InputError> {
    validate_coord(origin)?;
    validate_coord(destination)?;
    if CoordKey::from_coord(origin) == CoordKey::from_coord(destination) {
        return Err(InputError::IdenticalEndpoints);
    }
    let threshold = options.minimum_safety_score;
    if !(0.0..=100.0).contains(&threshold) {
        return Err(InputError::InvalidThreshold { value: threshold });
    }
    Ok(())
}
