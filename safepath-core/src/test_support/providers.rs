use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geo::Coord;

use crate::{
    AlertLevel, AreaReport, DirectionsRequest, FactorBreakdown, FeatureFlags, PreciseScore, ProviderError,
    ProviderRoute, ReputationProvider, RoutingProvider, SafetyScore, ScoreError, ScoreOptions,
    ScoreSource, Trend,
};

fn unavailable(reason: &str) -> ProviderError {
    ProviderError::Unavailable {
        reason: reason.to_owned(),
    }
}

/// [`ReputationProvider`] returning a fixed answer and counting calls.
#[derive(Debug)]
pub struct CountingReputationProvider {
    response: Result<AreaReport, ProviderError>,
    calls: AtomicUsize,
}

impl CountingReputationProvider {
    /// Always answer with `report`.
    #[must_use]
    pub fn with_report(report: AreaReport) -> Self {
        Self {
            response: Ok(report),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fail with `error`.
    #[must_use]
    pub fn with_error(error: ProviderError) -> Self {
        Self {
            response: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fail as unreachable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::with_error(unavailable("stub provider offline"))
    }

    /// Number of `analyse` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReputationProvider for CountingReputationProvider {
    async fn analyse(&self, _point: Coord<f64>) -> Result<AreaReport, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// [`FeatureFlags`] that hold lookups open until released, so a test can act
/// while a generation is in flight.
///
/// Lookups are numbered from one. Held lookups yield to the runtime until
/// [`GatedFeatureFlags::release`] is called, then answer `true`.
#[derive(Debug, Default)]
pub struct GatedFeatureFlags {
    held_lookup: Option<usize>,
    lookups: AtomicUsize,
    released: AtomicBool,
}

impl GatedFeatureFlags {
    /// Hold every lookup.
    #[must_use]
    pub fn holding_all() -> Self {
        Self::default()
    }

    /// Hold only the `nth` lookup; the others answer `true` at once.
    #[must_use]
    pub fn holding_lookup(nth: usize) -> Self {
        Self {
            held_lookup: Some(nth),
            ..Self::default()
        }
    }

    /// Let held lookups answer.
    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }

    /// Number of lookups started so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeatureFlags for GatedFeatureFlags {
    async fn risk_overlay_enabled(&self) -> Result<bool, ProviderError> {
        let nth = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
        if self.held_lookup.is_none_or(|held| held == nth) {
            while !self.released.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }
        }
        Ok(true)
    }
}

/// [`RoutingProvider`] with canned answers for direct and waypoint requests.
///
/// A request with no waypoints is answered from the direct slot; any other
/// request from the waypoint slot. Unset slots fail as unavailable. Every
/// request is recorded.
#[derive(Debug, Default)]
pub struct StubRoutingProvider {
    direct: Option<Result<Vec<ProviderRoute>, ProviderError>>,
    via: Option<Result<Vec<ProviderRoute>, ProviderError>>,
    requests: Mutex<Vec<DirectionsRequest>>,
}

impl StubRoutingProvider {
    /// A provider that fails every request.
    #[must_use]
    pub fn failing() -> Self {
        Self::default()
    }

    /// Answer direct requests with `routes`.
    #[must_use]
    pub fn with_direct(mut self, routes: Vec<ProviderRoute>) -> Self {
        self.direct = Some(Ok(routes));
        self
    }

    /// Answer waypoint requests with `routes`.
    #[must_use]
    pub fn with_waypoints(mut self, routes: Vec<ProviderRoute>) -> Self {
        self.via = Some(Ok(routes));
        self
    }

    /// Fail direct requests with `error`.
    #[must_use]
    pub fn with_direct_error(mut self, error: ProviderError) -> Self {
        self.direct = Some(Err(error));
        self
    }

    /// Requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<DirectionsRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl RoutingProvider for StubRoutingProvider {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<Vec<ProviderRoute>, ProviderError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let slot = if request.waypoints.is_empty() {
            &self.direct
        } else {
            &self.via
        };
        slot.clone()
            .unwrap_or_else(|| Err(unavailable("stub has no routes for this request")))
    }
}

type ScoreFn = dyn Fn(Coord<f64>) -> Option<f64> + Send + Sync;

/// [`PreciseScore`] computed by a closure.
///
/// Returning `None` from the closure makes the call fail, which lets tests
/// exercise partial scoring failures.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use safepath_core::test_support::FnScorer;
///
/// // Safer the further east.
/// let scorer = FnScorer::new(|c: Coord<f64>| Some(50.0 + c.x));
/// assert_eq!(scorer.calls(), 0);
/// ```
pub struct FnScorer {
    score: Arc<ScoreFn>,
    calls: AtomicUsize,
}

impl std::fmt::Debug for FnScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnScorer")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

impl FnScorer {
    /// Score every point with `score`.
    pub fn new<F>(score: F) -> Self
    where
        F: Fn(Coord<f64>) -> Option<f64> + Send + Sync + 'static,
    {
        Self {
            score: Arc::new(score),
            calls: AtomicUsize::new(0),
        }
    }

    /// Give every point the same score.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(move |_| Some(value))
    }

    /// Number of `score` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreciseScore for FnScorer {
    async fn score(
        &self,
        point: Coord<f64>,
        _options: ScoreOptions,
    ) -> Result<SafetyScore, ScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let value = (self.score)(point).ok_or_else(|| unavailable("scripted scoring failure"))?;
        Ok(SafetyScore {
            point,
            overall_score: value,
            confidence: 50.0,
            factors: FactorBreakdown {
                base: value,
                ..FactorBreakdown::default()
            },
            alert_level: AlertLevel::from_score(value),
            recommendations: Vec::new(),
            trend: Trend::stable(value),
            source: ScoreSource::LocalHeuristic,
            narrative: None,
            computed_at: DateTime::<Utc>::default().fixed_offset(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TravelMode;

    #[tokio::test]
    async fn routing_stub_separates_direct_and_waypoint_slots() {
        let route = ProviderRoute {
            geometry: vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }],
            distance_m: 100.0,
            duration: std::time::Duration::from_secs(60),
            steps: Vec::new(),
        };
        let stub = StubRoutingProvider::failing().with_direct(vec![route]);
        let origin = Coord { x: 0.0, y: 0.0 };
        let destination = Coord { x: 1.0, y: 0.0 };

        let direct = stub
            .directions(&DirectionsRequest::direct(origin, destination, TravelMode::Walking))
            .await;
        let via = stub
            .directions(&DirectionsRequest::via(
                origin,
                destination,
                vec![Coord { x: 0.5, y: 0.0 }],
                TravelMode::Walking,
            ))
            .await;

        assert_eq!(direct.map(|r| r.len()), Ok(1));
        assert!(via.is_err());
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn fn_scorer_fails_when_closure_declines() {
        let scorer = FnScorer::new(|c| (c.x > 0.0).then_some(70.0));
        assert!(scorer.score(Coord { x: -1.0, y: 0.0 }, ScoreOptions::default()).await.is_err());
        let ok = scorer
            .score(Coord { x: 1.0, y: 0.0 }, ScoreOptions::default())
            .await
            .expect("positive longitude scores");
        assert_eq!(ok.overall_score, 70.0);
        assert_eq!(scorer.calls(), 2);
    }
}
