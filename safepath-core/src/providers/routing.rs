//! Routing provider trait and the request/response shapes it exchanges.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;

use crate::{ProviderError, TravelMode};

/// A directions query.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    /// Start of the route.
    pub origin: Coord<f64>,
    /// End of the route.
    pub destination: Coord<f64>,
    /// Intermediate points the route must pass through.
    pub waypoints: Vec<Coord<f64>>,
    /// Allow the provider to reorder `waypoints`.
    pub optimise_waypoints: bool,
    /// Travel mode to route for.
    pub travel_mode: TravelMode,
    /// Ask for alternative routes as well as the best one.
    pub alternatives: bool,
}

impl DirectionsRequest {
    /// A point-to-point request with no waypoints.
    #[must_use]
    pub fn direct(origin: Coord<f64>, destination: Coord<f64>, travel_mode: TravelMode) -> Self {
        Self {
            origin,
            destination,
            waypoints: Vec::new(),
            optimise_waypoints: false,
            travel_mode,
            alternatives: true,
        }
    }

    /// A request routed through `waypoints`, which may be reordered.
    #[must_use]
    pub fn via(
        origin: Coord<f64>,
        destination: Coord<f64>,
        waypoints: Vec<Coord<f64>>,
        travel_mode: TravelMode,
    ) -> Self {
        Self {
            origin,
            destination,
            waypoints,
            optimise_waypoints: true,
            travel_mode,
            alternatives: false,
        }
    }

    /// Origin, waypoints and destination in request order.
    #[must_use]
    pub fn coordinates(&self) -> Vec<Coord<f64>> {
        std::iter::once(self.origin)
            .chain(self.waypoints.iter().copied())
            .chain(std::iter::once(self.destination))
            .collect()
    }
}

/// One manoeuvre of a provider route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProviderStep {
    /// Human-readable instruction.
    pub instruction: String,
    /// Step length in metres.
    pub distance_m: f64,
    /// Step travel time.
    pub duration: Duration,
    /// Provider manoeuvre type, e.g. `"turn"` or `"depart"`.
    pub maneuver: Option<String>,
}

/// A route as returned by the provider, before safety analysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProviderRoute {
    /// Decoded route geometry.
    pub geometry: Vec<Coord<f64>>,
    /// Route length in metres.
    pub distance_m: f64,
    /// Route travel time.
    pub duration: Duration,
    /// Manoeuvres in travel order.
    pub steps: Vec<ProviderStep>,
}

/// Computes road-network routes.
///
/// Implementations own their timeouts; an unanswered request must surface as
/// an error rather than hang.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use safepath_core::{DirectionsRequest, ProviderError, ProviderRoute, RoutingProvider};
///
/// struct Offline;
///
/// #[async_trait]
/// impl RoutingProvider for Offline {
///     async fn directions(
///         &self,
///         _request: &DirectionsRequest,
///     ) -> Result<Vec<ProviderRoute>, ProviderError> {
///         Err(ProviderError::Unavailable { reason: "offline".into() })
///     }
/// }
/// ```
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Return zero or more routes for `request`, best first.
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<Vec<ProviderRoute>, ProviderError>;
}

#[async_trait]
impl<T> RoutingProvider for Arc<T>
where
    T: RoutingProvider + ?Sized,
{
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<Vec<ProviderRoute>, ProviderError> {
        (**self).directions(request).await
    }
}
