//! `RoutingProvider` over OSRM's Route and Trip services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use safepath_core::{DirectionsRequest, ProviderError, ProviderRoute, RoutingProvider, TravelMode};
use url::Url;

use super::response::RouteResponse;
use crate::ProviderBuildError;
use crate::http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, build_client, get_json, join_segments, parse_base_url};

/// Configuration for [`OsrmRoutingProvider`].
#[derive(Debug, Clone)]
pub struct OsrmRoutingProviderConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for OsrmRoutingProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_owned(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl OsrmRoutingProviderConfig {
    /// Create a configuration for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// OSRM profile used for a travel mode.
///
/// OSRM has no public transport profile, so transit requests are routed on
/// the road network.
#[must_use]
pub const fn profile_for(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Walking => "foot",
        TravelMode::Bicycling => "bike",
        TravelMode::Driving | TravelMode::Transit => "driving",
    }
}

/// Routing provider backed by an OSRM HTTP service.
///
/// Point-to-point requests use the Route service with alternatives when
/// asked. Requests whose waypoints may be reordered use the Trip service
/// with the first and last coordinates pinned.
#[derive(Debug, Clone)]
pub struct OsrmRoutingProvider {
    client: Client,
    base_url: Url,
    config: OsrmRoutingProviderConfig,
}

impl OsrmRoutingProvider {
    /// Create a provider for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(OsrmRoutingProviderConfig::new(base_url))
    }

    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn with_config(config: OsrmRoutingProviderConfig) -> Result<Self, ProviderBuildError> {
        let base_url = parse_base_url(&config.base_url)?;
        let client = build_client(config.timeout, &config.user_agent)?;
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &OsrmRoutingProviderConfig {
        &self.config
    }

    /// URL for `request`.
    ///
    /// Format: `{base}/{route|trip}/v1/{profile}/{lng,lat;...}?{options}`.
    #[must_use]
    pub fn request_url(&self, request: &DirectionsRequest) -> Url {
        let trip = request.optimise_waypoints && !request.waypoints.is_empty();
        let service = if trip { "trip" } else { "route" };
        let coordinates = request
            .coordinates()
            .iter()
            .map(|c| format!("{},{}", c.x, c.y))
            .collect::<Vec<_>>()
            .join(";");
        let mut url = join_segments(
            &self.base_url,
            [service, "v1", profile_for(request.travel_mode), &coordinates],
        );
        {
            let mut query = url.query_pairs_mut();
            if trip {
                query
                    .append_pair("source", "first")
                    .append_pair("destination", "last")
                    .append_pair("roundtrip", "false");
            } else {
                query.append_pair("alternatives", bool_param(request.alternatives));
            }
            query
                .append_pair("steps", "true")
                .append_pair("geometries", "polyline")
                .append_pair("overview", "full");
        }
        url
    }
}

const fn bool_param(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[async_trait]
impl RoutingProvider for OsrmRoutingProvider {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<Vec<ProviderRoute>, ProviderError> {
        let url = self.request_url(request);
        log::debug!("requesting OSRM directions: {url}");
        let response: RouteResponse =
            get_json(&self.client, url, None, self.config.timeout).await?;
        response.into_routes()
    }
}
