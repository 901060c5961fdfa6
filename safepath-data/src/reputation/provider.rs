use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;
use reqwest::Client;
use safepath_core::{AreaReport, ProviderError, ReputationProvider};
use url::Url;

use crate::ProviderBuildError;
use crate::http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, build_client, get_json, join_segments, parse_base_url};

/// Configuration for [`HttpReputationProvider`].
#[derive(Clone)]
pub struct HttpReputationProviderConfig {
    /// Base URL for the reputation service.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Bearer token sent with every request, if any.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for HttpReputationProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpReputationProviderConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for HttpReputationProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_owned(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            api_key: None,
        }
    }
}

impl HttpReputationProviderConfig {
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

    /// Authenticate with a bearer token.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Reputation provider backed by a JSON HTTP service.
#[derive(Debug, Clone)]
pub struct HttpReputationProvider {
    client: Client,
    base_url: Url,
    config: HttpReputationProviderConfig,
}

impl HttpReputationProvider {
    /// Create a provider for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpReputationProviderConfig::new(base_url))
    }

    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn with_config(config: HttpReputationProviderConfig) -> Result<Self, ProviderBuildError> {
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
    pub const fn config(&self) -> &HttpReputationProviderConfig {
        &self.config
    }

    /// URL queried for `point`.
    #[must_use]
    pub fn request_url(&self, point: Coord<f64>) -> Url {
        let mut url = join_segments(&self.base_url, ["v1", "area"]);
        url.query_pairs_mut()
            .append_pair("lat", &point.y.to_string())
            .append_pair("lng", &point.x.to_string());
        url
    }
}

#[async_trait]
impl ReputationProvider for HttpReputationProvider {
    async fn analyse(&self, point: Coord<f64>) -> Result<AreaReport, ProviderError> {
        let url = self.request_url(point);
        log::debug!("requesting area reputation: {url}");
        let report: AreaReport = get_json(
            &self.client,
            url,
            self.config.api_key.as_deref(),
            self.config.timeout,
        )
        .await?;
        if !report.score.is_finite() || !report.confidence.is_finite() {
            return Err(ProviderError::ParseError {
                message: "area report carries a non-finite score".to_owned(),
            });
        }
        Ok(report)
    }
}
