//! Construction of the collaborators each command talks to.

use std::sync::Arc;

use safepath_engine::{
    HttpReputationProvider, HttpReputationProviderConfig, OsrmRoutingProvider,
    OsrmRoutingProviderConfig, ReputationProvider, RoutingProvider, UnavailableReputationProvider,
};

use crate::CliError;

/// Where area reputation data comes from.
///
/// Without a base URL every score falls back to the local heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ReputationSettings {
    pub(crate) base_url: Option<String>,
    pub(crate) api_key: Option<String>,
}

/// Builds providers for the current invocation.
pub(crate) trait ProviderBuilder {
    fn reputation(
        &self,
        settings: &ReputationSettings,
    ) -> Result<Arc<dyn ReputationProvider>, CliError>;

    fn routing(&self, base_url: &str) -> Result<Arc<dyn RoutingProvider>, CliError>;
}

pub(crate) struct DefaultProviderBuilder;

impl ProviderBuilder for DefaultProviderBuilder {
    fn reputation(
        &self,
        settings: &ReputationSettings,
    ) -> Result<Arc<dyn ReputationProvider>, CliError> {
        let Some(base_url) = settings.base_url.as_deref() else {
            log::info!("no reputation service configured; scoring with local heuristics");
            return Ok(Arc::new(UnavailableReputationProvider));
        };
        let mut config = HttpReputationProviderConfig::new(base_url);
        if let Some(api_key) = settings.api_key.as_deref() {
            config = config.with_api_key(api_key);
        }
        let provider = HttpReputationProvider::with_config(config).map_err(|source| {
            CliError::BuildProvider {
                provider: "reputation",
                base_url: base_url.to_owned(),
                source,
            }
        })?;
        Ok(Arc::new(provider))
    }

    fn routing(&self, base_url: &str) -> Result<Arc<dyn RoutingProvider>, CliError> {
        let provider = OsrmRoutingProvider::with_config(OsrmRoutingProviderConfig::new(base_url))
            .map_err(|source| CliError::BuildProvider {
                provider: "routing",
                base_url: base_url.to_owned(),
                source,
            })?;
        Ok(Arc::new(provider))
    }
}

/// Default OSRM base URL used when none is configured.
pub(crate) fn default_osrm_base_url() -> String {
    OsrmRoutingProviderConfig::default().base_url
}
