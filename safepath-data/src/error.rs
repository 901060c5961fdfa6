//! Construction errors for the HTTP adapters.

use thiserror::Error;

/// Reasons an HTTP adapter could not be built.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// The HTTP client rejected its configuration.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    /// The base URL does not parse.
    #[error("invalid base URL {url:?}")]
    InvalidBaseUrl {
        /// URL as configured.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The base URL cannot carry a path, e.g. `mailto:` or `data:` URLs.
    #[error("base URL {url:?} cannot carry a path")]
    CannotBeABase {
        /// URL as configured.
        url: String,
    },
}
