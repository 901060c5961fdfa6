//! Error types shared across the engine.
//!
//! Only [`InputError`] is allowed to reach callers of the public services.
//! [`ProviderError`] and [`ScoreError`] describe collaborator failures that
//! the services recover from locally.

use thiserror::Error;

/// Malformed input rejected before any work is done.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// A latitude or longitude was `NaN` or infinite.
    #[error("coordinate ({x}, {y}) is not finite")]
    NonFiniteCoordinate {
        /// Longitude as supplied.
        x: f64,
        /// Latitude as supplied.
        y: f64,
    },
    /// Latitude outside `-90.0..=90.0`.
    #[error("latitude {lat} is outside -90..=90")]
    LatitudeOutOfRange {
        /// Latitude as supplied.
        lat: f64,
    },
    /// Longitude outside `-180.0..=180.0`.
    #[error("longitude {lng} is outside -180..=180")]
    LongitudeOutOfRange {
        /// Longitude as supplied.
        lng: f64,
    },
    /// The northern edge is not above the southern edge, or the eastern edge
    /// is not east of the western edge.
    #[error("bounds are inverted or empty (north {north}, south {south}, east {east}, west {west})")]
    InvalidBounds {
        /// Northern latitude.
        north: f64,
        /// Southern latitude.
        south: f64,
        /// Eastern longitude.
        east: f64,
        /// Western longitude.
        west: f64,
    },
    /// Map zoom was negative or not finite.
    #[error("zoom level {zoom} is invalid")]
    InvalidZoom {
        /// Zoom as supplied.
        zoom: f64,
    },
    /// Origin and destination resolve to the same point.
    #[error("origin and destination are identical")]
    IdenticalEndpoints,
    /// A safety threshold outside `0.0..=100.0`.
    #[error("safety threshold {value} is outside 0..=100")]
    InvalidThreshold {
        /// Threshold as supplied.
        value: f64,
    },
}

/// Failures reported by external collaborators.
///
/// Mirrors the shape of an HTTP client failure so adapters can map their
/// transport errors directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The request could not reach the service.
    #[error("network error contacting {url}: {message}")]
    NetworkError {
        /// Requested URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}: {message}")]
    HttpError {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The service answered but reported a failure code.
    #[error("service error {code}: {message}")]
    ServiceError {
        /// Service status code, e.g. `"NoRoute"`.
        code: String,
        /// Service message.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse response: {message}")]
    ParseError {
        /// Decoder error description.
        message: String,
    },
    /// The collaborator is not configured or refused to answer.
    #[error("provider unavailable: {reason}")]
    Unavailable {
        /// Why the provider cannot answer.
        reason: String,
    },
}

/// Errors returned by [`crate::PreciseScore`] implementations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// The coordinate was rejected.
    #[error(transparent)]
    InvalidInput(#[from] InputError),
    /// A collaborator failed and the implementation chose not to recover.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn score_error_wraps_input_error_transparently() {
        let err = ScoreError::from(InputError::LatitudeOutOfRange { lat: 91.0 });
        assert_eq!(err.to_string(), "latitude 91 is outside -90..=90");
    }

    #[rstest]
    fn provider_timeout_message_names_url() {
        let err = ProviderError::Timeout {
            url: "http://localhost:5000/route".to_owned(),
            timeout_secs: 30,
        };
        assert!(err.to_string().contains("http://localhost:5000/route"));
    }
}
