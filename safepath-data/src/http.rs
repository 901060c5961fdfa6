//! Client construction and error mapping shared by the adapters.

use std::time::Duration;

use reqwest::Client;
use safepath_core::ProviderError;
use serde::de::DeserializeOwned;
use url::Url;

use crate::ProviderBuildError;

/// Default user agent for outgoing requests.
pub const DEFAULT_USER_AGENT: &str = "safepath-engine/0.1";

/// Default request timeout.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn build_client(
    timeout: Duration,
    user_agent: &str,
) -> Result<Client, ProviderBuildError> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .map_err(ProviderBuildError::HttpClient)
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ProviderBuildError> {
    let url = Url::parse(raw).map_err(|source| ProviderBuildError::InvalidBaseUrl {
        url: raw.to_owned(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ProviderBuildError::CannotBeABase {
            url: raw.to_owned(),
        });
    }
    Ok(url)
}

/// `base` with `segments` appended to its path.
pub(crate) fn join_segments<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Url {
    let mut url = base.clone();
    // Base URLs are checked at construction, so this always succeeds.
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// GET `url` and decode a JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
    bearer: Option<&str>,
    timeout: Duration,
) -> Result<T, ProviderError> {
    let label = url.to_string();
    let mut request = client.get(url);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    let response = request
        .send()
        .await
        .map_err(|err| convert_reqwest_error(&err, &label, timeout))?
        .error_for_status()
        .map_err(|err| convert_reqwest_error(&err, &label, timeout))?;
    response
        .json()
        .await
        .map_err(|err| ProviderError::ParseError {
            message: err.to_string(),
        })
}

pub(crate) fn convert_reqwest_error(
    error: &reqwest::Error,
    url: &str,
    timeout: Duration,
) -> ProviderError {
    if error.is_timeout() {
        return ProviderError::Timeout {
            url: url.to_owned(),
            timeout_secs: timeout.as_secs(),
        };
    }
    if let Some(status) = error.status() {
        return ProviderError::HttpError {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }
    ProviderError::NetworkError {
        url: url.to_owned(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://osrm.test", "http://osrm.test/route/v1")]
    #[case("http://osrm.test/", "http://osrm.test/route/v1")]
    #[case("http://gateway.test/osrm/", "http://gateway.test/osrm/route/v1")]
    fn segments_extend_the_base_path(#[case] base: &str, #[case] expected: &str) {
        let base = parse_base_url(base).expect("valid base");
        assert_eq!(join_segments(&base, ["route", "v1"]).as_str(), expected);
    }

    #[rstest]
    fn unparsable_base_urls_are_rejected() {
        let err = parse_base_url("not a url").expect_err("should fail");
        assert!(matches!(err, ProviderBuildError::InvalidBaseUrl { .. }));
    }

    #[rstest]
    fn opaque_base_urls_are_rejected() {
        let err = parse_base_url("mailto:ops@example.com").expect_err("should fail");
        assert!(matches!(err, ProviderBuildError::CannotBeABase { .. }));
    }
}
