use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::rchain::provider::{ProviderError, ProviderKind};

#[derive(Debug)]
pub(crate) enum RequestFailure {
    Request(reqwest::Error),
    Api { status: StatusCode, body: String },
}

impl RequestFailure {
    pub(crate) fn into_provider_error(self, provider: ProviderKind) -> ProviderError {
        match self {
            Self::Request(source) => ProviderError::Request { provider, source },
            Self::Api { status, body } => ProviderError::Api {
                provider,
                status,
                body,
            },
        }
    }
}

/// Joins a base URL and an endpoint path without doubling slashes.
pub(crate) fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Posts one JSON request and decodes the JSON reply. Failures are returned
/// as-is; there is no retry.
pub(crate) async fn post_json<T, R>(
    client: &reqwest::Client,
    url: &str,
    api_key: Option<&str>,
    payload: &T,
    timeout_secs: Option<u64>,
) -> Result<R, RequestFailure>
where
    T: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut request = client.post(url).json(payload);
    if let Some(api_key) = api_key {
        request = request.bearer_auth(api_key);
    }
    if let Some(timeout_secs) = timeout_secs {
        request = request.timeout(Duration::from_secs(timeout_secs));
    }

    let started = Instant::now();
    let response = request.send().await.map_err(RequestFailure::Request)?;
    let status = response.status();
    debug!(%url, %status, latency_ms = started.elapsed().as_millis() as u64, "upstream responded");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RequestFailure::Api { status, body });
    }

    response.json().await.map_err(RequestFailure::Request)
}
