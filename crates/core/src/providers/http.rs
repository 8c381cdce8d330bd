use reqwest::{redirect, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::errors::CoreError;

const USER_AGENT: &str = concat!("coinfolio/", env!("CARGO_PKG_VERSION"));

/// Client shared by all HTTP providers: bounded timeout, bounded redirects.
pub fn build_client(timeout: Duration, max_redirects: usize) -> Result<Client, CoreError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .redirect(redirect::Policy::limited(max_redirects))
        .build()
        .map_err(|e| CoreError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Send `request` and decode a JSON body.
///
/// 404 becomes `NotFound(what)`; every other non-success status, transport
/// error or timeout becomes `UpstreamUnavailable`.
pub async fn fetch_json<T: DeserializeOwned>(
    provider: &str,
    what: &str,
    request: RequestBuilder,
) -> Result<T, CoreError> {
    let response = request.send().await.map_err(|e| match CoreError::from(e) {
        CoreError::UpstreamUnavailable { message, .. } => {
            CoreError::upstream(provider, format!("{what}: {message}"))
        }
        other => other,
    })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(CoreError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        return Err(CoreError::upstream(provider, format!("HTTP {status} for {what}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| CoreError::upstream(provider, format!("Failed to parse response for {what}: {e}")))
}
