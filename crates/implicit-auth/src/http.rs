//! Fire-and-forget GET helper for downstream API calls
//!
//! Not used by the session itself; it exists for calling the provider's API
//! with the token once the session is ready. The completion callback runs
//! exactly once with the raw response body. There is no retry, no timeout
//! and no separate error callback: non-2xx bodies are delivered as they are,
//! and a transport failure completes with an empty body.
//!
//! Must be called from within a tokio runtime.

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::query::build_query;

/// Issue a GET to `url` (plus `params` as a query string, if given) and hand
/// the response body to `on_complete`.
///
/// The returned handle can be awaited or aborted; aborting before completion
/// means `on_complete` never runs.
pub fn http_get<F>(
    client: &reqwest::Client,
    url: &str,
    params: Option<&[(&str, &str)]>,
    on_complete: F,
) -> JoinHandle<()>
where
    F: FnOnce(String) + Send + 'static,
{
    spawn_get(client, url, params, None, on_complete)
}

/// [`http_get`] with an `Authorization` header, typically the value of
/// `AuthSession::authorization_header()`.
pub fn http_get_authorized<F>(
    client: &reqwest::Client,
    url: &str,
    params: Option<&[(&str, &str)]>,
    authorization: &str,
    on_complete: F,
) -> JoinHandle<()>
where
    F: FnOnce(String) + Send + 'static,
{
    spawn_get(
        client,
        url,
        params,
        Some(authorization.to_owned()),
        on_complete,
    )
}

fn spawn_get<F>(
    client: &reqwest::Client,
    url: &str,
    params: Option<&[(&str, &str)]>,
    authorization: Option<String>,
    on_complete: F,
) -> JoinHandle<()>
where
    F: FnOnce(String) + Send + 'static,
{
    let url = match params {
        Some(params) => build_query(url, params),
        None => url.to_owned(),
    };
    let client = client.clone();

    tokio::spawn(async move {
        let body = fetch_body(&client, &url, authorization.as_deref()).await;
        on_complete(body);
    })
}

async fn fetch_body(client: &reqwest::Client, url: &str, authorization: Option<&str>) -> String {
    let endpoint = redact_query(url);
    let mut request = client.get(url);
    if let Some(value) = authorization {
        request = request.header(reqwest::header::AUTHORIZATION, value);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            // reqwest errors carry the full URL, query included.
            let e = e.without_url();
            warn!(endpoint, error = %e, "GET request failed");
            return String::new();
        }
    };

    let status = response.status();
    if !status.is_success() {
        debug!(endpoint, %status, "GET completed with non-success status");
    }

    response.text().await.unwrap_or_else(|e| {
        let e = e.without_url();
        warn!(endpoint, error = %e, "failed to read response body");
        String::new()
    })
}

/// URL without its query string; query parameters may carry credentials.
fn redact_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
