use crate::error::{Result, ReviewError};
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(30);

pub fn client() -> Result<Client> {
    Ok(Client::builder()
        .timeout(TIMEOUT)
        .user_agent(concat!("review-bot/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Read a bearer token from the environment. Empty counts as unset.
pub fn token_from_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ReviewError::MissingToken(var.to_string())),
    }
}

/// `base` with `segments` appended, each percent-encoded as a path segment.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| ReviewError::InvalidConfig(format!("bad base url '{base}': {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ReviewError::InvalidConfig(format!("not a hierarchical url: '{base}'")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-2xx response into `ReviewError::Api`.
pub fn check(service: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(ReviewError::Api {
        service: service.to_string(),
        status: status.as_u16(),
        body,
    })
}
