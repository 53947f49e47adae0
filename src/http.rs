//! HTTP helpers shared by the session source and the API proxy. Both build their
//! `reqwest` client here so the user agent and timeout policy stay consistent.
//! The helpers never store credentials; callers attach cookies or tokens per
//! request.

use crate::{error::Result, APP_USER_AGENT};
use reqwest::Client;
use std::time::Duration;

/// Default request timeout (milliseconds) applied to every client.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Maximum number of error body characters kept in an `Error::Http`.
const MAX_ERROR_CHARS: usize = 200;

/// Builds a client with the crate user agent and the given timeout.
///
/// # Errors
/// Returns `Error::Config` if the TLS backend cannot be initialized.
pub fn client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(APP_USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Returns `<base>/<path>`. Only the base is normalized (trimmed, trailing `/`
/// removed); the path is appended exactly as given.
#[must_use]
pub fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    format!("{base}/{path}")
}

/// Trims and truncates an error body so it can be carried in an error message.
#[must_use]
pub fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
