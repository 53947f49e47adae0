//! Remote session endpoint. `SessionSource` is the seam the state service talks
//! to; `HttpSessionSource` implements it over `reqwest` with the configured
//! session cookie. The cookie is a credential and is never logged.

use crate::{
    error::{Error, Result},
    http,
    session::snapshot::SessionSnapshot,
};
use async_trait::async_trait;
use reqwest::{header::COOKIE, Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument};

pub const AUTHINFO_PATH: &str = "api/authinfo";
pub const LOGOUT_PATH: &str = "logout";
pub const BACKGROUND_REFRESH_PATH: &str = "api/background-refresh";

/// Outcome of a logout request that reached the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogoutStatus {
    /// 2xx: the server ended the session.
    LoggedOut,
    /// 401/403: there was no session to end.
    AlreadyLoggedOut,
    /// Any other status; local state must stay untouched.
    Rejected(u16),
}

impl LogoutStatus {
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::LoggedOut,
            401 | 403 => Self::AlreadyLoggedOut,
            other => Self::Rejected(other),
        }
    }

    /// Both a fresh logout and an already-ended session clear local state.
    #[must_use]
    pub const fn clears_session(self) -> bool {
        matches!(self, Self::LoggedOut | Self::AlreadyLoggedOut)
    }
}

#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Fetches the current snapshot. `Ok(None)` means there is no session.
    async fn fetch(&self) -> Result<Option<SessionSnapshot>>;

    /// Ends the session on the server.
    async fn logout(&self) -> Result<LogoutStatus>;

    /// Whether the server keeps refreshing the session's authorization in the
    /// background.
    async fn background_refresh_status(&self) -> Result<bool>;

    /// Turns background refresh on (`true`) or off (`false`). Only a `200`
    /// counts as success.
    async fn set_background_refresh(&self, enabled: bool) -> Result<()>;
}

pub struct HttpSessionSource {
    client: Client,
    base_url: String,
    cookie: Option<SecretString>,
}

impl HttpSessionSource {
    /// Builds a source for the session endpoint at `base_url`.
    ///
    /// # Errors
    /// Returns `Error::Config` if the base URL is empty or the client cannot be built.
    pub fn new(base_url: &str, cookie: Option<SecretString>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(Error::Config("Session endpoint is not configured.".to_string()));
        }

        Ok(Self {
            client: http::client(timeout)?,
            base_url: base_url.to_string(),
            cookie,
        })
    }

    fn with_cookie(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie.expose_secret()),
            None => builder,
        }
    }
}

#[async_trait]
impl SessionSource for HttpSessionSource {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch(&self) -> Result<Option<SessionSnapshot>> {
        let url = http::build_url_with_base(&self.base_url, AUTHINFO_PATH);
        let response = self.with_cookie(self.client.get(&url)).send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT || status == StatusCode::UNAUTHORIZED {
            debug!("no active session: {}", status);
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: http::sanitize_body(&body),
            });
        }

        response
            .json::<Option<SessionSnapshot>>()
            .await
            .map_err(|err| Error::Parse(format!("Failed to decode session: {err}")))
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn logout(&self) -> Result<LogoutStatus> {
        let url = http::build_url_with_base(&self.base_url, LOGOUT_PATH);
        let response = self.with_cookie(self.client.post(&url)).send().await?;
        let status = LogoutStatus::from_status(response.status().as_u16());

        debug!("logout status: {:?}", status);

        Ok(status)
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn background_refresh_status(&self) -> Result<bool> {
        let url = http::build_url_with_base(&self.base_url, BACKGROUND_REFRESH_PATH);
        let response = self.with_cookie(self.client.get(&url)).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: http::sanitize_body(&body),
            });
        }

        response
            .json::<bool>()
            .await
            .map_err(|err| Error::Parse(format!("Failed to decode background refresh: {err}")))
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn set_background_refresh(&self, enabled: bool) -> Result<()> {
        let url = http::build_url_with_base(&self.base_url, BACKGROUND_REFRESH_PATH);
        let request = if enabled {
            self.client.post(&url)
        } else {
            self.client.delete(&url)
        };
        let response = self.with_cookie(request).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: http::sanitize_body(&body),
            });
        }

        debug!("background refresh set to {}", enabled);
        Ok(())
    }
}
