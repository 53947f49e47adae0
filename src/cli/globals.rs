use crate::{
    proxy::ApiProxyService,
    session::{HttpSessionSource, LogNavigator, SessionStateService},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};

/// Endpoint settings shared by every action.
#[derive(Clone)]
pub struct GlobalArgs {
    pub session_url: String,
    pub session_cookie: Option<SecretString>,
    pub api_url: String,
    pub timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(session_url: String, api_url: String, timeout: Duration) -> Self {
        Self {
            session_url,
            session_cookie: None,
            api_url,
            timeout,
        }
    }

    pub fn set_session_cookie(&mut self, cookie: Option<SecretString>) {
        self.session_cookie = cookie;
    }

    /// # Errors
    /// Returns an error if the session HTTP client cannot be built.
    pub fn session_service(&self) -> Result<SessionStateService> {
        let source = HttpSessionSource::new(
            &self.session_url,
            self.session_cookie.clone(),
            self.timeout,
        )
        .context("failed to build session endpoint client")?;

        Ok(SessionStateService::new(
            Arc::new(source),
            Arc::new(LogNavigator),
        ))
    }

    /// # Errors
    /// Returns an error if the API HTTP client cannot be built.
    pub fn proxy_service(&self) -> Result<ApiProxyService> {
        ApiProxyService::new(&self.api_url, self.timeout).context("failed to build API client")
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("session_url", &self.session_url)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "***"),
            )
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn globals() -> GlobalArgs {
        GlobalArgs::new(
            "http://localhost:8080".to_string(),
            "https://api.guildwars2.com".to_string(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_global_args() {
        let mut args = globals();
        assert!(args.session_cookie.is_none());

        args.set_session_cookie(Some(SecretString::from("SESSION=abc".to_string())));
        assert_eq!(
            args.session_cookie.as_ref().map(|c| c.expose_secret().to_string()),
            Some("SESSION=abc".to_string())
        );
    }

    #[test]
    fn debug_redacts_cookie() {
        let mut args = globals();
        args.set_session_cookie(Some(SecretString::from("SESSION=abc".to_string())));

        let rendered = format!("{args:?}");
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("SESSION=abc"));
    }

    #[tokio::test]
    async fn builds_services() {
        let args = globals();
        let session = args.session_service();
        assert!(session.is_ok());
        assert!(session.is_ok_and(|s| !s.has_fetched_once()));

        let proxy = args.proxy_service();
        assert_eq!(
            proxy.ok().map(|p| p.base_url().to_string()),
            Some("https://api.guildwars2.com".to_string())
        );
    }
}
