//! Authenticated pass-through calls to the third-party API. Every outcome is
//! folded into diagnostic text, so callers always receive a displayable value.
//! Access tokens travel only in the query string and are never logged.

pub mod query;
pub mod render;
pub mod totals;

pub use self::{
    query::{collect_params, QueryParam},
    render::{render, ProxyResponse},
    totals::{AccountTotals, CurrencyTotals},
};

use crate::{
    error::{Error, Result},
    http,
    session::SessionStateService,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{collections::BTreeMap, time::Duration};
use tracing::{debug, instrument, warn};

pub const DEFAULT_API_BASE_URL: &str = "https://api.guildwars2.com";
/// Query parameter that carries the account token.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

#[derive(Clone)]
pub struct ApiProxyService {
    client: Client,
    base_url: String,
}

impl ApiProxyService {
    /// # Errors
    /// Returns `Error::Config` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            base_url: base_url.trim().to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues `GET <base>/<path>` and renders the outcome. The token, when given,
    /// replaces any caller-supplied `access_token`.
    #[instrument(skip(self, query, account_token), fields(path = %path))]
    pub async fn call_api(
        &self,
        path: &str,
        query: &BTreeMap<String, String>,
        account_token: Option<&str>,
    ) -> String {
        let response = match self.request(path, query, account_token).send().await {
            Ok(response) => {
                debug!("api responded: {}", response.status());
                ProxyResponse::capture(response).await
            }
            Err(err) => {
                let err = err.without_url();
                warn!("api call failed: {}", err);
                ProxyResponse::transport_failure(err.to_string())
            }
        };

        render(&response)
    }

    /// Issues the same request as `call_api` but decodes a successful JSON body
    /// instead of rendering it.
    ///
    /// # Errors
    /// Returns `Error::Http` for non-2xx responses, `Error::Parse` for bodies
    /// that do not decode, and network errors from the transport.
    #[instrument(skip(self, query, account_token), fields(path = %path))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &BTreeMap<String, String>,
        account_token: Option<&str>,
    ) -> Result<T> {
        let response = self
            .request(path, query, account_token)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: http::sanitize_body(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| Error::Parse(format!("Failed to decode {path}: {}", err.without_url())))
    }

    fn request(
        &self,
        path: &str,
        query: &BTreeMap<String, String>,
        account_token: Option<&str>,
    ) -> RequestBuilder {
        let url = http::build_url_with_base(&self.base_url, path);
        let mut params = query.clone();
        if let Some(token) = account_token {
            params.insert(ACCESS_TOKEN_PARAM.to_string(), token.to_string());
        }

        self.client.get(&url).query(&params)
    }

    /// Resolves the account's token from a fresh session snapshot and calls the
    /// API with it. Without a session or token the call goes out unauthenticated.
    pub async fn call_api_for_account(
        &self,
        session: &SessionStateService,
        account_id: &str,
        path: &str,
        query: &BTreeMap<String, String>,
    ) -> String {
        let snapshot = session.fresh_session().await;
        let token = snapshot
            .as_deref()
            .and_then(|snapshot| snapshot.token_for(account_id))
            .map(str::to_string);

        if token.is_none() {
            debug!("no token for account {}, calling without one", account_id);
        }

        self.call_api(path, query, token.as_deref()).await
    }
}
