// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the host platform API.
//!
//! Every request is credential-bearing: the session lives in a cookie, either
//! seeded from configuration or set by a successful login. Bodies are read
//! leniently; a missing or malformed body decodes as `{}`.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::api::types::{
    AccountsPayload, ConnectUrl, ConnectedAccount, Credentials, ErrorBody, ProviderUser,
    SelectionRequest, Session, StatusPayload,
};
use crate::error::Failure;
use crate::provider::ProviderSpec;

/// Install the process-wide rustls provider. Safe to call repeatedly.
pub fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Client for one host platform API base URL.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, session_cookie: Option<&str>, timeout: Option<Duration>) -> Self {
        ensure_crypto_provider();

        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            match HeaderValue::from_str(cookie) {
                Ok(val) => {
                    headers.insert(COOKIE, val);
                }
                Err(e) => tracing::warn!(err = %e, "ignoring malformed session cookie"),
            }
        }

        let mut builder = Client::builder().cookie_store(true).default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_default();

        Self { base_url: base_url.trim_end_matches('/').to_owned(), client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        req: RequestBuilder,
        operation: &'static str,
    ) -> Result<RawResponse, Failure> {
        let resp = req.send().await.map_err(|e| {
            tracing::debug!(operation, err = %e, "request failed");
            Failure::Unreachable
        })?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| {
            tracing::debug!(operation, err = %e, "failed to read response body");
            Failure::Unreachable
        })?;
        let body = serde_json::from_slice::<serde_json::Value>(&bytes).ok();
        tracing::debug!(operation, status = status.as_u16(), "response received");
        Ok(RawResponse { status, body })
    }

    /// `GET /api/v1/auth/user/detail`
    pub async fn user_detail(&self) -> Result<Session, Failure> {
        let req = self.client.get(self.url("/api/v1/auth/user/detail"));
        let resp = self.send(req, "session_probe").await?;
        if !resp.status.is_success() {
            return Err(resp.business_error());
        }
        resp.decode_strict().ok_or(Failure::Business(None))
    }

    /// `POST /api/v1/auth/public/login`
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, Failure> {
        let req = self.client.post(self.url("/api/v1/auth/public/login")).json(credentials);
        let resp = self.send(req, "login").await?;
        if !resp.status.is_success() {
            return Err(Failure::IncorrectCredentials);
        }
        resp.decode_strict().ok_or(Failure::Business(None))
    }

    /// Request the provider authorization URL to navigate to.
    pub async fn begin_connect(&self, spec: &ProviderSpec) -> Result<String, Failure> {
        let req = self.client.post(self.url(spec.begin_path));
        let resp = self.send(req, "begin_connect").await?;
        if resp.status == StatusCode::UNAUTHORIZED {
            return Err(Failure::ExpiredSession);
        }
        if !resp.status.is_success() {
            return Err(resp.business_error());
        }
        resp.decode::<ConnectUrl>()
            .url
            .filter(|url| !url.is_empty())
            .ok_or(Failure::Business(None))
    }

    pub async fn connection_status(&self, spec: &ProviderSpec) -> Result<StatusPayload, Failure> {
        let req = self.client.get(self.url(spec.status_path));
        let resp = self.send(req, "connection_status").await?;
        if !resp.status.is_success() {
            return Err(resp.business_error());
        }
        Ok(resp.decode())
    }

    /// Exchange a one-time authorization code. The code travels as `?token=`.
    pub async fn exchange_code(
        &self,
        spec: &ProviderSpec,
        code: &str,
    ) -> Result<ProviderUser, Failure> {
        let mut url = Url::parse(&self.url(spec.exchange_path)).map_err(|e| {
            tracing::warn!(err = %e, "invalid exchange url");
            Failure::Unreachable
        })?;
        url.query_pairs_mut().append_pair("token", code);
        let req = self.client.post(url);
        let resp = self.send(req, "exchange_code").await?;
        if !resp.status.is_success() {
            return Err(resp.business_error());
        }
        Ok(resp.decode())
    }

    /// Re-discover resources from the provider.
    pub async fn sync_resources(
        &self,
        spec: &ProviderSpec,
    ) -> Result<Vec<ConnectedAccount>, Failure> {
        let req = self.client.post(self.url(spec.resource_path));
        let resp = self.send(req, "sync_resources").await?;
        if !resp.status.is_success() {
            return Err(resp.business_error());
        }
        Ok(resp.decode::<AccountsPayload>().accounts.unwrap_or_default())
    }

    /// Fetch the already-known resources without re-discovery.
    pub async fn load_resources(
        &self,
        spec: &ProviderSpec,
    ) -> Result<Vec<ConnectedAccount>, Failure> {
        let req = self.client.get(self.url(spec.resource_path));
        let resp = self.send(req, "load_resources").await?;
        if !resp.status.is_success() {
            return Err(resp.business_error());
        }
        Ok(resp.decode::<AccountsPayload>().accounts.unwrap_or_default())
    }

    /// Persist the full desired selection (replace, not merge).
    pub async fn save_selection(
        &self,
        spec: &ProviderSpec,
        account_ids: Vec<String>,
    ) -> Result<(), Failure> {
        let body = SelectionRequest { account_ids };
        let req = self.client.patch(self.url(spec.resource_path)).json(&body);
        let resp = self.send(req, "save_selection").await?;
        if !resp.status.is_success() {
            return Err(resp.business_error());
        }
        Ok(())
    }

    /// Revoke the provider connection.
    pub async fn disconnect(&self, spec: &ProviderSpec) -> Result<(), Failure> {
        let req = self.client.delete(self.url(spec.disconnect_path));
        let resp = self.send(req, "disconnect").await?;
        if !resp.status.is_success() {
            return Err(resp.business_error());
        }
        Ok(())
    }
}

/// Status plus the body when it parsed as JSON.
struct RawResponse {
    status: StatusCode,
    body: Option<serde_json::Value>,
}

impl RawResponse {
    /// Decode, treating an unreadable body as `{}`.
    fn decode<T: DeserializeOwned + Default>(self) -> T {
        let value =
            self.body.unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Decode only when the body is a JSON object.
    fn decode_strict<T: DeserializeOwned>(self) -> Option<T> {
        match self.body {
            Some(value @ serde_json::Value::Object(_)) => serde_json::from_value(value).ok(),
            _ => None,
        }
    }

    fn business_error(&self) -> Failure {
        let message = self
            .body
            .clone()
            .and_then(|value| serde_json::from_value::<ErrorBody>(value).ok())
            .and_then(|body| body.message);
        Failure::Business(message)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
