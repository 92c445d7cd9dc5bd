// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for the host platform API.

use std::fmt;

use serde::{Deserialize, Serialize};

mod lenient;

/// Authenticated host-platform user. Opaque beyond the identity fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Session {
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        parts.join(" ")
    }
}

/// Login form body. The remote API expects capitalised keys.
#[derive(Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Password")]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `POST /api/v1/connect/user/{provider}` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectUrl {
    #[serde(default)]
    pub url: Option<String>,
}

/// Raw connection status as reported by the remote API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
///
/// Each field is read on its own: a display field of the wrong type reads as
/// absent instead of discarding the whole payload.
pub struct StatusPayload {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_connected: bool,
    #[serde(default, deserialize_with = "lenient::option")]
    pub connection_status: Option<String>,
    #[serde(
        default,
        alias = "meta_user_name",
        alias = "google_user_name",
        deserialize_with = "lenient::option"
    )]
    pub provider_user_name: Option<String>,
    #[serde(
        default,
        alias = "meta_user_id",
        alias = "google_user_id",
        deserialize_with = "lenient::id"
    )]
    pub provider_user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::days")]
    pub days_until_expiry: Option<i64>,
    #[serde(
        default,
        alias = "active_pages",
        alias = "active_locations",
        alias = "active_accounts",
        deserialize_with = "lenient::option"
    )]
    pub active_resource_count: Option<u32>,
}

/// Provider-side identity returned by a successful code exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    #[serde(
        default,
        alias = "meta_user_name",
        alias = "google_user_name",
        deserialize_with = "lenient::option"
    )]
    pub provider_user_name: Option<String>,
    #[serde(
        default,
        alias = "meta_user_id",
        alias = "google_user_id",
        deserialize_with = "lenient::id"
    )]
    pub provider_user_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A page or location exposed by a provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedAccount {
    /// Numeric ids are kept as their decimal text.
    #[serde(deserialize_with = "lenient::required_id")]
    pub account_id: String,
    #[serde(default, deserialize_with = "lenient::option")]
    pub account_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_active: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option"
    )]
    pub account_token: Option<String>,
}

impl ConnectedAccount {
    pub fn display_name(&self) -> &str {
        match self.account_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.account_id,
        }
    }
}

impl fmt::Debug for ConnectedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedAccount")
            .field("account_id", &self.account_id)
            .field("account_name", &self.account_name)
            .field("platform", &self.platform)
            .field("is_active", &self.is_active)
            .field("account_token", &self.account_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Resource discovery/load response. Malformed entries are skipped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountsPayload {
    #[serde(default, deserialize_with = "lenient::accounts")]
    pub accounts: Option<Vec<ConnectedAccount>>,
}

/// Selection save body: the full desired set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    pub account_ids: Vec<String>,
}

/// Error envelope; only `message` is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
