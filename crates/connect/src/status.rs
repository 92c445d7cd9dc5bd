// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection status resolution.
//!
//! Maps the raw remote status payload into a small internal state plus the
//! display facts derived from it. The mapping is pure and shared by every
//! provider; only [`resolve`] touches the network.

use serde::{Deserialize, Serialize};

use crate::api::types::StatusPayload;
use crate::api::ApiClient;
use crate::connection::ProviderState;
use crate::provider::ProviderSpec;

/// Days at or below which the expiry warning is urgent.
const URGENT_EXPIRY_DAYS: i64 = 3;

/// Days at or below which an informational expiry warning is shown.
const INFORMATIONAL_EXPIRY_DAYS: i64 = 10;

/// Remote connection state. Only meaningful while connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Active,
    NeedsReauth,
    Revoked,
}

impl ConnectionState {
    /// Parse `connection_status`. Anything unrecognised counts as active.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("needs_reauth") => Self::NeedsReauth,
            Some("revoked") => Self::Revoked,
            _ => Self::Active,
        }
    }
}

/// Derived connection status. Always re-derivable from the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub is_connected: bool,
    pub connection_state: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_expiry: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_resource_count: Option<u32>,
}

impl ConnectionStatus {
    pub fn expiry_warning(&self) -> Option<ExpiryWarning> {
        ExpiryWarning::from_days(self.days_until_expiry)
    }
}

/// Token expiry warning level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryWarning {
    Urgent { days: i64 },
    Informational { days: i64 },
}

impl ExpiryWarning {
    /// Zero and absent both mean "no warning".
    pub fn from_days(days: Option<i64>) -> Option<Self> {
        match days {
            None | Some(0) => None,
            Some(days) if days <= URGENT_EXPIRY_DAYS => Some(Self::Urgent { days }),
            Some(days) if days <= INFORMATIONAL_EXPIRY_DAYS => Some(Self::Informational { days }),
            Some(_) => None,
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::Urgent { .. })
    }

    pub fn label(&self) -> String {
        match *self {
            Self::Urgent { days } => {
                let unit = if days == 1 { "day" } else { "days" };
                format!("Token expires in {days} {unit} - reconnect soon")
            }
            Self::Informational { days } => format!("Token expires in {days} days"),
        }
    }
}

/// Map a remote payload into a status. `None` means "treat as idle".
///
/// A revoked connection is fully cleared; a connection needing reauth keeps
/// its payload since it still carries identity and expiry facts.
pub fn resolve_payload(payload: &StatusPayload) -> Option<ConnectionStatus> {
    if !payload.is_connected {
        return None;
    }
    let connection_state = ConnectionState::parse(payload.connection_status.as_deref());
    if connection_state == ConnectionState::Revoked {
        return None;
    }
    Some(ConnectionStatus {
        is_connected: true,
        connection_state,
        provider_user_name: payload.provider_user_name.clone(),
        provider_user_id: payload.provider_user_id.clone(),
        days_until_expiry: payload.days_until_expiry,
        active_resource_count: payload.active_resource_count,
    })
}

/// Screen state a resolved status leads to.
pub fn screen_state(status: Option<&ConnectionStatus>) -> ProviderState {
    match status.map(|s| s.connection_state) {
        Some(ConnectionState::Active) => ProviderState::Manage,
        Some(ConnectionState::NeedsReauth) => ProviderState::NeedsReauth,
        Some(ConnectionState::Revoked) | None => ProviderState::Idle,
    }
}

/// Payload straight to screen state. A missing payload is a failed probe.
pub fn state_for(payload: Option<&StatusPayload>) -> ProviderState {
    screen_state(payload.and_then(resolve_payload).as_ref())
}

/// Probe the remote status. Any failure resolves to "not connected".
pub async fn resolve(api: &ApiClient, spec: &ProviderSpec) -> Option<ConnectionStatus> {
    match api.connection_status(spec).await {
        Ok(payload) => resolve_payload(&payload),
        Err(e) => {
            tracing::debug!(provider = %spec.kind, err = %e, "status probe failed, treating as idle");
            None
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
