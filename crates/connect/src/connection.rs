// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-provider connection state machine.
//!
//! One `ProviderConnection` exists per provider, parameterized by its
//! [`ProviderSpec`]. Every remote failure is caught here and turned into a
//! settled state plus an optional notice; callers never see a provider left
//! half-way through an operation.

use std::fmt;

use reqwest::Url;
use serde::Serialize;

use crate::api::types::ProviderUser;
use crate::api::ApiClient;
use crate::error::{Failure, Notice, BEGIN_CONNECT_MESSAGE, GENERIC_MESSAGE};
use crate::events::{ConnectEvent, EventSender};
use crate::provider::{ProviderKind, ProviderSpec};
use crate::redirect::AuthorizationCode;
use crate::resources::ResourceSet;
use crate::status::{self, ConnectionStatus};

/// Screen state of one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    /// Not connected, or revoked.
    Idle,
    /// Begin-connect or code exchange in flight.
    Loading,
    /// Just connected; resources were auto-synced.
    Success,
    /// Viewing an existing connection's resources.
    Manage,
    /// Connected, but the provider token must be refreshed.
    NeedsReauth,
}

impl ProviderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Manage => "manage",
            Self::NeedsReauth => "needs_reauth",
        }
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ProviderConnection {
    spec: ProviderSpec,
    state: ProviderState,
    status: Option<ConnectionStatus>,
    provider_user: Option<ProviderUser>,
    resources: ResourceSet,
    notice: Option<Notice>,
    events: EventSender,
}

impl ProviderConnection {
    pub fn new(spec: ProviderSpec, events: EventSender) -> Self {
        Self {
            spec,
            state: ProviderState::Idle,
            status: None,
            provider_user: None,
            resources: ResourceSet::new(spec),
            notice: None,
            events,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.spec.kind
    }

    pub fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    pub fn state(&self) -> ProviderState {
        self.state
    }

    pub fn status(&self) -> Option<&ConnectionStatus> {
        self.status.as_ref()
    }

    pub fn provider_user(&self) -> Option<&ProviderUser> {
        self.provider_user.as_ref()
    }

    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Surface a condition without changing state.
    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    fn transition(&mut self, next: ProviderState) {
        let prev = self.state;
        self.state = next;
        if prev != next {
            tracing::info!(provider = %self.spec.kind, %prev, %next, "provider state changed");
            let _ = self.events.send(ConnectEvent::StateChanged {
                provider: self.spec.kind,
                prev,
                next,
            });
        }
    }

    fn emit_resources(&self) {
        let _ = self.events.send(ConnectEvent::ResourcesReplaced {
            provider: self.spec.kind,
            count: self.resources.accounts().len(),
            selected: self.resources.selection().len(),
        });
    }

    /// Re-derive the screen from the remote status.
    ///
    /// An active connection goes straight to `manage` and loads its
    /// resources; a connection needing reauth keeps its status for display.
    /// A connection that is gone drops any resources loaded earlier.
    pub async fn reconcile(&mut self, api: &ApiClient) {
        self.status = status::resolve(api, &self.spec).await;
        let next = status::screen_state(self.status.as_ref());
        match next {
            ProviderState::Manage => {
                if self.resources.load(api).await.is_ok() {
                    self.emit_resources();
                }
            }
            ProviderState::Idle if !self.resources.accounts().is_empty() => {
                self.resources.clear();
                self.emit_resources();
            }
            _ => {}
        }
        self.transition(next);
    }

    /// Ask for the provider authorization URL. On success the state stays
    /// `loading` and the caller must navigate away.
    pub async fn begin_connect(&mut self, api: &ApiClient) -> Result<Url, Failure> {
        self.notice = None;
        self.transition(ProviderState::Loading);

        let result = api.begin_connect(&self.spec).await.and_then(|raw| {
            Url::parse(&raw).map_err(|e| {
                tracing::warn!(provider = %self.spec.kind, err = %e, "unparsable authorization url");
                Failure::Business(None)
            })
        });
        match result {
            Ok(url) => {
                tracing::info!(provider = %self.spec.kind, "authorization url issued");
                Ok(url)
            }
            Err(Failure::ExpiredSession) => {
                self.transition(ProviderState::Idle);
                Err(Failure::ExpiredSession)
            }
            Err(failure) => {
                tracing::warn!(provider = %self.spec.kind, err = %failure, "begin connect failed");
                self.notice = Some(Notice::failed(failure.clone(), BEGIN_CONNECT_MESSAGE));
                self.transition(ProviderState::Idle);
                Err(failure)
            }
        }
    }

    /// Trade the one-time code for a connection, then sync every resource
    /// as selected. The code is consumed whatever the outcome.
    pub async fn exchange_code(
        &mut self,
        api: &ApiClient,
        code: AuthorizationCode,
    ) -> Result<(), Failure> {
        self.notice = None;
        self.transition(ProviderState::Loading);

        let user = match api.exchange_code(&self.spec, &code.into_inner()).await {
            Ok(user) => user,
            Err(failure) => {
                tracing::warn!(provider = %self.spec.kind, err = %failure, "code exchange failed");
                self.notice = Some(Notice::failed(failure.clone(), GENERIC_MESSAGE));
                self.transition(ProviderState::Idle);
                return Err(failure);
            }
        };
        tracing::info!(
            provider = %self.spec.kind,
            user = user.provider_user_name.as_deref().unwrap_or_default(),
            "provider connected"
        );
        self.provider_user = Some(user);

        if self.resources.sync(api, true).await.is_ok() {
            self.emit_resources();
        }
        self.status = status::resolve(api, &self.spec).await;
        self.transition(ProviderState::Success);
        Ok(())
    }

    /// Open the manage view of an existing connection.
    pub async fn open_manage(&mut self, api: &ApiClient) {
        self.notice = None;
        self.transition(ProviderState::Manage);
        if self.resources.load(api).await.is_ok() {
            self.emit_resources();
        }
    }

    /// Return to the idle screen. Status and resources are kept.
    pub fn back(&mut self) {
        self.notice = None;
        self.transition(ProviderState::Idle);
    }

    /// Re-discover resources, seeding selection from server activity.
    pub async fn resync(&mut self, api: &ApiClient) -> Result<(), Failure> {
        self.resources.sync(api, false).await?;
        self.emit_resources();
        Ok(())
    }

    pub fn toggle(&mut self, account_id: &str) -> bool {
        self.resources.toggle(account_id)
    }

    /// Best-effort; the local selection survives a failure.
    pub async fn save_selection(&self, api: &ApiClient) -> Result<(), Failure> {
        self.resources.save(api).await
    }

    /// Revoke the connection. Local state is cleared whatever the remote
    /// outcome so the provider never looks connected after a disconnect.
    pub async fn disconnect(&mut self, api: &ApiClient) {
        match api.disconnect(&self.spec).await {
            Ok(()) => tracing::info!(provider = %self.spec.kind, "provider disconnected"),
            Err(e) => {
                tracing::warn!(provider = %self.spec.kind, err = %e, "disconnect failed, clearing local state");
            }
        }
        self.status = None;
        self.provider_user = None;
        self.resources.clear();
        self.notice = None;
        self.emit_resources();
        self.transition(ProviderState::Idle);
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
