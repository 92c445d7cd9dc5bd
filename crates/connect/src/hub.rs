// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level orchestration for one page load.
//!
//! The hub owns the session gate, one [`ProviderConnection`] per provider and
//! the page [`Location`]. [`Hub::load`] is the one-shot entry step: it reads
//! and strips redirect parameters, checks the session, then resumes the
//! redirect on its target provider while every other provider reconciles
//! concurrently.

use futures_util::future::join_all;
use reqwest::Url;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::api::types::{Credentials, Session};
use crate::api::ApiClient;
use crate::connection::ProviderConnection;
use crate::error::{Failure, Notice, GENERIC_MESSAGE};
use crate::events::{self, ConnectEvent, EventSender};
use crate::provider::ProviderKind;
use crate::redirect::{take_redirect_params, Location, RedirectParams, Resume};
use crate::session::SessionGate;

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Session not yet known.
    Checking,
    Login,
    Hub,
}

pub struct Hub<L: Location> {
    api: ApiClient,
    gate: SessionGate,
    providers: Vec<ProviderConnection>,
    screen: Screen,
    login_notice: Option<Notice>,
    resumed: bool,
    location: L,
    events: EventSender,
}

impl<L: Location> Hub<L> {
    /// Build a hub. The first provider is the primary redirect target.
    pub fn new(api: ApiClient, kinds: &[ProviderKind], location: L) -> Self {
        let events = events::channel();
        let providers =
            kinds.iter().map(|kind| ProviderConnection::new(kind.spec(), events.clone())).collect();
        Self {
            api,
            gate: SessionGate::new(),
            providers,
            screen: Screen::Checking,
            login_notice: None,
            resumed: false,
            location,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectEvent> {
        self.events.subscribe()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> Option<&Session> {
        self.gate.current()
    }

    pub fn login_notice(&self) -> Option<&Notice> {
        self.login_notice.as_ref()
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn providers(&self) -> &[ProviderConnection] {
        &self.providers
    }

    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConnection> {
        self.providers.iter().find(|p| p.kind() == kind)
    }

    /// Provider operations only run behind a session on the hub screen.
    fn provider_mut(&mut self, kind: ProviderKind) -> Result<&mut ProviderConnection, Failure> {
        if !self.gate.is_signed_in() || self.screen != Screen::Hub {
            tracing::warn!(provider = %kind, screen = ?self.screen, "provider operation refused, signed out");
            return Err(Failure::SignedOut);
        }
        self.providers.iter_mut().find(|p| p.kind() == kind).ok_or_else(|| {
            tracing::warn!(provider = %kind, "provider not enabled");
            Failure::Business(Some(format!("{kind} is not enabled")))
        })
    }

    fn primary(&self) -> Option<ProviderKind> {
        self.providers.first().map(ProviderConnection::kind)
    }

    fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            tracing::info!(from = ?self.screen, to = ?screen, "screen changed");
            self.screen = screen;
        }
    }

    fn session_changed(&self) {
        let signed_in = self.gate.is_signed_in();
        let _ = self.events.send(ConnectEvent::SessionChanged { signed_in });
    }

    /// One-shot page-load step. Later calls are no-ops.
    pub async fn load(&mut self) {
        if self.resumed {
            tracing::debug!("page load already handled");
            return;
        }
        self.resumed = true;

        let params = take_redirect_params(&mut self.location);

        if self.gate.probe(&self.api).await.is_none() {
            if params.is_callback() {
                tracing::warn!("redirect parameters dropped, no session");
            }
            self.session_changed();
            self.set_screen(Screen::Login);
            return;
        }
        self.session_changed();

        self.resume_all(params).await;
        self.set_screen(Screen::Hub);
    }

    /// Resume the redirect on its target provider and reconcile the rest,
    /// all concurrently.
    async fn resume_all(&mut self, params: RedirectParams) {
        let Some(primary) = self.primary() else {
            return;
        };
        let enabled: Vec<ProviderKind> = self.providers.iter().map(ProviderConnection::kind).collect();
        let target = params.target(primary, &enabled);
        let mut resume = Some(params.resume());
        let api = &self.api;

        let tasks = self.providers.iter_mut().map(|conn| {
            let action = if conn.kind() == target { resume.take() } else { None };
            async move {
                match action {
                    Some(Resume::Exchange(code)) => {
                        let _ = conn.exchange_code(api, code).await;
                    }
                    Some(Resume::Cancelled) => {
                        tracing::info!(provider = %conn.kind(), "authorisation cancelled");
                        conn.reconcile(api).await;
                        conn.set_notice(Notice::AuthorisationCancelled);
                    }
                    Some(Resume::Reconcile) | None => conn.reconcile(api).await,
                }
            }
        });
        join_all(tasks).await;
    }

    /// Reconcile every provider concurrently.
    async fn reconcile_all(&mut self) {
        let api = &self.api;
        join_all(self.providers.iter_mut().map(|conn| conn.reconcile(api))).await;
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), Failure> {
        let result = self.gate.submit_login(&self.api, credentials).await.map(|_| ());
        match result {
            Ok(()) => {
                self.login_notice = None;
                self.session_changed();
                self.reconcile_all().await;
                self.set_screen(Screen::Hub);
                Ok(())
            }
            Err(failure) => {
                self.login_notice = Some(Notice::failed(failure.clone(), GENERIC_MESSAGE));
                Err(failure)
            }
        }
    }

    /// Begin connecting `kind` and navigate to the provider. An expired
    /// session sends the whole hub back to the login screen.
    pub async fn connect(&mut self, kind: ProviderKind) -> Result<Url, Failure> {
        let api = self.api.clone();
        let result = self.provider_mut(kind)?.begin_connect(&api).await;
        match result {
            Ok(url) => {
                tracing::info!(provider = %kind, url = %url, "navigating to provider");
                let _ = self.events.send(ConnectEvent::Navigate { url: url.to_string() });
                self.location.assign(url.clone());
                Ok(url)
            }
            Err(Failure::ExpiredSession) => {
                self.expire_session();
                Err(Failure::ExpiredSession)
            }
            Err(failure) => Err(failure),
        }
    }

    fn expire_session(&mut self) {
        self.gate.clear();
        self.login_notice = Some(Notice::SessionExpired);
        self.session_changed();
        self.set_screen(Screen::Login);
    }

    pub async fn manage(&mut self, kind: ProviderKind) -> Result<(), Failure> {
        let api = self.api.clone();
        self.provider_mut(kind)?.open_manage(&api).await;
        Ok(())
    }

    pub fn back(&mut self, kind: ProviderKind) -> Result<(), Failure> {
        self.provider_mut(kind)?.back();
        Ok(())
    }

    pub async fn resync(&mut self, kind: ProviderKind) -> Result<(), Failure> {
        let api = self.api.clone();
        self.provider_mut(kind)?.resync(&api).await
    }

    pub fn toggle(&mut self, kind: ProviderKind, account_id: &str) -> Result<bool, Failure> {
        Ok(self.provider_mut(kind)?.toggle(account_id))
    }

    pub async fn save(&mut self, kind: ProviderKind) -> Result<(), Failure> {
        let api = self.api.clone();
        self.provider_mut(kind)?.save_selection(&api).await
    }

    pub async fn disconnect(&mut self, kind: ProviderKind) -> Result<(), Failure> {
        let api = self.api.clone();
        self.provider_mut(kind)?.disconnect(&api).await;
        Ok(())
    }
}
