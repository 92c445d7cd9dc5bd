// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host platform session gate.

use crate::api::types::{Credentials, Session};
use crate::api::ApiClient;
use crate::error::Failure;

/// Holds the host session for the lifetime of a page load.
#[derive(Debug, Default)]
pub struct SessionGate {
    session: Option<Session>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Cookie-based identity lookup. Any failure leaves the gate signed out.
    pub async fn probe(&mut self, api: &ApiClient) -> Option<&Session> {
        self.session = match api.user_detail().await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!(err = %e, "no session");
                None
            }
        };
        self.session.as_ref()
    }

    /// Sign in. A rejected login does not clear an existing session.
    pub async fn submit_login(
        &mut self,
        api: &ApiClient,
        credentials: &Credentials,
    ) -> Result<&Session, Failure> {
        let session = api.login(credentials).await?;
        tracing::info!(user = %session.display_name(), "signed in");
        Ok(self.session.insert(session))
    }

    /// Drop the session after the remote API reported it invalid.
    pub fn clear(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("session cleared");
        }
    }
}
