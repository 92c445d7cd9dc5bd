// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redirect-carried OAuth parameters and the page location they arrive on.

use std::fmt;

use reqwest::Url;

use crate::provider::ProviderKind;

/// One-time authorization code. Consumed by value; never cloned or logged.
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorizationCode(<redacted>)")
    }
}

/// What the redirect asks the target provider to do.
#[derive(Debug)]
pub enum Resume {
    /// The user declined at the provider consent screen.
    Cancelled,
    Exchange(AuthorizationCode),
    Reconcile,
}

/// `code`, `error` and `provider` as read from the page query.
#[derive(Debug, Default)]
pub struct RedirectParams {
    pub code: Option<AuthorizationCode>,
    pub error: Option<String>,
    pub provider: Option<String>,
}

impl RedirectParams {
    /// Read the first occurrence of each parameter. Empty values are absent.
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "code" if params.code.is_none() => {
                    params.code = Some(AuthorizationCode::new(value.into_owned()));
                }
                "error" if params.error.is_none() => params.error = Some(value.into_owned()),
                "provider" if params.provider.is_none() => {
                    params.provider = Some(value.into_owned());
                }
                _ => {}
            }
        }
        params
    }

    /// Whether the page carries a one-time value that must be stripped.
    pub fn is_callback(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }

    /// Provider the resume is routed to. Falls back to `primary` when the
    /// discriminator is absent, unknown, or names a provider not in `enabled`.
    pub fn target(&self, primary: ProviderKind, enabled: &[ProviderKind]) -> ProviderKind {
        let Some(raw) = self.provider.as_deref() else {
            return primary;
        };
        match ProviderKind::from_discriminator(raw) {
            Some(kind) if enabled.contains(&kind) => kind,
            Some(kind) => {
                tracing::warn!(provider = %kind, fallback = %primary, "redirect provider not enabled");
                primary
            }
            None => {
                tracing::warn!(provider = raw, fallback = %primary, "unknown redirect provider");
                primary
            }
        }
    }

    /// Error takes priority over code.
    pub fn resume(self) -> Resume {
        if self.error.is_some() {
            return Resume::Cancelled;
        }
        match self.code {
            Some(code) => Resume::Exchange(code),
            None => Resume::Reconcile,
        }
    }
}

/// The current page address and its navigation history.
pub trait Location: Send {
    fn href(&self) -> Url;

    /// Rewrite the current entry without navigating.
    fn replace(&mut self, url: Url);

    /// Navigate away. Ends the page load.
    fn assign(&mut self, url: Url);
}

/// Read the redirect parameters and strip any one-time values from the
/// visible address before the caller does anything else.
pub fn take_redirect_params(location: &mut dyn Location) -> RedirectParams {
    let mut href = location.href();
    let params = RedirectParams::from_url(&href);
    if params.is_callback() {
        href.set_query(None);
        href.set_fragment(None);
        location.replace(href);
        tracing::debug!("stripped redirect parameters from location");
    }
    params
}

/// In-memory location for the operator driver and tests.
#[derive(Debug, Clone)]
pub struct MemoryLocation {
    current: Url,
    navigated: Option<Url>,
}

impl MemoryLocation {
    pub fn new(url: Url) -> Self {
        Self { current: url, navigated: None }
    }

    /// Where `assign` last sent the page, if anywhere.
    pub fn navigated(&self) -> Option<&Url> {
        self.navigated.as_ref()
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> Url {
        self.current.clone()
    }

    fn replace(&mut self, url: Url) {
        self.current = url;
    }

    fn assign(&mut self, url: Url) {
        self.navigated = Some(url);
    }
}

#[cfg(test)]
#[path = "redirect_tests.rs"]
mod tests;
