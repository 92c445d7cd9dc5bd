// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;
use reqwest::Url;

use crate::provider::ProviderKind;

/// Link external provider accounts to a host platform account.
#[derive(Debug, Parser)]
#[command(name = "omni-connect", version, about)]
pub struct ConnectConfig {
    /// Base URL of the host platform API.
    #[arg(long, env = "OMNI_API_URL", default_value = "https://api.omni7.io")]
    pub api_url: String,

    /// Current page address. Carries `code`, `error` and `provider` after an
    /// OAuth redirect.
    #[arg(long, env = "OMNI_PAGE_URL", default_value = "http://localhost/")]
    pub page_url: String,

    /// Cookie header sent with every request.
    #[arg(long, env = "OMNI_SESSION_COOKIE", hide_env_values = true)]
    pub session_cookie: Option<String>,

    /// Providers shown on the hub. The first one is the primary.
    #[arg(
        long,
        env = "OMNI_PROVIDERS",
        value_enum,
        value_delimiter = ',',
        default_value = "meta,google"
    )]
    pub providers: Vec<ProviderKind>,

    /// Per-request timeout in milliseconds. Unset waits indefinitely.
    #[arg(long, env = "OMNI_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Log filter directive.
    #[arg(long, env = "OMNI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (text, json).
    #[arg(long, env = "OMNI_LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl ConnectConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.api_url)
            .map_err(|e| anyhow::anyhow!("invalid --api-url {:?}: {e}", self.api_url))?;
        self.page_url()?;

        if self.providers.is_empty() {
            anyhow::bail!("at least one provider must be enabled");
        }
        for (i, kind) in self.providers.iter().enumerate() {
            if self.providers[..i].contains(kind) {
                anyhow::bail!("provider {kind} listed more than once");
            }
        }

        if self.request_timeout_ms == Some(0) {
            anyhow::bail!("--request-timeout-ms must be greater than zero");
        }

        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    pub fn page_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.page_url)
            .map_err(|e| anyhow::anyhow!("invalid --page-url {:?}: {e}", self.page_url))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
