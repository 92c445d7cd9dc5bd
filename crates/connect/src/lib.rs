// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod api;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod events;
pub mod hub;
pub mod provider;
pub mod redirect;
pub mod render;
pub mod resources;
pub mod session;
pub mod status;
pub mod test_support;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::config::ConnectConfig;
use crate::driver::Outcome;
use crate::hub::Hub;
use crate::redirect::MemoryLocation;

/// Run one page load: resume any redirect, then serve the operator console
/// on stdin/stdout until it ends.
pub async fn run(config: ConnectConfig) -> anyhow::Result<Outcome> {
    let api = ApiClient::new(
        &config.api_url,
        config.session_cookie.as_deref(),
        config.request_timeout(),
    );
    let location = MemoryLocation::new(config.page_url()?);
    let mut hub = Hub::new(api, &config.providers, location);

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted");
                shutdown.cancel();
            }
        });
    }

    tokio::select! {
        _ = shutdown.cancelled() => return Ok(Outcome::Interrupted),
        _ = hub.load() => {}
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let outcome = driver::serve(&mut hub, stdin, &mut stdout, shutdown).await?;
    tracing::info!(?outcome, "page load ended");
    Ok(outcome)
}
