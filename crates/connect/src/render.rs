// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain-text snapshot of the hub for the operator console.

use std::fmt::Write as _;

use crate::connection::{ProviderConnection, ProviderState};
use crate::hub::{Hub, Screen};
use crate::redirect::Location;

pub fn render<L: Location>(hub: &Hub<L>) -> String {
    let mut out = String::new();
    match hub.screen() {
        Screen::Checking => out.push_str("checking session...\n"),
        Screen::Login => {
            out.push_str("sign in required: login <email> <password>\n");
            if let Some(notice) = hub.login_notice() {
                let _ = writeln!(out, "  ! {}", notice.message());
            }
        }
        Screen::Hub => {
            let who = hub.session().map(|s| s.display_name()).unwrap_or_default();
            if who.is_empty() {
                out.push_str("signed in\n");
            } else {
                let _ = writeln!(out, "signed in as {who}");
            }
            for conn in hub.providers() {
                render_provider(&mut out, conn);
            }
        }
    }
    out
}

fn headline(conn: &ProviderConnection) -> String {
    let noun = conn.spec().noun;
    match conn.state() {
        ProviderState::Idle => "not connected".to_owned(),
        ProviderState::Loading => "connecting...".to_owned(),
        ProviderState::Success => "connected".to_owned(),
        ProviderState::Manage => format!("managing {}", noun.plural),
        ProviderState::NeedsReauth => "reconnect required".to_owned(),
    }
}

fn render_provider(out: &mut String, conn: &ProviderConnection) {
    let spec = conn.spec();
    let _ = writeln!(out, "[{}] {}: {}", spec.kind, spec.display_name, headline(conn));

    let name = conn
        .provider_user()
        .and_then(|u| u.provider_user_name.as_deref())
        .or_else(|| conn.status().and_then(|s| s.provider_user_name.as_deref()));
    if let Some(name) = name {
        let _ = writeln!(out, "  connected as {name}");
    }

    if let Some(status) = conn.status() {
        if let Some(warning) = status.expiry_warning() {
            let mark = if warning.is_urgent() { "!" } else { "i" };
            let _ = writeln!(out, "  {mark} {}", warning.label());
        }
        if let Some(count) = status.active_resource_count {
            let _ = writeln!(out, "  {}", spec.noun.count(count));
        }
    }

    if let Some(notice) = conn.notice() {
        let _ = writeln!(out, "  ! {}", notice.message());
    }

    if !matches!(conn.state(), ProviderState::Success | ProviderState::Manage) {
        return;
    }
    let resources = conn.resources();
    if let Some(notice) = resources.notice() {
        let mark = if notice.is_failure() { "!" } else { "i" };
        let _ = writeln!(out, "  {mark} {}", notice.message());
    }
    for account in resources.accounts() {
        let check = if resources.is_selected(&account.account_id) { "x" } else { " " };
        let _ = write!(out, "  [{check}] {} {}", account.account_id, account.display_name());
        if let Some(token) = account.account_token.as_deref() {
            let _ = write!(out, " token={token}");
        }
        out.push('\n');
    }
}
