// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;
use tokio::sync::broadcast;

use crate::connection::ProviderState;
use crate::provider::ProviderKind;

/// Capacity of the hub event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Observable change in the hub, for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConnectEvent {
    SessionChanged { signed_in: bool },
    StateChanged { provider: ProviderKind, prev: ProviderState, next: ProviderState },
    ResourcesReplaced { provider: ProviderKind, count: usize, selected: usize },
    Navigate { url: String },
}

pub type EventSender = broadcast::Sender<ConnectEvent>;

pub fn channel() -> EventSender {
    let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    tx
}
