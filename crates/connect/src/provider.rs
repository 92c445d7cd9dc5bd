// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider capability records.
//!
//! Every provider runs the same connection state machine; what differs is the
//! set of remote paths and the wording used for its sub-resources.

use std::fmt;

use serde::{Deserialize, Serialize};

/// External account provider that can be linked to the host account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Social posting (Facebook pages).
    Meta,
    /// Local business listings (Google Business Profile locations).
    Google,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Google => "google",
        }
    }

    /// Parse the `provider` redirect discriminator.
    pub fn from_discriminator(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "meta" | "facebook" => Some(Self::Meta),
            "google" | "gbp" => Some(Self::Google),
            _ => None,
        }
    }

    pub fn spec(&self) -> ProviderSpec {
        match self {
            Self::Meta => ProviderSpec::META,
            Self::Google => ProviderSpec::GOOGLE,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Singular/plural wording for a provider's sub-resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceNoun {
    pub singular: &'static str,
    pub plural: &'static str,
}

impl ResourceNoun {
    pub fn count(&self, n: u32) -> String {
        let noun = if n == 1 { self.singular } else { self.plural };
        format!("{n} active {noun}")
    }
}

/// Remote paths and wording for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    pub display_name: &'static str,
    pub status_path: &'static str,
    pub begin_path: &'static str,
    pub exchange_path: &'static str,
    pub resource_path: &'static str,
    pub disconnect_path: &'static str,
    pub noun: ResourceNoun,
    /// Shown when a re-discovery returns nothing.
    pub empty_sync_message: &'static str,
    /// Shown when the known-resource list is empty.
    pub empty_load_message: &'static str,
}

impl ProviderSpec {
    pub const META: Self = Self {
        kind: ProviderKind::Meta,
        display_name: "Facebook",
        status_path: "/api/v1/connect/meta/user/status",
        begin_path: "/api/v1/connect/user/meta",
        exchange_path: "/api/v1/connect/meta/user/detail",
        resource_path: "/api/v1/connect/meta/page",
        disconnect_path: "/api/v1/connect/meta/user/detail",
        noun: ResourceNoun { singular: "page", plural: "pages" },
        empty_sync_message: "No Facebook Pages found on this account.",
        empty_load_message: "No pages connected yet.",
    };

    pub const GOOGLE: Self = Self {
        kind: ProviderKind::Google,
        display_name: "Google Business Profile",
        status_path: "/api/v1/connect/google/user/status",
        begin_path: "/api/v1/connect/user/google",
        exchange_path: "/api/v1/connect/google/user/detail",
        resource_path: "/api/v1/connect/google/account",
        disconnect_path: "/api/v1/connect/google/user/detail",
        noun: ResourceNoun { singular: "location", plural: "locations" },
        empty_sync_message: "No Google Business Profile locations found on this account.",
        empty_load_message: "No locations connected yet.",
    };

    pub fn load_failed_message(&self) -> String {
        format!("Could not load {}.", self.noun.plural)
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
