// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource discovery and selection for one provider.
//!
//! The collection is replaced wholesale by every sync/load. The selection is
//! local until `save` pushes it to the remote API as the full desired set.

use indexmap::IndexSet;

use crate::api::types::ConnectedAccount;
use crate::api::ApiClient;
use crate::error::{Failure, ResourceNotice};
use crate::provider::ProviderSpec;

/// How a replaced collection seeds the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// Every returned resource is selected.
    SelectAll,
    /// Selection mirrors the server-reported `is_active` flags.
    FromActive,
}

/// Which discovery call produced the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    Sync,
    Load,
}

/// Pages or locations for one provider plus the operator's selection.
#[derive(Debug, Clone)]
pub struct ResourceSet {
    spec: ProviderSpec,
    accounts: Vec<ConnectedAccount>,
    selection: IndexSet<String>,
    notice: Option<ResourceNotice>,
}

impl ResourceSet {
    pub fn new(spec: ProviderSpec) -> Self {
        Self { spec, accounts: Vec::new(), selection: IndexSet::new(), notice: None }
    }

    pub fn accounts(&self) -> &[ConnectedAccount] {
        &self.accounts
    }

    pub fn selection(&self) -> &IndexSet<String> {
        &self.selection
    }

    pub fn is_selected(&self, account_id: &str) -> bool {
        self.selection.contains(account_id)
    }

    pub fn notice(&self) -> Option<&ResourceNotice> {
        self.notice.as_ref()
    }

    /// Re-discover resources from the provider.
    pub async fn sync(&mut self, api: &ApiClient, select_all: bool) -> Result<(), Failure> {
        let seed = if select_all { Seed::SelectAll } else { Seed::FromActive };
        let result = api.sync_resources(&self.spec).await;
        self.apply(result, Discovery::Sync, seed)
    }

    /// Fetch the already-known resources. Selection always follows `is_active`.
    pub async fn load(&mut self, api: &ApiClient) -> Result<(), Failure> {
        let result = api.load_resources(&self.spec).await;
        self.apply(result, Discovery::Load, Seed::FromActive)
    }

    fn apply(
        &mut self,
        result: Result<Vec<ConnectedAccount>, Failure>,
        discovery: Discovery,
        seed: Seed,
    ) -> Result<(), Failure> {
        match result {
            Ok(accounts) => {
                self.replace(accounts, discovery, seed);
                Ok(())
            }
            Err(failure) => {
                tracing::debug!(provider = %self.spec.kind, ?discovery, err = %failure, "resource discovery failed");
                let message = failure.user_message(&self.spec.load_failed_message());
                self.notice = Some(ResourceNotice::Failed { failure: failure.clone(), message });
                Err(failure)
            }
        }
    }

    /// Replace the collection and re-seed the selection from it.
    pub fn replace(&mut self, accounts: Vec<ConnectedAccount>, discovery: Discovery, seed: Seed) {
        self.selection = accounts
            .iter()
            .filter(|a| seed == Seed::SelectAll || a.is_active)
            .map(|a| a.account_id.clone())
            .collect();
        self.notice = if accounts.is_empty() {
            let message = match discovery {
                Discovery::Sync => self.spec.empty_sync_message,
                Discovery::Load => self.spec.empty_load_message,
            };
            Some(ResourceNotice::NoResourcesFound(message.to_owned()))
        } else {
            None
        };
        self.accounts = accounts;
    }

    /// Flip membership of `account_id`. Unknown ids are ignored.
    ///
    /// Returns whether the id is selected afterwards.
    pub fn toggle(&mut self, account_id: &str) -> bool {
        if !self.accounts.iter().any(|a| a.account_id == account_id) {
            return false;
        }
        if self.selection.shift_remove(account_id) {
            false
        } else {
            self.selection.insert(account_id.to_owned());
            true
        }
    }

    /// Persist the selection verbatim. Best-effort: a failure is logged and
    /// the local selection is kept so the operator can retry.
    pub async fn save(&self, api: &ApiClient) -> Result<(), Failure> {
        let ids: Vec<String> = self.selection.iter().cloned().collect();
        let count = ids.len();
        match api.save_selection(&self.spec, ids).await {
            Ok(()) => {
                tracing::info!(provider = %self.spec.kind, selected = count, "selection saved");
                Ok(())
            }
            Err(failure) => {
                tracing::warn!(provider = %self.spec.kind, err = %failure, "failed to save selection");
                Err(failure)
            }
        }
    }

    pub fn clear(&mut self) {
        self.accounts.clear();
        self.selection.clear();
        self.notice = None;
    }
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
