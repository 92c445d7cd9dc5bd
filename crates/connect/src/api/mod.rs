// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote host platform API: HTTP client and wire types.

pub mod client;
pub mod types;

pub use client::ApiClient;
