// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-field deserializers that tolerate unexpected JSON types.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::ConnectedAccount;

/// A value of the wrong type reads as `None`.
pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Only a JSON `true` is true.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn id_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// String or number.
pub fn id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_text(Value::deserialize(deserializer)?))
}

pub fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    id_text(Value::deserialize(deserializer)?)
        .ok_or_else(|| D::Error::custom("id must be a string or a number"))
}

/// Whole days, rounded up so `<= n` thresholds compare as on the raw value.
pub fn days<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Number(n) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.ceil() as i64)))
}

/// Keep every well-formed account; a non-array reads as `None`.
pub fn accounts<'de, D>(deserializer: D) -> Result<Option<Vec<ConnectedAccount>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    let accounts = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(account) => Some(account),
            Err(e) => {
                tracing::warn!(err = %e, "skipping malformed account");
                None
            }
        })
        .collect();
    Ok(Some(accounts))
}

#[cfg(test)]
#[path = "lenient_tests.rs"]
mod tests;
