// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

pub const UNREACHABLE_MESSAGE: &str = "Could not reach the server.";
pub const GENERIC_MESSAGE: &str = "Something went wrong.";
pub const BEGIN_CONNECT_MESSAGE: &str = "Something went wrong. Please try again.";
pub const INCORRECT_CREDENTIALS_MESSAGE: &str = "Incorrect email or password.";
pub const AUTHORISATION_CANCELLED_MESSAGE: &str = "Authorisation was cancelled.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";
pub const SIGNED_OUT_MESSAGE: &str = "Please sign in first.";

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// No response at all (connection refused, DNS, TLS, timeout).
    Unreachable,
    /// Non-2xx response. Carries the server's `message` when one was sent.
    Business(Option<String>),
    /// The host session is no longer valid.
    ExpiredSession,
    /// Login was rejected.
    IncorrectCredentials,
    /// Refused locally: no session, so nothing was sent.
    SignedOut,
}

impl Failure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unreachable => "UNREACHABLE",
            Self::Business(_) => "BUSINESS_ERROR",
            Self::ExpiredSession => "EXPIRED_SESSION",
            Self::IncorrectCredentials => "INCORRECT_CREDENTIALS",
            Self::SignedOut => "SIGNED_OUT",
        }
    }

    /// Message shown to the operator. `fallback` is used for a business
    /// error that arrived without a message of its own.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Unreachable => UNREACHABLE_MESSAGE.to_owned(),
            Self::Business(Some(message)) if !message.trim().is_empty() => message.clone(),
            Self::Business(_) => fallback.to_owned(),
            Self::ExpiredSession => SESSION_EXPIRED_MESSAGE.to_owned(),
            Self::IncorrectCredentials => INCORRECT_CREDENTIALS_MESSAGE.to_owned(),
            Self::SignedOut => SIGNED_OUT_MESSAGE.to_owned(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Business(Some(message)) => write!(f, "{}: {message}", self.as_str()),
            _ => f.write_str(self.as_str()),
        }
    }
}

impl std::error::Error for Failure {}

/// A condition surfaced on a provider or login screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Failed { failure: Failure, message: String },
    AuthorisationCancelled,
    SessionExpired,
}

impl Notice {
    pub fn failed(failure: Failure, fallback: &str) -> Self {
        let message = failure.user_message(fallback);
        Self::Failed { failure, message }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Failed { message, .. } => message,
            Self::AuthorisationCancelled => AUTHORISATION_CANCELLED_MESSAGE,
            Self::SessionExpired => SESSION_EXPIRED_MESSAGE,
        }
    }
}

/// Outcome attached to the most recent resource discovery.
///
/// An empty result is reported but is not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceNotice {
    NoResourcesFound(String),
    Failed { failure: Failure, message: String },
}

impl ResourceNotice {
    pub fn message(&self) -> &str {
        match self {
            Self::NoResourcesFound(message) | Self::Failed { message, .. } => message,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
