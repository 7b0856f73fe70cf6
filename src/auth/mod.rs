// ABOUTME: Bearer token verification against an ordered chain of identity providers
// ABOUTME: Defines verified identities, rejection reasons and per-provider failure causes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Token Verification
//!
//! An inbound bearer token is checked against identity providers in a
//! configured order:
//!
//! 1. Firebase Authentication, whatever the token looks like
//! 2. Google ID tokens, for structured (`header.payload.signature`) tokens
//! 3. Google tokeninfo introspection, for opaque access tokens
//!
//! The first provider that accepts the token decides the outcome. If it
//! accepted the signature but the claims carry no email, the request is
//! rejected rather than handed to the next provider. When every applicable
//! provider fails, the rejection lists each provider's cause.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gateway_core::constants::auth::{INVALID_HEADER_FORMAT, MISSING_HEADER};

/// Firebase ID token provider
pub mod firebase;
/// Google ID token and access token providers
pub mod google;
/// Signing key fetch and cache
pub mod keys;
/// Bearer credential parsing
pub mod token;
/// Provider trait and the verification chain
pub mod verifier;

pub use token::{BearerToken, TokenShape};
pub use verifier::{IdentityProvider, ProviderClaims, TokenVerifier};

/// Authority that vouched for a verified identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Issuer {
    /// Firebase Authentication
    Firebase,
    /// Google-signed ID token
    GoogleIdToken,
    /// Google opaque access token, confirmed by introspection
    GoogleOpaqueToken,
}

impl Issuer {
    /// Stable name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Firebase => "firebase",
            Self::GoogleIdToken => "google-id-token",
            Self::GoogleOpaqueToken => "google-opaque-token",
        }
    }
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity established for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Stable user identifier at the issuer (`sub`)
    pub subject: String,
    /// Email address of the user
    pub email: String,
    /// Which authority verified the token
    pub issuer: Issuer,
    /// Display name from the `name` claim, when present
    pub display_name: Option<String>,
}

/// Why one provider did not accept a token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The token is not valid for this provider
    #[error("invalid token: {0}")]
    InvalidToken(String),
    /// The provider's signing keys could not be obtained
    #[error("signing keys unavailable: {0}")]
    KeysUnavailable(String),
    /// The introspection endpoint could not be reached or answered badly
    #[error("introspection failed: {0}")]
    Introspection(String),
    /// The token is valid but was issued to another client
    #[error("token was not issued for this application")]
    AudienceMismatch,
}

/// A failed verification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Provider name as configured in the chain
    pub provider: &'static str,
    /// What went wrong
    pub cause: ProviderError,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.cause)
    }
}

/// Why a request was not authenticated
///
/// The `Display` text is what the client sees in the 401 body, so no
/// variant ever carries the raw token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    /// No `Authorization` header
    #[error("{}", MISSING_HEADER)]
    MissingCredential,
    /// Header present but not `Bearer <token>`
    #[error("{}", INVALID_HEADER_FORMAT)]
    MalformedCredential,
    /// No provider accepted the token
    #[error("Token verification failed: {}", describe_attempts(.attempts))]
    VerificationFailed {
        /// One entry per provider tried, in chain order
        attempts: Vec<ProviderFailure>,
    },
    /// A provider accepted the token but it identifies no email
    #[error("Invalid token payload: missing email claim")]
    IncompleteIdentity {
        /// Provider that accepted the token
        issuer: Issuer,
    },
}

fn describe_attempts(attempts: &[ProviderFailure]) -> String {
    if attempts.is_empty() {
        return "no identity provider applies to this token".to_owned();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of verifying a bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationOutcome {
    /// The token identifies a user
    Authenticated(VerifiedIdentity),
    /// The token was refused
    Rejected(RejectionReason),
}

impl AuthenticationOutcome {
    /// Convert into a `Result`
    ///
    /// # Errors
    ///
    /// Returns the rejection reason for `Rejected`.
    pub fn into_result(self) -> Result<VerifiedIdentity, RejectionReason> {
        match self {
            Self::Authenticated(identity) => Ok(identity),
            Self::Rejected(reason) => Err(reason),
        }
    }

    /// Whether the outcome is `Authenticated`
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
