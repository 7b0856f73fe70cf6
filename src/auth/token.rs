// ABOUTME: Bearer credential parsing from the Authorization header and token shape detection
// ABOUTME: BearerToken never prints its secret in Debug or Display output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use gateway_core::constants::auth::BEARER_PREFIX;

use super::RejectionReason;

/// Textual shape of a bearer credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenShape {
    /// Three dot-separated segments (`header.payload.signature`)
    Structured,
    /// Anything else; only the issuer can tell whether it is valid
    Opaque,
}

/// The credential portion of an `Authorization: Bearer <token>` header
///
/// The value is guaranteed non-empty and free of whitespace. Formatting the
/// token with `{}` or `{:?}` prints a redacted placeholder, so it can be put
/// in log fields without leaking the secret; use [`BearerToken::expose`] to
/// get the raw credential.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw credential
    ///
    /// # Errors
    ///
    /// Returns `MalformedCredential` if the credential is empty or contains
    /// whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, RejectionReason> {
        let raw = raw.into();
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(RejectionReason::MalformedCredential);
        }
        Ok(Self(raw))
    }

    /// Parse an `Authorization` header value
    ///
    /// `None` means the header was absent.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` for an absent header and
    /// `MalformedCredential` when the header does not follow `Bearer <token>`.
    pub fn from_authorization_header(header: Option<&str>) -> Result<Self, RejectionReason> {
        let header = header.ok_or(RejectionReason::MissingCredential)?;
        let credential = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(RejectionReason::MalformedCredential)?;
        Self::new(credential.trim())
    }

    /// The raw credential
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Classify the token by its textual shape
    #[must_use]
    pub fn shape(&self) -> TokenShape {
        let mut segments = 0;
        for segment in self.0.split('.') {
            if segment.is_empty() {
                return TokenShape::Opaque;
            }
            segments += 1;
        }
        if segments == 3 {
            TokenShape::Structured
        } else {
            TokenShape::Opaque
        }
    }

    /// Value for an outbound `Authorization` header
    #[must_use]
    pub fn authorization_value(&self) -> String {
        format!("{BEARER_PREFIX}{}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&"<redacted>").finish()
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}
