// ABOUTME: Firebase Authentication ID token verification
// ABOUTME: Validates RS256 tokens against Firebase public keys, project audience and issuer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Firebase ID token provider
//!
//! - Public keys fetched from Google's `securetoken` endpoint and cached
//! - `aud` must equal the project ID
//! - `iss` must be `https://securetoken.google.com/<project-id>`
//! - `exp` enforced, `sub` (the Firebase UID) must be non-empty

use std::collections::HashMap;

use async_trait::async_trait;
use gateway_core::constants::firebase::ISSUER_PREFIX;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::keys::SigningKeyCache;
use super::verifier::{IdentityProvider, ProviderClaims};
use super::{BearerToken, Issuer, ProviderError};

/// Firebase ID token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    /// Issuer (should be `https://securetoken.google.com/<project-id>`)
    pub iss: String,
    /// Audience (should be the Firebase project ID)
    pub aud: String,
    /// Subject (Firebase user UID)
    pub sub: String,
    /// Expiration timestamp
    pub exp: i64,
    /// User email (if available)
    pub email: Option<String>,
    /// Whether email is verified
    pub email_verified: Option<bool>,
    /// User display name (if available)
    pub name: Option<String>,
    /// Firebase-specific claims
    #[serde(default)]
    pub firebase: FirebaseSpecificClaims,
}

/// Firebase-specific claims within the token
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FirebaseSpecificClaims {
    /// Sign-in provider (e.g., "google.com", "password")
    pub sign_in_provider: Option<String>,
    /// Identity claims from the provider
    pub identities: Option<HashMap<String, Value>>,
}

/// Verifies Firebase Authentication ID tokens
pub struct FirebaseProvider {
    project_id: String,
    keys: SigningKeyCache,
}

impl FirebaseProvider {
    /// Create a provider for a Firebase project
    #[must_use]
    pub fn new(project_id: &str, certs_url: &str, http_client: Client) -> Self {
        Self {
            project_id: project_id.to_owned(),
            keys: SigningKeyCache::new("firebase", certs_url, http_client),
        }
    }

    /// Firebase project ID
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Validate a Firebase ID token and return its claims
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be decoded, the signing key is
    /// unknown, the signature is invalid, or a registered claim does not
    /// match the project.
    pub async fn validate_token(&self, token: &str) -> Result<FirebaseClaims, ProviderError> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Failed to decode Firebase token header");
            ProviderError::InvalidToken("malformed token header".to_owned())
        })?;

        let kid = header.kid.ok_or_else(|| {
            debug!("Firebase token missing key ID (kid) in header");
            ProviderError::InvalidToken("token missing key ID".to_owned())
        })?;

        let decoding_key = self.keys.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("{ISSUER_PREFIX}{}", self.project_id)]);

        let claims = decode::<FirebaseClaims>(token, &decoding_key, &validation)
            .map_err(|e| {
                debug!(error = %e, "Firebase token validation failed");
                ProviderError::InvalidToken(describe_jwt_error(e.kind()).to_owned())
            })?
            .claims;

        if claims.sub.is_empty() {
            return Err(ProviderError::InvalidToken("empty subject".to_owned()));
        }

        debug!(
            user_id = %claims.sub,
            provider = claims.firebase.sign_in_provider.as_deref().unwrap_or("unknown"),
            "Firebase token validated"
        );
        Ok(claims)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseProvider {
    fn issuer(&self) -> Issuer {
        Issuer::Firebase
    }

    async fn verify(&self, token: &BearerToken) -> Result<ProviderClaims, ProviderError> {
        let claims = self.validate_token(token.expose()).await?;
        Ok(ProviderClaims {
            subject: claims.sub,
            email: claims.email,
            display_name: claims.name,
        })
    }
}

/// Short, token-free description of a JWT validation error
pub(crate) fn describe_jwt_error(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ExpiredSignature => "token expired",
        ErrorKind::ImmatureSignature => "token not yet valid",
        ErrorKind::InvalidAudience => "invalid token audience",
        ErrorKind::InvalidIssuer => "invalid token issuer",
        ErrorKind::InvalidSignature => "invalid token signature",
        ErrorKind::InvalidAlgorithm => "unexpected signing algorithm",
        ErrorKind::MissingRequiredClaim(_) => "missing required claim",
        _ => "invalid token",
    }
}
