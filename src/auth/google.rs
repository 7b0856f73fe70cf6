// ABOUTME: Google identity providers for ID tokens (JWKS-signed) and opaque access tokens
// ABOUTME: Access tokens are introspected via tokeninfo; errors never include the token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use gateway_core::constants::google::ID_TOKEN_ISSUERS;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::firebase::describe_jwt_error;
use super::keys::SigningKeyCache;
use super::verifier::{IdentityProvider, ProviderClaims};
use super::{BearerToken, Issuer, ProviderError, TokenShape};

/// Google ID token claims
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleIdClaims {
    /// Issuer (`accounts.google.com` or `https://accounts.google.com`)
    pub iss: String,
    /// Subject (Google account ID)
    pub sub: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Authorized party
    pub azp: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Whether Google verified the email
    pub email_verified: Option<bool>,
    /// Display name
    pub name: Option<String>,
}

/// Verifies Google-signed OpenID Connect ID tokens
pub struct GoogleIdTokenProvider {
    client_id: String,
    keys: SigningKeyCache,
}

impl GoogleIdTokenProvider {
    /// Create a provider expecting tokens minted for `client_id`
    #[must_use]
    pub fn new(client_id: &str, certs_url: &str, http_client: Client) -> Self {
        Self {
            client_id: client_id.to_owned(),
            keys: SigningKeyCache::new("google", certs_url, http_client),
        }
    }

    /// Validate an ID token and return its claims
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be decoded, the signing key is
    /// unknown, the signature is invalid, or audience, issuer or expiry do
    /// not check out.
    pub async fn validate_token(&self, token: &str) -> Result<GoogleIdClaims, ProviderError> {
        let header = decode_header(token)
            .map_err(|_| ProviderError::InvalidToken("malformed token header".to_owned()))?;
        let kid = header
            .kid
            .ok_or_else(|| ProviderError::InvalidToken("token missing key ID".to_owned()))?;

        let decoding_key = self.keys.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.client_id]);
        validation.set_issuer(&ID_TOKEN_ISSUERS);

        let token_data = decode::<GoogleIdClaims>(token, &decoding_key, &validation).map_err(|e| {
            debug!(error = %e, "Google ID token validation failed");
            ProviderError::InvalidToken(describe_jwt_error(e.kind()).to_owned())
        })?;
        Ok(token_data.claims)
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdTokenProvider {
    fn issuer(&self) -> Issuer {
        Issuer::GoogleIdToken
    }

    fn applies_to(&self, shape: TokenShape) -> bool {
        shape == TokenShape::Structured
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

/// Fields of a tokeninfo response the gateway uses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenInfo {
    /// Google account ID
    pub sub: Option<String>,
    /// Legacy account ID field
    pub user_id: Option<String>,
    /// Email, present when the token has the email scope
    pub email: Option<String>,
    /// Client the token was issued to
    pub aud: Option<String>,
    /// Authorized party
    pub azp: Option<String>,
    /// Granted scopes, space separated
    pub scope: Option<String>,
}

/// Verifies opaque Google access tokens through the tokeninfo endpoint
pub struct GoogleAccessTokenProvider {
    tokeninfo_url: String,
    /// When set, tokeninfo `aud` or `azp` must equal this client ID
    audience: Option<String>,
    http_client: Client,
}

impl GoogleAccessTokenProvider {
    /// Create a provider using the given tokeninfo endpoint
    #[must_use]
    pub fn new(tokeninfo_url: &str, audience: Option<String>, http_client: Client) -> Self {
        Self {
            tokeninfo_url: tokeninfo_url.to_owned(),
            audience,
            http_client,
        }
    }

    /// Introspect an access token
    ///
    /// # Errors
    ///
    /// Returns `Introspection` for transport errors, non-200 answers and
    /// unreadable bodies, and `AudienceMismatch` when the audience check is
    /// enabled and fails.
    pub async fn introspect(&self, token: &str) -> Result<TokenInfo, ProviderError> {
        let response = self
            .http_client
            .get(&self.tokeninfo_url)
            .query(&[("access_token", token)])
            .send()
            .await
            .map_err(|e| {
                // The request URL carries the token, so drop it from the error
                let e = e.without_url();
                warn!(error = %e, "Failed to reach tokeninfo endpoint");
                ProviderError::Introspection(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(%status, "tokeninfo rejected access token");
            return Err(ProviderError::Introspection(format!(
                "tokeninfo returned HTTP {}",
                status.as_u16()
            )));
        }

        let info: TokenInfo = response.json().await.map_err(|e| {
            ProviderError::Introspection(format!("unreadable tokeninfo response: {}", e.without_url()))
        })?;

        if let Some(expected) = &self.audience {
            let matches = info.aud.as_deref() == Some(expected.as_str())
                || info.azp.as_deref() == Some(expected.as_str());
            if !matches {
                warn!(
                    aud = info.aud.as_deref().unwrap_or(""),
                    azp = info.azp.as_deref().unwrap_or(""),
                    "Access token issued for another client"
                );
                return Err(ProviderError::AudienceMismatch);
            }
        }

        Ok(info)
    }
}

#[async_trait]
impl IdentityProvider for GoogleAccessTokenProvider {
    fn issuer(&self) -> Issuer {
        Issuer::GoogleOpaqueToken
    }

    fn applies_to(&self, shape: TokenShape) -> bool {
        shape == TokenShape::Opaque
    }

    async fn verify(&self, token: &BearerToken) -> Result<ProviderClaims, ProviderError> {
        let info = self.introspect(token.expose()).await?;
        let subject = info.sub.or(info.user_id).ok_or_else(|| {
            ProviderError::Introspection("tokeninfo response has no subject".to_owned())
        })?;
        Ok(ProviderClaims {
            subject,
            email: info.email,
            display_name: None,
        })
    }
}
