// ABOUTME: IdentityProvider trait and the ordered provider chain that verifies bearer tokens
// ABOUTME: First accepting provider decides; failed attempts are all kept for the rejection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::firebase::FirebaseProvider;
use super::google::{GoogleAccessTokenProvider, GoogleIdTokenProvider};
use super::{
    AuthenticationOutcome, BearerToken, Issuer, ProviderError, ProviderFailure, RejectionReason,
    TokenShape, VerifiedIdentity,
};
use crate::config::{AuthConfig, ProviderKind};

/// Claims a provider extracted from a token it accepted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderClaims {
    /// User identifier at the issuer
    pub subject: String,
    /// Email claim, if the token carries one
    pub email: Option<String>,
    /// `name` claim, if present
    pub display_name: Option<String>,
}

/// A trust authority able to verify bearer tokens
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Issuer recorded on identities this provider verifies
    fn issuer(&self) -> Issuer;

    /// Whether tokens of this shape should be offered to the provider
    fn applies_to(&self, shape: TokenShape) -> bool {
        let _ = shape;
        true
    }

    /// Verify a token and return its claims
    ///
    /// # Errors
    ///
    /// Returns the reason the provider refused the token. Transport and
    /// decode failures are reported the same way; a provider never panics.
    async fn verify(&self, token: &BearerToken) -> Result<ProviderClaims, ProviderError>;
}

/// Ordered chain of identity providers
///
/// Entries are tried in order. Reordering or adding a provider only
/// changes the table, not the control flow.
#[derive(Clone, Default)]
pub struct TokenVerifier {
    providers: Vec<(&'static str, Arc<dyn IdentityProvider>)>,
}

impl TokenVerifier {
    /// Create an empty chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider to the chain
    #[must_use]
    pub fn with_provider(mut self, name: &'static str, provider: Arc<dyn IdentityProvider>) -> Self {
        self.providers.push((name, provider));
        self
    }

    /// Build the chain from configuration
    ///
    /// Providers that lack the settings they need are left out: Firebase
    /// without a project ID, Google ID tokens without a client ID. The
    /// tokeninfo provider needs no settings.
    #[must_use]
    pub fn from_config(config: &AuthConfig, http_client: &Client) -> Self {
        let mut verifier = Self::new();
        for kind in &config.provider_order {
            let provider: Option<Arc<dyn IdentityProvider>> = match kind {
                ProviderKind::Firebase => config
                    .firebase
                    .project_id
                    .as_ref()
                    .filter(|_| config.firebase.is_configured())
                    .map(|project_id| {
                        Arc::new(FirebaseProvider::new(
                            project_id,
                            &config.firebase.certs_url,
                            http_client.clone(),
                        )) as Arc<dyn IdentityProvider>
                    }),
                ProviderKind::GoogleIdToken => config.google.client_id.as_ref().map(|client_id| {
                    Arc::new(GoogleIdTokenProvider::new(
                        client_id,
                        &config.google.certs_url,
                        http_client.clone(),
                    )) as Arc<dyn IdentityProvider>
                }),
                ProviderKind::GoogleAccessToken => {
                    let audience = config
                        .google
                        .client_id
                        .clone()
                        .filter(|_| config.google.access_token_audience_check);
                    Some(Arc::new(GoogleAccessTokenProvider::new(
                        &config.google.tokeninfo_url,
                        audience,
                        http_client.clone(),
                    )))
                }
            };
            match provider {
                Some(provider) => verifier = verifier.with_provider(kind.as_str(), provider),
                None => debug!(provider = %kind, "Identity provider not configured, skipping"),
            }
        }
        info!(providers = ?verifier.provider_names(), "Token verification chain ready");
        verifier
    }

    /// Provider names in chain order
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|(name, _)| *name).collect()
    }

    /// Verify a bearer token against the chain
    ///
    /// Never fails: every provider error becomes part of the rejection.
    pub async fn verify(&self, token: &BearerToken) -> AuthenticationOutcome {
        let shape = token.shape();
        let mut attempts = Vec::new();

        for (name, provider) in &self.providers {
            let name = *name;
            if !provider.applies_to(shape) {
                debug!(provider = name, ?shape, "Provider does not apply to token shape");
                continue;
            }
            match provider.verify(token).await {
                Ok(claims) => return Self::accept(provider.issuer(), claims),
                Err(cause) => {
                    debug!(provider = name, error = %cause, "Verification attempt failed");
                    attempts.push(ProviderFailure {
                        provider: name,
                        cause,
                    });
                }
            }
        }

        AuthenticationOutcome::Rejected(RejectionReason::VerificationFailed { attempts })
    }

    fn accept(issuer: Issuer, claims: ProviderClaims) -> AuthenticationOutcome {
        match claims.email.filter(|email| !email.trim().is_empty()) {
            Some(email) => AuthenticationOutcome::Authenticated(VerifiedIdentity {
                subject: claims.subject,
                email,
                issuer,
                display_name: claims.display_name,
            }),
            None => {
                debug!(issuer = %issuer, "Token accepted but carries no email claim");
                AuthenticationOutcome::Rejected(RejectionReason::IncompleteIdentity { issuer })
            }
        }
    }
}
