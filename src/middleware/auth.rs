// ABOUTME: Auth gate middleware enforcing bearer authentication on the protected path prefix
// ABOUTME: Verifies tokens, scopes the request context to the handler and renders 401 rejections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Auth gate
//!
//! Requests under the protected prefix need `Authorization: Bearer <token>`
//! unless they are `GET` (agent card discovery) or `OPTIONS` (CORS
//! preflight). A verified token is bound to the request context for exactly
//! the duration of the downstream handler, and the verified identity is
//! added to the request extensions.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{BearerToken, RejectionReason, TokenVerifier, VerifiedIdentity};
use crate::config::GateConfig;
use crate::context::RequestContext;

/// Shared state of the auth gate middleware
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<TokenVerifier>,
    protected_prefix: Arc<str>,
    authorization_server: Arc<str>,
}

impl AuthGate {
    /// Create a gate using `verifier` for the paths described by `config`
    #[must_use]
    pub fn new(verifier: TokenVerifier, config: &GateConfig) -> Self {
        Self {
            verifier: Arc::new(verifier),
            protected_prefix: Arc::from(config.protected_prefix.as_str()),
            authorization_server: Arc::from(config.authorization_server.as_str()),
        }
    }

    /// Whether a request must present a verified bearer token
    #[must_use]
    pub fn requires_auth(&self, method: &Method, path: &str) -> bool {
        path.starts_with(&*self.protected_prefix)
            && method != Method::GET
            && method != Method::OPTIONS
    }

    /// Extract and verify the bearer token from request headers
    ///
    /// # Errors
    ///
    /// Returns the reason the request is not authenticated.
    #[tracing::instrument(
        skip_all,
        fields(
            issuer = tracing::field::Empty,
            success = tracing::field::Empty,
        )
    )]
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<(BearerToken, VerifiedIdentity), RejectionReason> {
        let header = match headers.get(header::AUTHORIZATION) {
            None => None,
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| RejectionReason::MalformedCredential)?,
            ),
        };
        let token = BearerToken::from_authorization_header(header)?;

        let result = self.verifier.verify(&token).await.into_result();
        let span = tracing::Span::current();
        span.record("success", result.is_ok());
        if let Ok(identity) = &result {
            span.record("issuer", identity.issuer.as_str());
        }
        result.map(|identity| (token, identity))
    }

    /// Build the 401 response for a rejection
    #[must_use]
    pub fn reject(&self, reason: RejectionReason) -> AuthRejection {
        AuthRejection {
            reason,
            authorization_server: Arc::clone(&self.authorization_server),
        }
    }
}

/// Axum middleware function for the auth gate
///
/// Install with `axum::middleware::from_fn_with_state(gate, auth_gate_middleware)`.
pub async fn auth_gate_middleware(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    if !gate.requires_auth(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    match gate.authenticate(request.headers()).await {
        Ok((token, identity)) => {
            info!(
                email = %identity.email,
                issuer = %identity.issuer,
                "Authenticated request"
            );
            request.extensions_mut().insert(identity);
            RequestContext::scope(token, next.run(request)).await
        }
        Err(reason) => {
            warn!(reason = %reason, path = %request.uri().path(), "Rejected request");
            gate.reject(reason).into_response()
        }
    }
}

/// A 401 response carrying the rejection reason
#[derive(Debug)]
pub struct AuthRejection {
    reason: RejectionReason,
    authorization_server: Arc<str>,
}

impl AuthRejection {
    /// Why the request was rejected
    #[must_use]
    pub const fn reason(&self) -> &RejectionReason {
        &self.reason
    }

    fn challenge(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "Bearer authorization_server=\"{}\"",
            self.authorization_server
        ))
        .ok()
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let challenge = self.challenge();
        let body = Json(json!({ "error": self.reason.to_string() }));
        let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
        if let Some(challenge) = challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, challenge);
        }
        response
    }
}
