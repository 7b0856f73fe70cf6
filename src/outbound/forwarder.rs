// ABOUTME: Credential forwarding hook injecting the request context's bearer token into outbound calls
// ABOUTME: Runs as reqwest-middleware at send time and touches only the outgoing request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use http::Extensions;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use tracing::{debug, warn};

use crate::context::RequestContext;

/// Request extension that turns forwarding off for one call
///
/// ```rust,no_run
/// # use assistant_gateway::outbound::{SkipCredentialForwarding};
/// # async fn example(client: reqwest_middleware::ClientWithMiddleware) {
/// let _ = client
///     .get("https://agent.example.com/.well-known/agent-card.json")
///     .with_extension(SkipCredentialForwarding)
///     .send()
///     .await;
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SkipCredentialForwarding;

/// Forwards the inbound bearer token on outbound requests
///
/// The shared client holds no per-request data: the token is read from
/// [`RequestContext`] each time a request is sent, so concurrent requests
/// through the same client forward their own tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialForwarder;

impl CredentialForwarder {
    /// Headers to add to an outbound request
    ///
    /// `Authorization: Bearer <token>` when the context holds a token, empty
    /// otherwise.
    #[must_use]
    pub fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = RequestContext::get() {
            match HeaderValue::from_str(&token.authorization_value()) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Context token is not a valid header value, not forwarding"),
            }
        }
        headers
    }
}

#[async_trait]
impl Middleware for CredentialForwarder {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        if extensions.get::<SkipCredentialForwarding>().is_some() {
            debug!(url = %req.url(), "Credential forwarding skipped");
        } else {
            let headers = Self::headers();
            if headers.is_empty() {
                debug!(url = %req.url(), "No request context token to forward");
            }
            for (name, value) in &headers {
                req.headers_mut().insert(name.clone(), value.clone());
            }
        }
        next.run(req, extensions).await
    }
}
