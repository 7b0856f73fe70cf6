// ABOUTME: Shared outbound HTTP clients with configured timeouts
// ABOUTME: A plain client for identity provider endpoints and a forwarding client for downstream services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use gateway_core::errors::{AppError, AppResult};
use reqwest::{Client, ClientBuilder};
use reqwest_middleware::ClientWithMiddleware;

use super::forwarder::CredentialForwarder;
use crate::config::HttpClientConfig;

/// Build a pooled client with the configured timeouts
///
/// Used directly for Google and Firebase endpoints, which must never
/// receive the user's token.
///
/// # Errors
///
/// Returns an error if the TLS backend or system proxy settings cannot be
/// loaded. There is no fallback: a client without timeouts could hang
/// requests indefinitely.
pub fn build_client(config: &HttpClientConfig) -> AppResult<Client> {
    ClientBuilder::new()
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .build()
        .map_err(|e| {
            AppError::internal(format!("Failed to build HTTP client: {e}")).with_source(e)
        })
}

/// Wrap `client` with the credential forwarding hook
///
/// Every request sent through the returned client carries the request
/// context's bearer token.
#[must_use]
pub fn forwarding_client(client: Client) -> ClientWithMiddleware {
    reqwest_middleware::ClientBuilder::new(client)
        .with(CredentialForwarder)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_with_defaults() {
        assert!(build_client(&HttpClientConfig::default()).is_ok());
        assert!(build_client(&HttpClientConfig {
            timeout_secs: 5,
            connect_timeout_secs: 1,
        })
        .is_ok());
    }
}
