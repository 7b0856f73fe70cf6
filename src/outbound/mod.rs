// ABOUTME: Outbound HTTP plumbing for calls made on behalf of the authenticated user
// ABOUTME: Shared clients, the credential forwarding hook and the downstream error type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde_json::Value;
use thiserror::Error;

use crate::jsonrpc::JsonRpcResponse;

/// Credential forwarding middleware
pub mod forwarder;
/// Shared client construction
pub mod http_client;

pub use forwarder::{CredentialForwarder, SkipCredentialForwarding};
pub use http_client::{build_client, forwarding_client};

/// Failure talking to a downstream service
#[derive(Debug, Error)]
pub enum OutboundError {
    /// The service is not configured
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The request could not be sent or the response not read
    #[error("{service} request failed: {message}")]
    Transport {
        /// Service name
        service: &'static str,
        /// Underlying error
        message: String,
    },

    /// Non-success HTTP status
    #[error("{service} returned HTTP {status}")]
    Status {
        /// Service name
        service: &'static str,
        /// HTTP status code
        status: u16,
    },

    /// The body could not be understood
    #[error("{service} sent an invalid response: {message}")]
    InvalidResponse {
        /// Service name
        service: &'static str,
        /// What was wrong
        message: String,
    },

    /// The service answered with a JSON-RPC error
    #[error("{service} error {code}: {message}")]
    Rpc {
        /// Service name
        service: &'static str,
        /// JSON-RPC error code
        code: i32,
        /// Error message from the service
        message: String,
    },
}

impl OutboundError {
    pub(crate) fn transport(service: &'static str, error: &impl std::fmt::Display) -> Self {
        Self::Transport {
            service,
            message: error.to_string(),
        }
    }

    pub(crate) fn invalid(service: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            message: message.into(),
        }
    }
}

/// Take the result out of a JSON-RPC response, turning errors into `Rpc`
pub(crate) fn rpc_result(
    service: &'static str,
    response: JsonRpcResponse,
) -> Result<Value, OutboundError> {
    if let Some(error) = response.error {
        return Err(OutboundError::Rpc {
            service,
            code: error.code,
            message: error.message,
        });
    }
    response
        .result
        .ok_or_else(|| OutboundError::invalid(service, "response has neither result nor error"))
}
