// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Endpoint URLs, header names, protocol identifiers and defaults for the gateway
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into small domain modules rather than a single
//! flat namespace.

/// Bearer authentication
pub mod auth {
    /// Scheme prefix expected at the start of the `Authorization` header
    pub const BEARER_PREFIX: &str = "Bearer ";
    /// Rejection message when the header is absent
    pub const MISSING_HEADER: &str = "Missing Authorization header";
    /// Rejection message when the header does not carry a bearer credential
    pub const INVALID_HEADER_FORMAT: &str =
        "Invalid Authorization header format. Expected 'Bearer <token>'";
    /// Default authorization server advertised in `WWW-Authenticate`
    pub const DEFAULT_AUTHORIZATION_SERVER: &str = "https://accounts.google.com";
}

/// Google OAuth2 / OpenID Connect endpoints
pub mod google {
    /// Google's JWKS endpoint for ID token signing keys
    pub const CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
    /// Opaque access-token introspection endpoint
    pub const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
    /// Accepted `iss` values for Google ID tokens
    pub const ID_TOKEN_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
}

/// Firebase Authentication
pub mod firebase {
    /// Google's Firebase public key endpoint (X.509 certificates keyed by `kid`)
    pub const CERTS_URL: &str =
        "https://www.googleapis.com/robot/v1/metadata/x509/securetoken@system.gserviceaccount.com";
    /// Firebase issuer URL prefix (followed by the project ID)
    pub const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
}

/// Signing key cache behaviour
pub mod key_cache {
    /// Minimum cache TTL in seconds (5 minutes)
    pub const MIN_TTL_SECS: i64 = 300;
    /// Default cache TTL in seconds if Cache-Control header is missing (1 hour)
    pub const DEFAULT_TTL_SECS: i64 = 3600;
    /// Maximum cache TTL in seconds (1 day), whatever the endpoint advertises
    pub const MAX_TTL_SECS: i64 = 86_400;
    /// Seconds after a refresh during which an unknown `kid` does not trigger another fetch
    pub const REFRESH_COOLDOWN_SECS: i64 = 60;
}

/// Model Context Protocol (streamable HTTP transport)
pub mod mcp {
    /// Protocol revision announced during `initialize`
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
    /// Session header returned by `initialize` and echoed on later calls
    pub const SESSION_HEADER: &str = "mcp-session-id";
    /// Protocol version header sent after initialization
    pub const PROTOCOL_VERSION_HEADER: &str = "mcp-protocol-version";
    /// Accept header required by streamable HTTP servers
    pub const ACCEPT: &str = "application/json, text/event-stream";
}

/// Agent-to-Agent protocol
pub mod a2a {
    /// Well-known location of an agent card relative to the agent base URL
    pub const AGENT_CARD_PATH: &str = "/.well-known/agent-card.json";
    /// JSON-RPC method for sending a message to an agent
    pub const METHOD_MESSAGE_SEND: &str = "message/send";
}

/// HTTP routes and path defaults
pub mod paths {
    /// Default prefix under which authentication is enforced
    pub const DEFAULT_PROTECTED_PREFIX: &str = "/a2a/";
    /// Default JSON-RPC endpoint
    pub const DEFAULT_RPC_PATH: &str = "/a2a/app";
    /// OAuth protected resource metadata (RFC 9728)
    pub const PROTECTED_RESOURCE_METADATA: &str = "/.well-known/oauth-protected-resource";
    /// Health check endpoint
    pub const HEALTH_CHECK: &str = "/health";
}

/// Network defaults
pub mod network {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8001;
    /// Default bind address
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    /// Default outbound request timeout in seconds
    pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 30;
    /// Default outbound connect timeout in seconds
    pub const DEFAULT_CLIENT_CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Upper bound on handling one inbound request, downstream calls included
    pub const INBOUND_REQUEST_TIMEOUT_SECS: u64 = 120;
}

/// Service names for structured logging
pub mod service_names {
    /// Main gateway service
    pub const ASSISTANT_GATEWAY: &str = "assistant-gateway";
}

/// JSON-RPC error codes
pub mod jsonrpc {
    /// Invalid JSON was received
    pub const PARSE_ERROR: i32 = -32700;
    /// Request object is not valid JSON-RPC
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method does not exist
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters
    pub const INVALID_PARAMS: i32 = -32602;
    /// Downstream (tool backend / remote agent) failure
    pub const DOWNSTREAM_ERROR: i32 = -32000;
}
