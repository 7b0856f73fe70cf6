// ABOUTME: Route module organization and router assembly for the gateway
// ABOUTME: Shared handler state plus the middleware stack around all routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! HTTP routes
//!
//! Every route sits behind the same middleware stack; the auth gate itself
//! decides which paths and methods need a token.

/// OAuth protected resource metadata
pub mod discovery;
/// Liveness endpoint
pub mod health;
/// JSON-RPC relay to the tool backend and remote agent
pub mod relay;

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use gateway_core::constants::network::INBOUND_REQUEST_TIMEOUT_SECS;
use reqwest_middleware::ClientWithMiddleware;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

pub use discovery::{DiscoveryRoutes, ProtectedResourceMetadata};
pub use health::HealthRoutes;
pub use relay::RelayRoutes;

use crate::a2a::RemoteAgentClient;
use crate::config::ServerConfig;
use crate::mcp::ToolBackendClient;
use crate::middleware::{auth_gate_middleware, request_id_middleware, setup_cors, AuthGate};

/// State shared by route handlers
#[derive(Clone)]
pub struct AppState {
    /// MCP tool backend, when configured
    pub tool_backend: Option<ToolBackendClient>,
    /// Remote A2A agent, when configured
    pub remote_agent: Option<RemoteAgentClient>,
    /// Public base URL of this gateway
    pub app_url: Arc<str>,
    /// Authorization server advertised to clients
    pub authorization_server: Arc<str>,
}

impl AppState {
    /// Build handler state, sharing `http` between both downstream clients
    #[must_use]
    pub fn from_config(config: &ServerConfig, http: &ClientWithMiddleware) -> Self {
        let tool_backend = config
            .downstream
            .tool_backend_url
            .clone()
            .map(|url| ToolBackendClient::new(url, http.clone()));
        let remote_agent = config
            .downstream
            .remote_agent_url
            .clone()
            .map(|url| RemoteAgentClient::new(url, http.clone()));
        info!(
            tool_backend = tool_backend.is_some(),
            remote_agent = remote_agent.is_some(),
            "Downstream clients configured"
        );
        Self {
            tool_backend,
            remote_agent,
            app_url: Arc::from(config.app_url.as_str()),
            authorization_server: Arc::from(config.gate.authorization_server.as_str()),
        }
    }
}

/// Assemble all routes with the middleware stack
///
/// Layer order, outermost first: CORS, timeout, request id span, auth gate.
pub fn build_router(state: AppState, gate: AuthGate, config: &ServerConfig) -> Router {
    Router::new()
        .merge(HealthRoutes::routes())
        .merge(DiscoveryRoutes::routes())
        .merge(RelayRoutes::routes(&config.gate.rpc_path))
        .with_state(state)
        .layer(middleware::from_fn_with_state(gate, auth_gate_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(
            INBOUND_REQUEST_TIMEOUT_SECS,
        )))
        .layer(setup_cors(&config.cors))
}
