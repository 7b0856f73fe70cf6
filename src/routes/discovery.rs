// ABOUTME: OAuth 2.0 protected resource metadata (RFC 9728) for client discovery
// ABOUTME: Tells clients which authorization server issues tokens accepted by the gate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::{extract::State, routing::get, Json, Router};
use gateway_core::constants::paths;
use serde::{Deserialize, Serialize};

use super::AppState;

/// Protected resource metadata document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// Public base URL of this gateway
    pub resource: String,
    /// Authorization servers whose tokens are accepted
    pub authorization_servers: Vec<String>,
    /// Always `["header"]`: tokens are accepted only in `Authorization`
    pub bearer_methods_supported: Vec<String>,
}

/// Discovery routes implementation
pub struct DiscoveryRoutes;

impl DiscoveryRoutes {
    /// `GET /.well-known/oauth-protected-resource`
    pub fn routes() -> Router<AppState> {
        Router::new().route(
            paths::PROTECTED_RESOURCE_METADATA,
            get(Self::handle_protected_resource),
        )
    }

    async fn handle_protected_resource(
        State(state): State<AppState>,
    ) -> Json<ProtectedResourceMetadata> {
        Json(ProtectedResourceMetadata {
            resource: state.app_url.to_string(),
            authorization_servers: vec![state.authorization_server.to_string()],
            bearer_methods_supported: vec!["header".to_owned()],
        })
    }
}
