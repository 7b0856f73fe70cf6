// ABOUTME: Gateway server lifecycle: wiring configuration into clients, verifier and router
// ABOUTME: Binds the listener and serves until a shutdown signal arrives
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::Router;
use gateway_core::errors::{AppError, AppResult};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::auth::TokenVerifier;
use crate::config::ServerConfig;
use crate::middleware::AuthGate;
use crate::outbound::{build_client, forwarding_client};
use crate::routes::{build_router, AppState};

/// Assembled gateway, ready to serve
pub struct GatewayServer {
    config: ServerConfig,
    router: Router,
}

impl GatewayServer {
    /// Wire all components from `config`
    ///
    /// Identity provider endpoints get the plain client; downstream services
    /// get the same pool wrapped with credential forwarding.
    ///
    /// # Errors
    ///
    /// Returns an error if the outbound HTTP client cannot be built.
    pub fn new(config: ServerConfig) -> AppResult<Self> {
        let http_client = build_client(&config.http_client)?;
        let verifier = TokenVerifier::from_config(&config.auth, &http_client);
        if verifier.provider_names().is_empty() {
            warn!("No identity provider configured, every protected request will be rejected");
        }

        let gate = AuthGate::new(verifier, &config.gate);
        let state = AppState::from_config(&config, &forwarding_client(http_client));
        let router = build_router(state, gate, &config);
        Ok(Self { config, router })
    }

    /// The fully layered router
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind and serve until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn run(self) -> AppResult<()> {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {address}: {e}")))?;
        info!(%address, rpc_path = %self.config.gate.rpc_path, "Gateway listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        info!("Gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
