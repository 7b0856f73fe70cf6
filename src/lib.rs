// ABOUTME: Main library entry point for the assistant gateway
// ABOUTME: Bearer-token auth gate for A2A agents with credential forwarding to downstream services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Assistant Gateway
//!
//! Front door of an A2A assistant agent. Requests to the protected path
//! prefix must carry a bearer token, which is verified against an ordered
//! chain of identity providers (Firebase, Google ID tokens, Google
//! tokeninfo). The accepted token is bound to a task-scoped request context
//! for the lifetime of the handler, and every outbound call to the MCP tool
//! backend or the remote agent forwards it.
//!
//! ## Architecture
//!
//! - **auth**: token parsing, identity providers and the verifier chain
//! - **context**: task-local request context holding the inbound token
//! - **middleware**: auth gate, request ids, CORS
//! - **outbound**: shared HTTP clients and the credential forwarding hook
//! - **mcp** / **a2a**: downstream clients
//! - **routes** / **server**: router assembly and lifecycle
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use assistant_gateway::config::ServerConfig;
//! use assistant_gateway::server::GatewayServer;
//! use assistant_gateway::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     GatewayServer::new(config)?.run().await
//! }
//! ```

/// A2A client for the remote delegate agent
pub mod a2a;

/// Bearer token verification
pub mod auth;

/// Environment-based configuration
pub mod config;

/// Task-scoped request context
pub mod context;

/// JSON-RPC 2.0 message types
pub mod jsonrpc;

/// Structured logging setup
pub mod logging;

/// MCP client for the tool backend
pub mod mcp;

/// HTTP middleware
pub mod middleware;

/// Outbound HTTP clients and credential forwarding
pub mod outbound;

/// Routes and router assembly
pub mod routes;

/// Server lifecycle
pub mod server;

pub use gateway_core::{constants, errors};
