// ABOUTME: HTTP middleware for authentication, request correlation and CORS
// ABOUTME: Auth gate, request ID spans and cross-origin configuration for the axum router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Bearer token auth gate
pub mod auth;
/// CORS configuration
pub mod cors;
/// Request ID assignment and request spans
pub mod request_id;

pub use auth::{auth_gate_middleware, AuthGate, AuthRejection};
pub use cors::setup_cors;
pub use request_id::{request_id_middleware, RequestId};
