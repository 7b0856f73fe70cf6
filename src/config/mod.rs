// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Environment-only loading of network, auth gate, provider and downstream settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module for the assistant gateway
//!
//! Everything is read from environment variables at startup:
//!
//! - **Environment**: network, auth gate, downstream services, outbound client
//! - **OAuth**: Firebase and Google settings and the provider chain order

/// Environment and server configuration
pub mod environment;
/// Identity provider configuration
pub mod oauth;

pub use environment::{CorsConfig, DownstreamConfig, GateConfig, HttpClientConfig, ServerConfig};
pub use oauth::{AuthConfig, FirebaseConfig, GoogleOAuthConfig, ProviderKind};
