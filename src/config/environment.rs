// ABOUTME: Server configuration loaded from environment variables
// ABOUTME: Network, auth gate, downstream service and outbound client settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::str::FromStr;
use std::time::Duration;

use gateway_core::constants::{auth, network, paths};
use gateway_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use super::oauth::AuthConfig;

/// Which requests the auth gate protects and how it challenges clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Path prefix under which non-GET, non-OPTIONS requests need a bearer token
    pub protected_prefix: String,
    /// JSON-RPC relay endpoint
    pub rpc_path: String,
    /// Authorization server advertised in `WWW-Authenticate` and discovery
    pub authorization_server: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected_prefix: paths::DEFAULT_PROTECTED_PREFIX.to_owned(),
            rpc_path: paths::DEFAULT_RPC_PATH.to_owned(),
            authorization_server: auth::DEFAULT_AUTHORIZATION_SERVER.to_owned(),
        }
    }
}

impl GateConfig {
    fn from_env() -> AppResult<Self> {
        let protected_prefix =
            env_var_or("A2A_PROTECTED_PREFIX", paths::DEFAULT_PROTECTED_PREFIX);
        if !protected_prefix.starts_with('/') {
            return Err(AppError::config_invalid(
                "A2A_PROTECTED_PREFIX",
                "must start with '/'",
            ));
        }
        let rpc_path = env_var_or("A2A_RPC_PATH", paths::DEFAULT_RPC_PATH);
        if !rpc_path.starts_with('/') {
            return Err(AppError::config_invalid("A2A_RPC_PATH", "must start with '/'"));
        }
        if !rpc_path.starts_with(&protected_prefix) {
            warn!(
                rpc_path = %rpc_path,
                protected_prefix = %protected_prefix,
                "RPC path is outside the protected prefix; relay calls will not be authenticated"
            );
        }
        Ok(Self {
            protected_prefix,
            rpc_path,
            authorization_server: env_var_or(
                "AUTH_AUTHORIZATION_SERVER",
                auth::DEFAULT_AUTHORIZATION_SERVER,
            ),
        })
    }
}

/// Services the gateway calls on behalf of the authenticated user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownstreamConfig {
    /// MCP tool backend endpoint
    pub tool_backend_url: Option<Url>,
    /// Base URL of the remote A2A agent
    pub remote_agent_url: Option<Url>,
}

impl DownstreamConfig {
    fn from_env() -> AppResult<Self> {
        Ok(Self {
            tool_backend_url: env_url(&["TOOL_BACKEND_URL", "STASH_MCP_URL"])?,
            remote_agent_url: env_url(&["REMOTE_AGENT_URL", "TODO_AGENT_URL"])?,
        })
    }
}

/// Shared outbound HTTP client settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Total request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: network::DEFAULT_CLIENT_TIMEOUT_SECS,
            connect_timeout_secs: network::DEFAULT_CLIENT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl HttpClientConfig {
    /// Request timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout as a `Duration`
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    fn from_env() -> AppResult<Self> {
        Ok(Self {
            timeout_secs: parse_env(
                "HTTP_CLIENT_TIMEOUT_SECS",
                network::DEFAULT_CLIENT_TIMEOUT_SECS,
            )?,
            connect_timeout_secs: parse_env(
                "HTTP_CLIENT_CONNECT_TIMEOUT_SECS",
                network::DEFAULT_CLIENT_CONNECT_TIMEOUT_SECS,
            )?,
        })
    }
}

/// Cross-origin settings for browser clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated allowed origins, or `*`
    pub allowed_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: "*".to_owned(),
        }
    }
}

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Bind address
    pub host: String,
    /// Public base URL of this service
    pub app_url: String,
    /// Auth gate settings
    pub gate: GateConfig,
    /// Token verification settings
    pub auth: AuthConfig,
    /// Downstream services
    pub downstream: DownstreamConfig,
    /// Outbound HTTP client settings
    pub http_client: HttpClientConfig,
    /// CORS settings
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: network::DEFAULT_HTTP_PORT,
            host: network::DEFAULT_HOST.to_owned(),
            app_url: format!("http://localhost:{}", network::DEFAULT_HTTP_PORT),
            gate: GateConfig::default(),
            auth: AuthConfig::default(),
            downstream: DownstreamConfig::default(),
            http_client: HttpClientConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid variable.
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let http_port = parse_env("HTTP_PORT", network::DEFAULT_HTTP_PORT)?;
        let config = Self {
            http_port,
            host: env_var_or("HOST", network::DEFAULT_HOST),
            app_url: env_var_or("APP_URL", &format!("http://localhost:{http_port}")),
            gate: GateConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            downstream: DownstreamConfig::from_env()?,
            http_client: HttpClientConfig::from_env()?,
            cors: CorsConfig {
                allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "*"),
            },
        };
        config.log_summary();
        Ok(config)
    }

    /// Socket address string to bind
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    fn log_summary(&self) {
        let order: Vec<&str> = self
            .auth
            .provider_order
            .iter()
            .map(|kind| kind.as_str())
            .collect();
        info!(
            http_port = self.http_port,
            protected_prefix = %self.gate.protected_prefix,
            rpc_path = %self.gate.rpc_path,
            provider_order = ?order,
            firebase = self.auth.firebase.is_configured(),
            google_client_id = self.auth.google.client_id.is_some(),
            tool_backend = self.downstream.tool_backend_url.is_some(),
            remote_agent = self.downstream.remote_agent_url.is_some(),
            "Configuration loaded"
        );
    }
}

/// Get environment variable or default value
pub(crate) fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get a non-empty environment variable
pub(crate) fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Parse an environment variable, falling back to `default` when unset
pub(crate) fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e| AppError::config_invalid(key, format!("'{raw}': {e}")))
    })
}

/// Parse a boolean flag (`true`/`false`/`1`/`0`)
pub(crate) fn parse_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(AppError::config_invalid(
            key,
            format!("'{other}' is not a boolean"),
        )),
    }
}

/// First set variable among `keys`, parsed as an absolute URL
fn env_url(keys: &[&str]) -> AppResult<Option<Url>> {
    for key in keys {
        if let Some(raw) = env_opt(key) {
            let url = Url::parse(&raw).map_err(|e| AppError::config_invalid(key, e))?;
            return Ok(Some(url));
        }
    }
    Ok(None)
}
