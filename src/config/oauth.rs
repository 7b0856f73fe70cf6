// ABOUTME: Identity provider configuration for bearer token verification
// ABOUTME: Firebase and Google OAuth settings plus the ordered provider chain
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use gateway_core::constants::{firebase, google};
use gateway_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::environment::{env_opt, env_var_or, parse_bool};

/// Environment variable holding the provider chain order
pub const PROVIDER_ORDER_ENV: &str = "AUTH_PROVIDER_ORDER";

/// Default provider chain order
pub const DEFAULT_PROVIDER_ORDER: &str = "firebase,google-id-token,google-access-token";

/// Identity providers that can take part in the verification chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Firebase Authentication ID tokens
    Firebase,
    /// Google-signed OpenID Connect ID tokens
    GoogleIdToken,
    /// Opaque Google OAuth2 access tokens checked via tokeninfo
    GoogleAccessToken,
}

impl ProviderKind {
    /// Stable name used in configuration and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Firebase => "firebase",
            Self::GoogleIdToken => "google-id-token",
            Self::GoogleAccessToken => "google-access-token",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(Self::Firebase),
            "google-id-token" => Ok(Self::GoogleIdToken),
            "google-access-token" => Ok(Self::GoogleAccessToken),
            other => Err(AppError::config_invalid(
                PROVIDER_ORDER_ENV,
                format!("unknown provider '{other}'"),
            )),
        }
    }
}

/// Parse a comma-separated provider order
///
/// # Errors
///
/// Returns a configuration error if the list is empty, names an unknown
/// provider, or repeats one.
pub fn parse_provider_order(value: &str) -> AppResult<Vec<ProviderKind>> {
    let mut order = Vec::new();
    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind: ProviderKind = name.parse()?;
        if order.contains(&kind) {
            return Err(AppError::config_invalid(
                PROVIDER_ORDER_ENV,
                format!("provider '{kind}' listed twice"),
            ));
        }
        order.push(kind);
    }
    if order.is_empty() {
        return Err(AppError::config_invalid(
            PROVIDER_ORDER_ENV,
            "at least one provider is required",
        ));
    }
    Ok(order)
}

/// Firebase Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    /// Firebase project ID (required for token validation)
    pub project_id: Option<String>,
    /// Whether Firebase authentication is enabled
    pub enabled: bool,
    /// Public key endpoint
    pub certs_url: String,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            enabled: false,
            certs_url: firebase::CERTS_URL.to_owned(),
        }
    }
}

impl FirebaseConfig {
    /// Check if Firebase is properly configured and enabled
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.enabled && self.project_id.is_some()
    }

    /// Load Firebase configuration from environment
    ///
    /// Environment variables:
    /// - `FIREBASE_PROJECT_ID` - Firebase project ID
    /// - `FIREBASE_ENABLED` - toggle (default: true when a project ID is set)
    /// - `FIREBASE_CERTS_URL` - public key endpoint override
    ///
    /// # Errors
    ///
    /// Returns an error if `FIREBASE_ENABLED` is not a boolean.
    pub fn from_env() -> AppResult<Self> {
        let project_id = env_opt("FIREBASE_PROJECT_ID");
        let enabled = project_id.is_some()
            && parse_bool("FIREBASE_ENABLED", &env_var_or("FIREBASE_ENABLED", "true"))?;

        if enabled {
            info!(
                project_id = project_id.as_deref().unwrap_or("(not set)"),
                "Firebase authentication enabled"
            );
        }

        Ok(Self {
            project_id,
            enabled,
            certs_url: env_var_or("FIREBASE_CERTS_URL", firebase::CERTS_URL),
        })
    }
}

/// Google OAuth2 / OpenID Connect configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID; the expected ID token audience
    pub client_id: Option<String>,
    /// JWKS endpoint for ID token signing keys
    pub certs_url: String,
    /// Access token introspection endpoint
    pub tokeninfo_url: String,
    /// Require tokeninfo `aud` or `azp` to match `client_id`
    pub access_token_audience_check: bool,
}

impl Default for GoogleOAuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            certs_url: google::CERTS_URL.to_owned(),
            tokeninfo_url: google::TOKENINFO_URL.to_owned(),
            access_token_audience_check: false,
        }
    }
}

impl GoogleOAuthConfig {
    /// Load Google configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if `GOOGLE_ACCESS_TOKEN_AUDIENCE_CHECK` is not a
    /// boolean, or is enabled without `GOOGLE_CLIENT_ID`.
    pub fn from_env() -> AppResult<Self> {
        let client_id = env_opt("GOOGLE_CLIENT_ID");
        let access_token_audience_check = parse_bool(
            "GOOGLE_ACCESS_TOKEN_AUDIENCE_CHECK",
            &env_var_or("GOOGLE_ACCESS_TOKEN_AUDIENCE_CHECK", "false"),
        )?;
        if access_token_audience_check && client_id.is_none() {
            return Err(AppError::config_invalid(
                "GOOGLE_ACCESS_TOKEN_AUDIENCE_CHECK",
                "requires GOOGLE_CLIENT_ID",
            ));
        }

        Ok(Self {
            client_id,
            certs_url: env_var_or("GOOGLE_CERTS_URL", google::CERTS_URL),
            tokeninfo_url: env_var_or("GOOGLE_TOKENINFO_URL", google::TOKENINFO_URL),
            access_token_audience_check,
        })
    }
}

/// Token verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Order in which providers are tried
    pub provider_order: Vec<ProviderKind>,
    /// Firebase settings
    pub firebase: FirebaseConfig,
    /// Google settings
    pub google: GoogleOAuthConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider_order: vec![
                ProviderKind::Firebase,
                ProviderKind::GoogleIdToken,
                ProviderKind::GoogleAccessToken,
            ],
            firebase: FirebaseConfig::default(),
            google: GoogleOAuthConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Load verification configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if any auth-related variable is invalid.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            provider_order: parse_provider_order(&env_var_or(
                PROVIDER_ORDER_ENV,
                DEFAULT_PROVIDER_ORDER,
            ))?,
            firebase: FirebaseConfig::from_env()?,
            google: GoogleOAuthConfig::from_env()?,
        })
    }
}
