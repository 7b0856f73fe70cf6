// ABOUTME: Public signing key fetch and cache for RS256 token verification
// ABOUTME: Reads X.509 certificate maps or JWKS documents and honours Cache-Control max-age
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Signing key cache
//!
//! Google publishes token signing keys in two formats:
//!
//! - a map of key ID to PEM-encoded X.509 certificate (Firebase `securetoken`)
//! - a JWKS document, `{"keys": [{"kid", "n", "e", ...}]}` (Google `oauth2/v3/certs`)
//!
//! The format is detected from the response body. Keys are cached until the
//! `Cache-Control: max-age` of the response expires (clamped to
//! [`MIN_TTL_SECS`], [`MAX_TTL_SECS`]). A key ID missing from the cache
//! forces a refresh, which picks up key rotations early. Refreshes are
//! serialized, and within [`REFRESH_COOLDOWN_SECS`] of the last one an
//! unknown key ID is rejected without refetching.

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use gateway_core::constants::key_cache::{
    DEFAULT_TTL_SECS, MAX_TTL_SECS, MIN_TTL_SECS, REFRESH_COOLDOWN_SECS,
};
use jsonwebtoken::DecodingKey;
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use x509_parser::prelude::*;

use super::ProviderError;

/// Cached public keys
struct CachedKeys {
    /// Key ID to decoding key mapping
    keys: HashMap<String, DecodingKey>,
    /// When the cache expires
    expires_at: DateTime<Utc>,
    /// When the keys were fetched
    fetched_at: DateTime<Utc>,
}

/// One entry of a JWKS document
#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

/// JWKS document
#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Key cache for one signing authority
///
/// Cloning is cheap and clones share the cache.
#[derive(Clone)]
pub struct SigningKeyCache {
    /// Authority name for logs
    label: &'static str,
    /// Key endpoint
    certs_url: String,
    /// Client for the key endpoint; never carries user credentials
    http_client: Client,
    cached_keys: Arc<RwLock<Option<CachedKeys>>>,
    /// Held while fetching so concurrent misses share one fetch
    refresh_lock: Arc<Mutex<()>>,
}

impl SigningKeyCache {
    /// Create an empty cache for the given key endpoint
    #[must_use]
    pub fn new(label: &'static str, certs_url: impl Into<String>, http_client: Client) -> Self {
        Self {
            label,
            certs_url: certs_url.into(),
            http_client,
            cached_keys: Arc::new(RwLock::new(None)),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the decoding key for a key ID
    ///
    /// Fetches keys from the endpoint if the cache is expired or does not
    /// know the key ID.
    ///
    /// # Errors
    ///
    /// Returns `KeysUnavailable` if the endpoint cannot be read, and
    /// `InvalidToken` if the key ID is still unknown after a refresh or
    /// during the refresh cooldown.
    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, ProviderError> {
        if let Some(key) = self.try_get_cached_key(kid).await {
            return Ok(key);
        }

        let _refreshing = self.refresh_lock.lock().await;
        // Another task may have refreshed while this one waited
        if let Some(key) = self.try_get_cached_key(kid).await {
            return Ok(key);
        }
        if self.refreshed_recently().await {
            debug!(authority = self.label, kid = %kid, "Unknown kid within refresh cooldown");
            return Err(unknown_key());
        }

        self.refresh_keys().await?;

        self.get_cached_key_or_error(kid).await
    }

    async fn refreshed_recently(&self) -> bool {
        let now = Utc::now();
        let cache = self.cached_keys.read().await;
        cache.as_ref().is_some_and(|cached| {
            cached.expires_at > now
                && now - cached.fetched_at < Duration::seconds(REFRESH_COOLDOWN_SECS)
        })
    }

    async fn try_get_cached_key(&self, kid: &str) -> Option<DecodingKey> {
        let result = {
            let cache = self.cached_keys.read().await;
            cache.as_ref().and_then(|cached| {
                if cached.expires_at > Utc::now() {
                    cached.keys.get(kid).cloned()
                } else {
                    None
                }
            })
        };
        if result.is_some() {
            debug!(authority = self.label, kid = %kid, "Using cached signing key");
        }
        result
    }

    async fn get_cached_key_or_error(&self, kid: &str) -> Result<DecodingKey, ProviderError> {
        let cache = self.cached_keys.read().await;
        let cached = cache
            .as_ref()
            .ok_or_else(|| ProviderError::KeysUnavailable("key cache is empty".to_owned()))?;
        cached.keys.get(kid).cloned().ok_or_else(|| {
            debug!(authority = self.label, kid = %kid, "Signing key not found for kid");
            unknown_key()
        })
    }

    async fn refresh_keys(&self) -> Result<(), ProviderError> {
        info!(authority = self.label, "Fetching public signing keys");

        let (body, cache_ttl) = self.fetch_key_document().await?;
        let keys = parse_key_document(&body)?;
        self.update_cache(keys, cache_ttl).await;

        Ok(())
    }

    async fn fetch_key_document(&self) -> Result<(Value, i64), ProviderError> {
        let response = self
            .http_client
            .get(&self.certs_url)
            .send()
            .await
            .map_err(|e| {
                warn!(authority = self.label, error = %e, "Failed to fetch public keys");
                ProviderError::KeysUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(authority = self.label, %status, "Key endpoint returned an error");
            return Err(ProviderError::KeysUnavailable(format!(
                "key endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let cache_ttl = cache_ttl(
            response
                .headers()
                .get(CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
        );

        let body: Value = response.json().await.map_err(|e| {
            warn!(authority = self.label, error = %e, "Failed to parse public keys response");
            ProviderError::KeysUnavailable(format!("unreadable key document: {e}"))
        })?;

        Ok((body, cache_ttl))
    }

    async fn update_cache(&self, keys: HashMap<String, DecodingKey>, cache_ttl: i64) {
        let fetched_at = Utc::now();
        let expires_at = fetched_at + Duration::seconds(cache_ttl);

        info!(
            authority = self.label,
            num_keys = keys.len(),
            cache_ttl_secs = cache_ttl,
            expires_at = %expires_at,
            "Public signing keys cached"
        );

        let mut cache = self.cached_keys.write().await;
        *cache = Some(CachedKeys {
            keys,
            expires_at,
            fetched_at,
        });
    }
}

fn unknown_key() -> ProviderError {
    ProviderError::InvalidToken("unknown token signing key".to_owned())
}

/// Cache lifetime in seconds for a key response's `Cache-Control` value
fn cache_ttl(cache_control: Option<&str>) -> i64 {
    cache_control
        .and_then(parse_max_age)
        .unwrap_or(DEFAULT_TTL_SECS)
        .clamp(MIN_TTL_SECS, MAX_TTL_SECS)
}

/// Turn a key document (JWKS or X.509 certificate map) into decoding keys
fn parse_key_document(body: &Value) -> Result<HashMap<String, DecodingKey>, ProviderError> {
    let keys = if body.get("keys").is_some() {
        let set: JwkSet = serde_json::from_value(body.clone())
            .map_err(|e| ProviderError::KeysUnavailable(format!("invalid JWKS: {e}")))?;
        convert_jwks_to_keys(set)
    } else {
        let certs: HashMap<String, String> = serde_json::from_value(body.clone()).map_err(|e| {
            ProviderError::KeysUnavailable(format!("invalid certificate map: {e}"))
        })?;
        convert_certs_to_keys(certs)
    };

    if keys.is_empty() {
        return Err(ProviderError::KeysUnavailable(
            "no usable public keys in key document".to_owned(),
        ));
    }
    Ok(keys)
}

fn convert_jwks_to_keys(set: JwkSet) -> HashMap<String, DecodingKey> {
    let mut keys = HashMap::with_capacity(set.keys.len());
    for jwk in set.keys {
        let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else {
            continue;
        };
        if jwk.kty != "RSA" {
            debug!(kid = %kid, kty = %jwk.kty, "Skipping non-RSA JWK");
            continue;
        }
        match DecodingKey::from_rsa_components(&n, &e) {
            Ok(key) => {
                keys.insert(kid, key);
            }
            Err(err) => warn!(kid = %kid, error = %err, "Failed to build key from JWK"),
        }
    }
    keys
}

fn convert_certs_to_keys(certs: HashMap<String, String>) -> HashMap<String, DecodingKey> {
    let mut keys = HashMap::with_capacity(certs.len());
    for (kid, cert_pem) in certs {
        let key = extract_public_key_from_cert(&cert_pem).and_then(|pem| {
            DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| e.to_string())
        });
        match key {
            Ok(key) => {
                keys.insert(kid, key);
            }
            Err(e) => {
                warn!(kid = %kid, error = %e, "Failed to extract public key from certificate");
            }
        }
    }
    keys
}

/// Parse max-age value from Cache-Control header
///
/// Example: "public, max-age=3600, must-revalidate" -> 3600
fn parse_max_age(cache_control: &str) -> Option<i64> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|s| s.strip_prefix("max-age="))
        .and_then(|s| s.parse().ok())
}

/// Extract the public key from an X.509 certificate in PEM format
fn extract_public_key_from_cert(cert_pem: &str) -> Result<String, String> {
    let (_, pem) = parse_x509_pem(cert_pem.as_bytes())
        .map_err(|e| format!("Failed to parse X.509 PEM: {e}"))?;

    let (_, cert) = X509Certificate::from_der(&pem.contents)
        .map_err(|e| format!("Failed to parse X.509 certificate: {e}"))?;

    // SubjectPublicKeyInfo is already DER; wrap it as a PEM public key
    let encoded = STANDARD.encode(cert.public_key().raw);
    let lines: Vec<&str> = encoded
        .as_bytes()
        .chunks(64)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();

    Ok(format!(
        "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
        lines.join("\n")
    ))
}
