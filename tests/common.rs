// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides logging, RSA signing keys, JWT minting, stub providers and gated routers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `assistant_gateway`

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once, OnceLock};

use assistant_gateway::auth::{
    BearerToken, IdentityProvider, Issuer, ProviderClaims, ProviderError, TokenVerifier,
    VerifiedIdentity,
};
use assistant_gateway::config::GateConfig;
use assistant_gateway::context::RequestContext;
use assistant_gateway::middleware::{auth_gate_middleware, AuthGate};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    middleware,
    routing::post,
    Extension, Json, Router,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request as MockRequest, Respond, ResponseTemplate};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Signing keys and tokens
// ============================================================================

/// Key ID used by [`jwks`] and [`mint_token`]
pub const TEST_KID: &str = "test-key-1";

fn signing_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("generate RSA test key")
    })
}

/// JWKS document publishing the test key under `kid`
pub fn jwks(kid: &str) -> Value {
    let public = signing_key().to_public_key();
    json!({
        "keys": [{
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "kid": kid,
            "n": URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
        }]
    })
}

/// Sign `claims` with the test key as an RS256 JWT
pub fn mint_token(kid: &str, claims: &Value) -> String {
    let pem = signing_key()
        .to_pkcs1_pem(LineEnding::LF)
        .expect("encode RSA test key");
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("load RSA test key");
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_owned());
    encode(&header, claims, &key).expect("sign test token")
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims of a Firebase ID token for `project`
pub fn firebase_claims(project: &str, sub: &str, email: Option<&str>) -> Value {
    let mut claims = json!({
        "iss": format!("https://securetoken.google.com/{project}"),
        "aud": project,
        "sub": sub,
        "iat": now(),
        "exp": now() + 3600,
        "firebase": { "sign_in_provider": "google.com" },
    });
    if let Some(email) = email {
        claims["email"] = json!(email);
        claims["email_verified"] = json!(true);
    }
    claims
}

/// Claims of a Google ID token for `client_id`
pub fn google_id_claims(client_id: &str, sub: &str, email: &str) -> Value {
    json!({
        "iss": "https://accounts.google.com",
        "aud": client_id,
        "azp": client_id,
        "sub": sub,
        "email": email,
        "email_verified": true,
        "iat": now(),
        "exp": now() + 3600,
    })
}

// ============================================================================
// Stub identity provider
// ============================================================================

/// Provider accepting a fixed set of tokens
pub struct StubProvider {
    issuer: Issuer,
    accepted: HashMap<String, ProviderClaims>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(issuer: Issuer) -> Self {
        Self {
            issuer,
            accepted: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Accept `token` as `subject` with `email`
    pub fn accepting(mut self, token: &str, subject: &str, email: Option<&str>) -> Self {
        self.accepted.insert(
            token.to_owned(),
            ProviderClaims {
                subject: subject.to_owned(),
                email: email.map(str::to_owned),
                display_name: None,
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    fn issuer(&self) -> Issuer {
        self.issuer
    }

    async fn verify(&self, token: &BearerToken) -> Result<ProviderClaims, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.accepted
            .get(token.expose())
            .cloned()
            .ok_or_else(|| ProviderError::InvalidToken("not a stub token".to_owned()))
    }
}

/// Verifier with a single stub provider
pub fn stub_verifier(provider: Arc<StubProvider>) -> TokenVerifier {
    TokenVerifier::new().with_provider("stub", provider)
}

// ============================================================================
// Routers
// ============================================================================

/// Gate with default paths around `verifier`
pub fn test_gate(verifier: TokenVerifier) -> AuthGate {
    AuthGate::new(verifier, &GateConfig::default())
}

/// Handler reporting what the request context and identity looked like
async fn context_echo(identity: Option<Extension<VerifiedIdentity>>) -> Json<Value> {
    tokio::task::yield_now().await;
    let token = RequestContext::get().map(|t| t.expose().to_owned());
    tokio::task::yield_now().await;
    let token_after_yield = RequestContext::get().map(|t| t.expose().to_owned());
    Json(json!({
        "token": token,
        "token_after_yield": token_after_yield,
        "email": identity.as_ref().map(|Extension(i)| i.email.clone()),
        "issuer": identity.as_ref().map(|Extension(i)| i.issuer.as_str()),
    }))
}

/// Router echoing the request context on the default RPC path behind the gate
pub fn context_router(verifier: TokenVerifier) -> Router {
    Router::new()
        .route("/a2a/app", post(context_echo).get(context_echo))
        .layer(middleware::from_fn_with_state(
            test_gate(verifier),
            auth_gate_middleware,
        ))
}

/// POST `body` to `uri` with an optional `Authorization` value
pub fn post_request(uri: &str, authorization: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("build request")
}

/// Read a response body as JSON
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

// ============================================================================
// Mock downstream services
// ============================================================================

/// Minimal MCP streamable HTTP server
///
/// `tools/call` echoes the `Authorization` header it received so callers can
/// see which token reached the backend.
pub struct McpBackend {
    pub event_stream: bool,
}

impl McpBackend {
    fn reply(&self, id: &Value, result: Value) -> ResponseTemplate {
        let message = json!({ "jsonrpc": "2.0", "id": id, "result": result });
        if self.event_stream {
            ResponseTemplate::new(200).set_body_raw(
                format!("event: message\ndata: {message}\n\n"),
                "text/event-stream",
            )
        } else {
            ResponseTemplate::new(200).set_body_json(message)
        }
    }
}

impl Respond for McpBackend {
    fn respond(&self, request: &MockRequest) -> ResponseTemplate {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return ResponseTemplate::new(400);
        };
        let id = body.get("id").cloned().unwrap_or(Value::Null);
        let authorization = request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_owned();

        match body["method"].as_str() {
            Some("initialize") => self
                .reply(
                    &id,
                    json!({
                        "protocolVersion": "2025-06-18",
                        "capabilities": { "tools": {} },
                        "serverInfo": { "name": "stash", "version": "1.0.0" }
                    }),
                )
                .insert_header("mcp-session-id", "session-1"),
            Some("notifications/initialized") => ResponseTemplate::new(202),
            Some("tools/list") => self.reply(
                &id,
                json!({
                    "tools": [{
                        "name": "add_item",
                        "description": "Add an item to the stash",
                        "inputSchema": { "type": "object" }
                    }]
                }),
            ),
            Some("tools/call") => self.reply(
                &id,
                json!({
                    "content": [{ "type": "text", "text": authorization }],
                    "isError": false
                }),
            ),
            _ => ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": "Method not found" }
            })),
        }
    }
}

pub async fn mcp_server(event_stream: bool) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(McpBackend { event_stream })
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}
