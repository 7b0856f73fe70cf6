// ABOUTME: End-to-end tests of the assembled gateway router against mocked Google and MCP services
// ABOUTME: Exercises rejection scenarios, relay dispatch, forwarding and the discovery documents
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::error::Error;

use assistant_gateway::config::{ProviderKind, ServerConfig};
use assistant_gateway::server::GatewayServer;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{body_json, firebase_claims, jwks, mcp_server, mint_token, post_request, TEST_KID};
use serde_json::{json, Value};
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "assistant-test";
const OPAQUE: &str = "ya29.valid-opaque-token";

fn gateway_config(server: &MockServer) -> Result<ServerConfig, Box<dyn Error>> {
    let mut config = ServerConfig::default();
    config.app_url = "https://assistant.example.com".to_owned();
    config.auth.provider_order = vec![ProviderKind::Firebase, ProviderKind::GoogleAccessToken];
    config.auth.firebase.project_id = Some(PROJECT.to_owned());
    config.auth.firebase.enabled = true;
    config.auth.firebase.certs_url = format!("{}/firebase-certs", server.uri());
    config.auth.google.tokeninfo_url = format!("{}/tokeninfo", server.uri());
    config.downstream.tool_backend_url = Some(Url::parse(&format!("{}/mcp", server.uri()))?);
    Ok(config)
}

async fn mount_identity_endpoints(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/tokeninfo"))
        .and(query_param("access_token", OPAQUE))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "email": "a@example.com", "sub": "123" })),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/firebase-certs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks(TEST_KID)))
        .mount(server)
        .await;
}

async fn gateway() -> Result<(MockServer, Router), Box<dyn Error>> {
    common::init_test_logging();
    let server = mcp_server(false).await;
    mount_identity_endpoints(&server).await;
    let router = GatewayServer::new(gateway_config(&server)?)?.router();
    Ok((server, router))
}

fn rpc(method: &str, params: &Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params })
}

#[tokio::test]
async fn test_missing_header_on_rpc_path() -> Result<(), Box<dyn Error>> {
    let (_server, app) = gateway().await?;

    let response = app
        .oneshot(post_request("/a2a/app", None, &rpc("tools/list", &json!({}))))
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Missing Authorization header" })
    );
    Ok(())
}

#[tokio::test]
async fn test_basic_scheme_on_rpc_path() -> Result<(), Box<dyn Error>> {
    let (_server, app) = gateway().await?;

    let response = app
        .oneshot(post_request(
            "/a2a/app",
            Some("Basic abc:def"),
            &rpc("tools/list", &json!({})),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("Invalid Authorization header format"));
    Ok(())
}

#[tokio::test]
async fn test_opaque_token_is_forwarded_to_tool_backend() -> Result<(), Box<dyn Error>> {
    let (server, app) = gateway().await?;
    let authorization = format!("Bearer {OPAQUE}");

    let response = app
        .oneshot(post_request(
            "/a2a/app",
            Some(authorization.as_str()),
            &rpc("tools/call", &json!({ "name": "add_item", "arguments": { "name": "milk" } })),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["result"]["content"][0]["text"], json!(authorization));

    let requests = server.received_requests().await.unwrap_or_default();
    let (identity_calls, backend_calls): (Vec<_>, Vec<_>) = requests
        .iter()
        .partition(|r| r.url.path() == "/tokeninfo" || r.url.path() == "/firebase-certs");
    assert!(!backend_calls.is_empty());
    for request in backend_calls {
        assert_eq!(
            request
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok()),
            Some(authorization.as_str())
        );
    }
    for request in identity_calls {
        assert!(request.headers.get("authorization").is_none());
    }
    Ok(())
}

#[tokio::test]
async fn test_get_on_rpc_path_is_not_an_auth_rejection() -> Result<(), Box<dyn Error>> {
    let (_server, app) = gateway().await?;

    let response = app
        .oneshot(Request::builder().uri("/a2a/app").body(Body::empty())?)
        .await?;

    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_signed_token_without_email_is_rejected() -> Result<(), Box<dyn Error>> {
    let (_server, app) = gateway().await?;
    let token = mint_token(TEST_KID, &firebase_claims(PROJECT, "uid-7", None));

    let response = app
        .oneshot(post_request(
            "/a2a/app",
            Some(format!("Bearer {token}").as_str()),
            &rpc("tools/list", &json!({})),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Invalid token payload: missing email claim" })
    );
    Ok(())
}

#[tokio::test]
async fn test_firebase_user_lists_tools() -> Result<(), Box<dyn Error>> {
    let (_server, app) = gateway().await?;
    let token = mint_token(
        TEST_KID,
        &firebase_claims(PROJECT, "uid-7", Some("f@example.com")),
    );

    let response = app
        .oneshot(post_request(
            "/a2a/app",
            Some(format!("Bearer {token}").as_str()),
            &rpc("tools/list", &json!({})),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"]["tools"][0]["name"], json!("add_item"));
    Ok(())
}

#[tokio::test]
async fn test_relay_errors_are_json_rpc_errors() -> Result<(), Box<dyn Error>> {
    let (_server, app) = gateway().await?;
    let authorization = format!("Bearer {OPAQUE}");

    let unknown = app
        .clone()
        .oneshot(post_request(
            "/a2a/app",
            Some(authorization.as_str()),
            &rpc("tasks/get", &json!({})),
        ))
        .await?;
    assert_eq!(unknown.status(), StatusCode::OK);
    assert_eq!(body_json(unknown).await["error"]["code"], json!(-32601));

    let no_agent = app
        .clone()
        .oneshot(post_request(
            "/a2a/app",
            Some(authorization.as_str()),
            &rpc("message/send", &json!({ "text": "add milk" })),
        ))
        .await?;
    assert_eq!(no_agent.status(), StatusCode::OK);
    let body = body_json(no_agent).await;
    assert_eq!(body["error"]["code"], json!(-32000));
    assert_eq!(body["error"]["message"], json!("remote agent is not configured"));

    let missing_name = app
        .oneshot(post_request(
            "/a2a/app",
            Some(authorization.as_str()),
            &rpc("tools/call", &json!({ "arguments": {} })),
        ))
        .await?;
    assert_eq!(body_json(missing_name).await["error"]["code"], json!(-32602));
    Ok(())
}

#[tokio::test]
async fn test_null_id_gets_a_response() -> Result<(), Box<dyn Error>> {
    let (_server, app) = gateway().await?;
    let authorization = format!("Bearer {OPAQUE}");

    let response = app
        .clone()
        .oneshot(post_request(
            "/a2a/app",
            Some(authorization.as_str()),
            &json!({ "jsonrpc": "2.0", "id": null, "method": "tasks/get", "params": {} }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!(-32601));
    assert!(body.as_object().is_some_and(|o| o.contains_key("id")));
    assert_eq!(body["id"], Value::Null);

    let notification = app
        .oneshot(post_request(
            "/a2a/app",
            Some(authorization.as_str()),
            &json!({ "jsonrpc": "2.0", "method": "tasks/get", "params": {} }),
        ))
        .await?;
    assert_eq!(notification.status(), StatusCode::ACCEPTED);
    Ok(())
}

#[tokio::test]
async fn test_unparseable_body_is_a_parse_error() -> Result<(), Box<dyn Error>> {
    let (_server, app) = gateway().await?;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/a2a/app")
                .header("authorization", format!("Bearer {OPAQUE}"))
                .header("content-type", "application/json")
                .body(Body::from("{\"jsonrpc\": "))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["error"]["code"], json!(-32700));
    Ok(())
}

#[tokio::test]
async fn test_downstream_unauthorized_is_not_a_gateway_401() -> Result<(), Box<dyn Error>> {
    common::init_test_logging();
    let server = MockServer::start().await;
    mount_identity_endpoints(&server).await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let app = GatewayServer::new(gateway_config(&server)?)?.router();

    let response = app
        .oneshot(post_request(
            "/a2a/app",
            Some(format!("Bearer {OPAQUE}").as_str()),
            &rpc("tools/list", &json!({})),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!(-32000));
    assert_eq!(body["error"]["message"], json!("tool backend returned HTTP 401"));
    Ok(())
}

#[tokio::test]
async fn test_protected_resource_metadata() -> Result<(), Box<dyn Error>> {
    let (_server, app) = gateway().await?;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/.well-known/oauth-protected-resource")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "resource": "https://assistant.example.com",
            "authorization_servers": ["https://accounts.google.com"],
            "bearer_methods_supported": ["header"]
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_health_is_public() -> Result<(), Box<dyn Error>> {
    let (_server, app) = gateway().await?;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], json!("healthy"));
    Ok(())
}
