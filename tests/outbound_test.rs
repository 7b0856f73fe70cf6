// ABOUTME: Integration tests for credential forwarding through the MCP and A2A clients
// ABOUTME: Mock downstream services record headers so forwarded tokens can be checked per request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::error::Error;

use assistant_gateway::a2a::RemoteAgentClient;
use assistant_gateway::auth::BearerToken;
use assistant_gateway::context::RequestContext;
use assistant_gateway::mcp::ToolBackendClient;
use assistant_gateway::outbound::{forwarding_client, OutboundError};
use common::mcp_server;
use http::Method;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn tool_client(server: &MockServer) -> Result<ToolBackendClient, Box<dyn Error>> {
    let endpoint = Url::parse(&format!("{}/mcp", server.uri()))?;
    Ok(ToolBackendClient::new(
        endpoint,
        forwarding_client(Client::new()),
    ))
}

fn authorization_of(request: &Request) -> Option<String> {
    request
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

#[tokio::test]
async fn test_every_mcp_request_carries_the_context_token() -> Result<(), Box<dyn Error>> {
    common::init_test_logging();
    let server = mcp_server(false).await;
    let client = tool_client(&server)?;

    let tools =
        RequestContext::scope(BearerToken::new("ya29.user-a")?, client.list_tools()).await?;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "add_item");

    let requests = server.received_requests().await.unwrap_or_default();
    // initialize, initialized notification, tools/list, session close
    assert_eq!(requests.len(), 4);
    for request in &requests {
        assert_eq!(
            authorization_of(request).as_deref(),
            Some("Bearer ya29.user-a"),
            "{} {}",
            request.method,
            request.url
        );
    }

    let list_request = &requests[2];
    assert_eq!(
        list_request
            .headers
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok()),
        Some("session-1")
    );
    assert_eq!(requests[3].method, Method::DELETE);
    Ok(())
}

#[tokio::test]
async fn test_no_authorization_outside_request_context() -> Result<(), Box<dyn Error>> {
    let server = mcp_server(false).await;
    let client = tool_client(&server)?;

    let result = client.call_tool("add_item", json!({ "name": "milk" })).await?;

    assert_eq!(result["content"][0]["text"], json!(""));
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.iter().all(|r| authorization_of(r).is_none()));
    Ok(())
}

#[tokio::test]
async fn test_event_stream_responses_are_read() -> Result<(), Box<dyn Error>> {
    let server = mcp_server(true).await;
    let client = tool_client(&server)?;

    let result = RequestContext::scope(
        BearerToken::new("ya29.user-b")?,
        client.call_tool("add_item", json!({ "name": "eggs" })),
    )
    .await?;

    assert_eq!(result["content"][0]["text"], json!("Bearer ya29.user-b"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_client_forwards_each_callers_token() -> Result<(), Box<dyn Error>> {
    let server = mcp_server(false).await;
    let client = tool_client(&server)?;

    let mut handles = Vec::new();
    for i in 0..8 {
        let client = client.clone();
        let token = format!("ya29.user-{i}");
        handles.push(tokio::spawn(RequestContext::scope(
            BearerToken::new(token.clone()).expect("token"),
            async move {
                let result = client.call_tool("add_item", json!({})).await;
                (token, result)
            },
        )));
    }

    for handle in handles {
        let (token, result) = handle.await?;
        let result = result?;
        assert_eq!(
            result["content"][0]["text"],
            json!(format!("Bearer {token}"))
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_backend_http_error_is_reported() -> Result<(), Box<dyn Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let client = tool_client(&server)?;

    let error = client.list_tools().await.err();

    assert!(matches!(
        error,
        Some(OutboundError::Status {
            service: "tool backend",
            status: 401
        })
    ));
    Ok(())
}

#[tokio::test]
async fn test_failed_handshake_closes_the_session() -> Result<(), Box<dyn Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(|request: &Request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
            if body["method"] == json!("initialize") {
                ResponseTemplate::new(200)
                    .insert_header("mcp-session-id", "session-1")
                    .set_body_json(json!({
                        "jsonrpc": "2.0",
                        "id": body["id"],
                        "result": { "protocolVersion": "2025-06-18", "capabilities": {} }
                    }))
            } else {
                ResponseTemplate::new(500)
            }
        })
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let client = tool_client(&server)?;

    let error =
        RequestContext::scope(BearerToken::new("ya29.user-a")?, client.list_tools()).await.err();
    assert!(matches!(
        error,
        Some(OutboundError::Status {
            service: "tool backend",
            status: 500
        })
    ));

    let requests = server.received_requests().await.unwrap_or_default();
    // initialize, failed initialized notification, session close
    assert_eq!(requests.len(), 3);
    let close = &requests[2];
    assert_eq!(close.method, Method::DELETE);
    assert_eq!(
        close
            .headers
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok()),
        Some("session-1")
    );
    assert_eq!(authorization_of(close).as_deref(), Some("Bearer ya29.user-a"));
    Ok(())
}

#[tokio::test]
async fn test_initialize_rpc_error_closes_the_session() -> Result<(), Box<dyn Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(|request: &Request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
            ResponseTemplate::new(200)
                .insert_header("mcp-session-id", "session-2")
                .set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": body["id"],
                    "error": { "code": -32602, "message": "Unsupported protocol version" }
                }))
        })
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let client = tool_client(&server)?;

    let error = client.call_tool("add_item", json!({})).await.err();

    assert!(matches!(
        error,
        Some(OutboundError::Rpc { code: -32602, .. })
    ));
    Ok(())
}

async fn agent_server(card_fetches: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/agent-card.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "todo_agent",
            "description": "Keeps a todo list",
            "url": format!("{}/a2a/app", server.uri()),
            "version": "1.0.0",
            "protocolVersion": "0.3.0",
            "skills": []
        })))
        .expect(card_fetches)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/a2a/app"))
        .respond_with(|request: &Request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": body["id"],
                "result": {
                    "kind": "message",
                    "role": "agent",
                    "messageId": "reply-1",
                    "parts": [{ "kind": "text", "text": format!("ok: {}", body["params"]["message"]["parts"][0]["text"].as_str().unwrap_or("")) }]
                }
            }))
        })
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_agent_card_is_fetched_without_credentials() -> Result<(), Box<dyn Error>> {
    let server = agent_server(1).await;
    let client = RemoteAgentClient::new(Url::parse(&server.uri())?, forwarding_client(Client::new()));

    let first = RequestContext::scope(BearerToken::new("ya29.user-a")?, async {
        client.send_message("add milk").await
    })
    .await?;
    let second = RequestContext::scope(BearerToken::new("ya29.user-a")?, async {
        client.send_message("add eggs").await
    })
    .await?;

    assert_eq!(first["parts"][0]["text"], json!("ok: add milk"));
    assert_eq!(second["parts"][0]["text"], json!("ok: add eggs"));

    let requests = server.received_requests().await.unwrap_or_default();
    let card_requests: Vec<&Request> = requests
        .iter()
        .filter(|r| r.url.path() == "/.well-known/agent-card.json")
        .collect();
    let message_requests: Vec<&Request> =
        requests.iter().filter(|r| r.url.path() == "/a2a/app").collect();

    assert_eq!(card_requests.len(), 1);
    assert!(authorization_of(card_requests[0]).is_none());
    assert_eq!(message_requests.len(), 2);
    for request in message_requests {
        assert_eq!(
            authorization_of(request).as_deref(),
            Some("Bearer ya29.user-a")
        );
        let body: Value = serde_json::from_slice(&request.body)?;
        assert_eq!(body["method"], json!("message/send"));
        assert_eq!(body["params"]["message"]["role"], json!("user"));
    }
    Ok(())
}

#[tokio::test]
async fn test_agent_card_failure_is_not_cached() -> Result<(), Box<dyn Error>> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/agent-card.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    let client = RemoteAgentClient::new(Url::parse(&server.uri())?, forwarding_client(Client::new()));

    assert!(client.agent_card().await.is_err());
    assert!(client.agent_card().await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_agent_card_on_another_origin_gets_no_token() -> Result<(), Box<dyn Error>> {
    let collector = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&collector)
        .await;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/agent-card.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "todo_agent",
            "url": format!("{}/a2a/app", collector.uri()),
            "skills": []
        })))
        .mount(&server)
        .await;
    let client = RemoteAgentClient::new(Url::parse(&server.uri())?, forwarding_client(Client::new()));

    let result = RequestContext::scope(BearerToken::new("ya29.user-a")?, async {
        client.send_message("add milk").await
    })
    .await;

    assert!(matches!(result, Err(OutboundError::InvalidResponse { .. })));
    let leaked = collector.received_requests().await.unwrap_or_default();
    assert!(leaked.is_empty());
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.iter().all(|r| authorization_of(r).is_none()));
    Ok(())
}
