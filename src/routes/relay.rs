// ABOUTME: JSON-RPC relay on the protected RPC path
// ABOUTME: Dispatches tool and message methods to the tool backend and remote agent as the caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! JSON-RPC relay
//!
//! Runs behind the auth gate, so every handler here executes inside a
//! request context scope and outbound calls carry the caller's token.
//! Downstream failures are reported as JSON-RPC errors with HTTP 200; a
//! downstream 401 never becomes a 401 of this endpoint.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use gateway_core::constants::{a2a::METHOD_MESSAGE_SEND, jsonrpc as codes};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::AppState;
use crate::auth::VerifiedIdentity;
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::outbound::OutboundError;

/// Relay routes implementation
pub struct RelayRoutes;

impl RelayRoutes {
    /// `POST` handler for the relay endpoint at `rpc_path`
    pub fn routes(rpc_path: &str) -> Router<AppState> {
        Router::new().route(rpc_path, post(Self::handle_rpc))
    }

    async fn handle_rpc(
        State(state): State<AppState>,
        identity: Option<Extension<VerifiedIdentity>>,
        body: Bytes,
    ) -> Response {
        let request = match parse_request(&body) {
            Ok(request) => request,
            Err(response) => return Json(response).into_response(),
        };
        let Some(id) = request.id.clone() else {
            info!(method = %request.method, "Ignoring JSON-RPC notification");
            return StatusCode::ACCEPTED.into_response();
        };

        info!(
            method = %request.method,
            email = identity.as_ref().map_or("", |Extension(i)| i.email.as_str()),
            "Relaying JSON-RPC request"
        );
        let response = match dispatch(&state, &request).await {
            Ok(result) => JsonRpcResponse::success(Some(id), result),
            Err(RelayError::MethodNotFound) => JsonRpcResponse::error(
                Some(id),
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
            Err(RelayError::InvalidParams(message)) => {
                JsonRpcResponse::error(Some(id), codes::INVALID_PARAMS, message)
            }
            Err(RelayError::Downstream(e)) => {
                warn!(method = %request.method, error = %e, "Downstream call failed");
                JsonRpcResponse::error(Some(id), codes::DOWNSTREAM_ERROR, e.to_string())
            }
        };
        Json(response).into_response()
    }
}

enum RelayError {
    MethodNotFound,
    InvalidParams(String),
    Downstream(OutboundError),
}

impl From<OutboundError> for RelayError {
    fn from(e: OutboundError) -> Self {
        Self::Downstream(e)
    }
}

/// Parse a relay request
///
/// Only a request without an `id` member is a notification. An explicit
/// `"id": null` is kept as `Some(Value::Null)` and gets a response.
fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| JsonRpcResponse::error(None, codes::PARSE_ERROR, format!("Parse error: {e}")))?;
    let id = value.get("id").cloned();
    let mut request: JsonRpcRequest = serde_json::from_value(value).map_err(|e| {
        JsonRpcResponse::error(
            id.clone(),
            codes::INVALID_REQUEST,
            format!("Invalid request: {e}"),
        )
    })?;
    if request.id.is_none() {
        request.id = id;
    }
    Ok(request)
}

async fn dispatch(state: &AppState, request: &JsonRpcRequest) -> Result<Value, RelayError> {
    match request.method.as_str() {
        "tools/list" => {
            let backend = state
                .tool_backend
                .as_ref()
                .ok_or(OutboundError::NotConfigured("tool backend"))?;
            let tools = backend.list_tools().await?;
            Ok(json!({ "tools": tools }))
        }
        "tools/call" => {
            let backend = state
                .tool_backend
                .as_ref()
                .ok_or(OutboundError::NotConfigured("tool backend"))?;
            let params = request.params.as_ref();
            let name = params
                .and_then(|p| p.get("name"))
                .and_then(Value::as_str)
                .ok_or_else(|| RelayError::InvalidParams("tools/call requires a tool name".into()))?;
            let arguments = params
                .and_then(|p| p.get("arguments"))
                .cloned()
                .unwrap_or_else(|| json!({}));
            Ok(backend.call_tool(name, arguments).await?)
        }
        METHOD_MESSAGE_SEND => {
            let agent = state
                .remote_agent
                .as_ref()
                .ok_or(OutboundError::NotConfigured("remote agent"))?;
            let text = message_text(request.params.as_ref())
                .ok_or_else(|| RelayError::InvalidParams("message/send requires text".into()))?;
            Ok(agent.send_message(&text).await?)
        }
        _ => Err(RelayError::MethodNotFound),
    }
}

/// Text of a `message/send` request
///
/// Accepts `{"text": "..."}` or an A2A message whose text parts are joined.
fn message_text(params: Option<&Value>) -> Option<String> {
    let params = params?;
    if let Some(text) = params.get("text").and_then(Value::as_str) {
        return Some(text.to_owned());
    }
    let parts = params.get("message")?.get("parts")?.as_array()?;
    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}
