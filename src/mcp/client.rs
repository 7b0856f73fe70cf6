// ABOUTME: MCP streamable HTTP client for the tool backend
// ABOUTME: Opens one session per operation so each call runs under the caller's identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use gateway_core::constants::mcp::{
    ACCEPT as MCP_ACCEPT, PROTOCOL_VERSION, PROTOCOL_VERSION_HEADER, SESSION_HEADER,
};
use gateway_core::constants::service_names::ASSISTANT_GATEWAY;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Response;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::{McpTool, ToolList};
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::outbound::{rpc_result, OutboundError};

const SERVICE: &str = "tool backend";

/// Client for an MCP tool backend
///
/// Every request goes through the forwarding client, so the backend sees
/// the inbound caller's bearer token on `initialize` as well as on the
/// actual call. MCP sessions are bound to that identity, which is why each
/// operation opens and closes its own session.
#[derive(Clone)]
pub struct ToolBackendClient {
    endpoint: Url,
    http: ClientWithMiddleware,
}

impl ToolBackendClient {
    /// Create a client for the MCP endpoint at `endpoint`
    #[must_use]
    pub const fn new(endpoint: Url, http: ClientWithMiddleware) -> Self {
        Self { endpoint, http }
    }

    /// MCP endpoint URL
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// List the tools the backend offers
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable, answers with a
    /// failure status or JSON-RPC error, or sends an unreadable body.
    pub async fn list_tools(&self) -> Result<Vec<McpTool>, OutboundError> {
        let result = self.with_session("tools/list", None).await?;
        let list: ToolList = serde_json::from_value(result)
            .map_err(|e| OutboundError::invalid(SERVICE, format!("bad tools/list result: {e}")))?;
        Ok(list.tools)
    }

    /// Call a tool and return the raw MCP `CallToolResult`
    ///
    /// # Errors
    ///
    /// Same as [`ToolBackendClient::list_tools`].
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, OutboundError> {
        self.with_session(
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        )
        .await
    }

    async fn with_session(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, OutboundError> {
        let session = self.initialize().await?;
        let request = JsonRpcRequest::new(method, params);
        let result = match self.post(session.as_deref(), &request).await {
            Ok(response) => read_result(response, &request).await,
            Err(e) => Err(e),
        };
        if let Some(session) = &session {
            self.close_session(session).await;
        }
        result
    }

    async fn initialize(&self) -> Result<Option<String>, OutboundError> {
        let request = JsonRpcRequest::new(
            "initialize",
            Some(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": ASSISTANT_GATEWAY,
                    "version": env!("CARGO_PKG_VERSION"),
                },
            })),
        );
        let response = self.post(None, &request).await?;
        let session = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if let Err(e) = self.finish_handshake(response, &request, session.as_deref()).await {
            // The backend may have allocated the session before failing
            if let Some(session) = &session {
                self.close_session(session).await;
            }
            return Err(e);
        }
        Ok(session)
    }

    async fn finish_handshake(
        &self,
        response: Response,
        request: &JsonRpcRequest,
        session: Option<&str>,
    ) -> Result<(), OutboundError> {
        read_result(response, request).await?;
        debug!(session = session.is_some(), "MCP session initialized");

        let initialized = JsonRpcRequest::notification("notifications/initialized", None);
        self.post(session, &initialized).await?;
        Ok(())
    }

    async fn post(
        &self,
        session: Option<&str>,
        message: &JsonRpcRequest,
    ) -> Result<Response, OutboundError> {
        let body = serde_json::to_vec(message)
            .map_err(|e| OutboundError::invalid(SERVICE, e.to_string()))?;
        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, MCP_ACCEPT)
            .body(body);
        if let Some(session) = session {
            builder = builder
                .header(SESSION_HEADER, session)
                .header(PROTOCOL_VERSION_HEADER, PROTOCOL_VERSION);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| OutboundError::transport(SERVICE, &e))?;
        let status = response.status();
        if !status.is_success() {
            debug!(method = %message.method, %status, "Tool backend rejected request");
            return Err(OutboundError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn close_session(&self, session: &str) {
        let result = self
            .http
            .delete(self.endpoint.clone())
            .header(SESSION_HEADER, session)
            .send()
            .await;
        if let Err(e) = result {
            debug!(error = %e, "Failed to close MCP session");
        }
    }
}

/// Read a JSON-RPC response from a JSON or `text/event-stream` body
async fn read_result(response: Response, request: &JsonRpcRequest) -> Result<Value, OutboundError> {
    let is_event_stream = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/event-stream"));
    let body = response
        .text()
        .await
        .map_err(|e| OutboundError::transport(SERVICE, &e))?;

    let message = if is_event_stream {
        find_sse_response(&body, request.id.as_ref())?
    } else {
        serde_json::from_str(&body).map_err(|e| OutboundError::invalid(SERVICE, e.to_string()))?
    };
    rpc_result(SERVICE, message)
}

/// Find the response to `id` among the events of an SSE body
fn find_sse_response(body: &str, id: Option<&Value>) -> Result<JsonRpcResponse, OutboundError> {
    let normalized = body.replace("\r\n", "\n");
    for event in normalized.split("\n\n") {
        let data: Vec<&str> = event
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim_start)
            .collect();
        if data.is_empty() {
            continue;
        }
        let Ok(message) = serde_json::from_str::<JsonRpcResponse>(&data.join("\n")) else {
            continue;
        };
        if message.id.as_ref() == id && (message.result.is_some() || message.error.is_some()) {
            return Ok(message);
        }
    }
    Err(OutboundError::invalid(
        SERVICE,
        "event stream ended without a response",
    ))
}
