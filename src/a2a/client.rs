// ABOUTME: A2A JSON-RPC client for the remote delegate agent
// ABOUTME: Fetches the agent card without credentials and sends messages with the caller's token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use gateway_core::constants::a2a::{AGENT_CARD_PATH, METHOD_MESSAGE_SEND};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::AgentCard;
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::outbound::{rpc_result, OutboundError, SkipCredentialForwarding};

const SERVICE: &str = "remote agent";

/// Client for a remote A2A agent
///
/// The card is public discovery metadata and is fetched once without
/// forwarding. Messages go through the forwarding client, so the agent
/// acts for the same user as the inbound request. They are only sent when
/// the card's URL has the same origin as the configured base URL, since the
/// card is unauthenticated and must not redirect the caller's token.
#[derive(Clone)]
pub struct RemoteAgentClient {
    base_url: Url,
    http: ClientWithMiddleware,
    card: Arc<OnceCell<AgentCard>>,
}

impl RemoteAgentClient {
    /// Create a client for the agent served at `base_url`
    #[must_use]
    pub fn new(base_url: Url, http: ClientWithMiddleware) -> Self {
        Self {
            base_url,
            http,
            card: Arc::new(OnceCell::new()),
        }
    }

    /// Base URL the card is resolved against
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Agent card, fetched on first use
    ///
    /// # Errors
    ///
    /// Returns an error if the card cannot be fetched or parsed. A failed
    /// fetch is not cached.
    pub async fn agent_card(&self) -> Result<&AgentCard, OutboundError> {
        self.card.get_or_try_init(|| self.fetch_card()).await
    }

    async fn fetch_card(&self) -> Result<AgentCard, OutboundError> {
        let card_url = format!(
            "{}{AGENT_CARD_PATH}",
            self.base_url.as_str().trim_end_matches('/')
        );
        let response = self
            .http
            .get(&card_url)
            .header(ACCEPT, "application/json")
            .with_extension(SkipCredentialForwarding)
            .send()
            .await
            .map_err(|e| OutboundError::transport(SERVICE, &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(OutboundError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }
        let card: AgentCard = response
            .json()
            .await
            .map_err(|e| OutboundError::invalid(SERVICE, format!("bad agent card: {e}")))?;
        info!(agent = %card.name, url = %card.url, "Resolved remote agent card");
        Ok(card)
    }

    /// Send a user text message and return the agent's result (a task or message)
    ///
    /// # Errors
    ///
    /// Returns an error if the card is unavailable or points at another
    /// origin, or if the agent is unreachable or answers with a failure
    /// status or JSON-RPC error.
    pub async fn send_message(&self, text: &str) -> Result<Value, OutboundError> {
        let endpoint = self.message_endpoint(self.agent_card().await?)?;
        let request = JsonRpcRequest::new(
            METHOD_MESSAGE_SEND,
            Some(json!({
                "message": {
                    "role": "user",
                    "parts": [{ "kind": "text", "text": text }],
                    "messageId": Uuid::new_v4().to_string(),
                    "kind": "message",
                }
            })),
        );
        let body = serde_json::to_vec(&request)
            .map_err(|e| OutboundError::invalid(SERVICE, e.to_string()))?;

        let response = self
            .http
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| OutboundError::transport(SERVICE, &e))?;
        let status = response.status();
        if !status.is_success() {
            debug!(%status, "Remote agent rejected message");
            return Err(OutboundError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }
        let message: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| OutboundError::invalid(SERVICE, e.to_string()))?;
        rpc_result(SERVICE, message)
    }

    fn message_endpoint(&self, card: &AgentCard) -> Result<Url, OutboundError> {
        let endpoint = self
            .base_url
            .join(&card.url)
            .map_err(|e| OutboundError::invalid(SERVICE, format!("bad agent card url: {e}")))?;
        if endpoint.origin() != self.base_url.origin() {
            warn!(
                agent = %card.name,
                card_url = %endpoint,
                base_url = %self.base_url,
                "Agent card points at another origin, not sending credentials"
            );
            return Err(OutboundError::invalid(
                SERVICE,
                "agent card url is outside the configured origin",
            ));
        }
        Ok(endpoint)
    }
}
