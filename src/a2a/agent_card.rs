// ABOUTME: A2A agent card as published by a remote agent for discovery
// ABOUTME: Read-only view of the fields the gateway needs to reach the agent
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Agent card served at `/.well-known/agent-card.json`
///
/// Only the fields used for routing and logging are modelled; anything
/// else in the document is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Agent name
    pub name: String,
    /// What the agent does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON-RPC endpoint of the agent
    pub url: String,
    /// Agent release version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// A2A protocol version the agent speaks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    /// Transport the agent prefers, e.g. `JSONRPC`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_transport: Option<String>,
    /// Advertised skills
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

/// A skill advertised on an agent card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSkill {
    /// Skill identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// What the skill does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
