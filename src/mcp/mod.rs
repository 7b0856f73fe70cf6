// ABOUTME: Model Context Protocol client side used to reach the tool backend
// ABOUTME: Tool descriptors plus the streamable HTTP client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Streamable HTTP client
pub mod client;

pub use client::ToolBackendClient;

/// A tool advertised by an MCP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    /// Tool name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the arguments
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

/// Result of `tools/list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolList {
    /// Available tools
    #[serde(default)]
    pub tools: Vec<McpTool>,
}
