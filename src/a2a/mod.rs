// ABOUTME: Agent-to-agent (A2A) client side used to delegate to the remote agent
// ABOUTME: Agent card model and the JSON-RPC client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # A2A (Agent-to-Agent) Client
//!
//! The gateway only consumes A2A: it reads a remote agent's card and sends
//! it `message/send` requests carrying the caller's credentials.

/// Agent card model
pub mod agent_card;
/// JSON-RPC client for the remote agent
pub mod client;

pub use agent_card::{AgentCard, AgentSkill};
pub use client::RemoteAgentClient;
