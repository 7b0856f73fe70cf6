// ABOUTME: Core types and constants for the assistant gateway
// ABOUTME: Foundation crate with error handling and constants shared by the gateway
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Gateway Core
//!
//! Foundation crate providing shared types and constants for the assistant
//! gateway. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Application-wide constants organized by domain

/// Unified error type with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;
