// ABOUTME: Main library entry point for the FormAI gym equipment analysis API
// ABOUTME: Exposes the analysis pipeline, HTTP routes, and server assembly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

// Crate-level attributes:
// - deny(unsafe_code): Zero-tolerance unsafe policy.
#![deny(unsafe_code)]

//! # `FormAI` Server
//!
//! An HTTP service that takes a photo of a gym machine or exercise, asks a
//! vision model to identify it, and returns structured coaching content.
//!
//! ## Architecture
//!
//! - **Rate limiting**: fixed-window per-client budget with background eviction
//! - **Analysis**: input normalization, model invocation with a bounded retry,
//!   output coercion, and exercise name canonicalization
//! - **LLM**: provider abstraction with an `OpenAI` vision implementation
//! - **Routes**: `POST /analyze`, `GET /analyze`, `/health`, `/ready`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use formai_server::config::environment::ServerConfig;
//! use formai_server::resources::ServerResources;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let resources = Arc::new(ServerResources::from_config(config)?);
//!     formai_server::server::run(resources).await
//! }
//! ```

/// Analysis pipeline: request normalization, coercion, canonicalization, orchestration
pub mod analysis;

/// Environment-driven configuration
pub mod config;

/// LLM provider abstraction and prompts
pub mod llm;

/// Structured logging setup
pub mod logging;

/// HTTP middleware (CORS, rate limit headers)
pub mod middleware;

/// Per-client analyze rate limiting
pub mod rate_limiting;

/// Shared state handed to route handlers
pub mod resources;

/// HTTP route definitions
pub mod routes;

/// Router assembly and serving
pub mod server;

/// Error types, constants, and wire models from the core crate
pub use formai_core::{constants, errors, models};
