// ABOUTME: HTTP middleware for the analyze server
// ABOUTME: CORS configuration and rate limit response headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// CORS layer configuration
pub mod cors;
/// Rate limit response headers
pub mod rate_limiting;

pub use cors::setup_cors;
pub use rate_limiting::{create_rate_limit_headers, headers};
