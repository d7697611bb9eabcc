// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Defaults for rate limits, model timeouts, service names, and environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single large file.

/// Service identification for structured logging
pub mod service_names {
    /// Service name used in log output and startup banners
    pub const FORMAI_SERVER: &str = "formai-server";
}

/// Request budget limits for the analyze endpoint
pub mod limits {
    /// Maximum analyze requests per client within one window
    pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 20;

    /// Fixed window duration in seconds (10 minutes)
    pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 600;

    /// Interval between stale rate-limit entry sweeps
    pub const DEFAULT_RATE_LIMIT_SWEEP_SECS: u64 = 60;

    /// Map size above which `check` also sweeps stale entries inline
    pub const RATE_LIMIT_CLEANUP_THRESHOLD: usize = 10_000;

    /// Maximum accepted request body (multipart photo uploads)
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
}

/// Timeouts for outbound model calls
pub mod timeouts {
    /// Per-attempt deadline for a vision model call
    pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 25;

    /// TCP connect timeout for the model HTTP client
    pub const MODEL_CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Default values used when the environment does not override them
pub mod defaults {
    /// Default HTTP listen port
    pub const HTTP_PORT: u16 = 4001;

    /// Default bind address
    pub const HOST: &str = "127.0.0.1";

    /// Default vision model
    pub const OPENAI_MODEL: &str = "gpt-4o";

    /// Default `OpenAI` API base URL
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

    /// Sampling temperature for analysis calls
    pub const MODEL_TEMPERATURE: f32 = 0.2;

    /// Rate limit identity used when no forwarded address is present
    pub const ANONYMOUS_CLIENT_KEY: &str = "anon";

    /// Origins allowed by CORS when `CORS_ALLOWED_ORIGINS` is unset
    pub const CORS_ALLOWED_ORIGINS: &str =
        "http://localhost:3000,http://127.0.0.1:3000,http://localhost:5173";

    /// MIME type assumed for uploaded images without a content type
    pub const IMAGE_MIME_TYPE: &str = "image/jpeg";
}

/// Environment variable names read at startup
pub mod env_vars {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Fallback HTTP listen port (platform convention)
    pub const PORT: &str = "PORT";
    /// Bind address
    pub const HOST: &str = "HOST";
    /// Deployment environment name
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    /// Vision model API key
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    /// Vision model name
    pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
    /// Vision model API base URL
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
    /// Per-attempt model timeout in seconds
    pub const ANALYZE_TIMEOUT_SECS: &str = "ANALYZE_TIMEOUT_SECS";
    /// Requests allowed per window
    pub const ANALYZE_RATE_LIMIT_REQUESTS: &str = "ANALYZE_RATE_LIMIT_REQUESTS";
    /// Window length in seconds
    pub const ANALYZE_RATE_LIMIT_WINDOW_SECS: &str = "ANALYZE_RATE_LIMIT_WINDOW_SECS";
    /// Stale entry sweep interval in seconds
    pub const ANALYZE_RATE_LIMIT_SWEEP_SECS: &str = "ANALYZE_RATE_LIMIT_SWEEP_SECS";
    /// Request body limit in bytes
    pub const ANALYZE_MAX_UPLOAD_BYTES: &str = "ANALYZE_MAX_UPLOAD_BYTES";
    /// Comma-separated CORS origin allow-list
    pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
}
