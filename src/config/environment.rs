// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses listen address, vision model credentials, rate limits, and CORS from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{defaults, env_vars, limits, timeouts};

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Vision model provider configuration
#[derive(Debug, Clone)]
pub struct VisionModelConfig {
    /// API key; `None` when unset or empty
    pub api_key: Option<String>,
    /// Model name sent with every request
    pub model: String,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Deadline applied to each model attempt
    pub timeout: Duration,
}

impl VisionModelConfig {
    /// Whether a credential is configured
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for VisionModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: defaults::OPENAI_MODEL.to_owned(),
            base_url: defaults::OPENAI_BASE_URL.to_owned(),
            timeout: Duration::from_secs(timeouts::DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }
}

/// Fixed-window rate limit configuration for the analyze endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per client per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// Age after which an entry's window start makes it evictable
    pub stale_entry_timeout: Duration,
    /// Interval of the background sweeper
    pub sweep_interval: Duration,
    /// Map size above which `check` sweeps inline
    pub cleanup_threshold: usize,
}

impl RateLimitConfig {
    /// Window length in whole seconds
    #[must_use]
    pub const fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let window = Duration::from_secs(limits::DEFAULT_RATE_LIMIT_WINDOW_SECS);
        Self {
            max_requests: limits::DEFAULT_RATE_LIMIT_REQUESTS,
            window,
            stale_entry_timeout: window,
            sweep_interval: Duration::from_secs(limits::DEFAULT_RATE_LIMIT_SWEEP_SECS),
            cleanup_threshold: limits::RATE_LIMIT_CLEANUP_THRESHOLD,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// Comma-separated allow-list, or `*`
    pub allowed_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: defaults::CORS_ALLOWED_ORIGINS.to_owned(),
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP listen port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Vision model settings
    pub vision: VisionModelConfig,
    /// Analyze rate limit settings
    pub rate_limit: RateLimitConfig,
    /// CORS settings
    pub cors: CorsConfig,
    /// Maximum accepted request body in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_owned(),
            http_port: defaults::HTTP_PORT,
            environment: Environment::default(),
            vision: VisionModelConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
            max_upload_bytes: limits::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when a numeric variable cannot be parsed or is zero.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let port_raw = env::var(env_vars::HTTP_PORT)
            .or_else(|_| env::var(env_vars::PORT))
            .unwrap_or_else(|_| defaults::HTTP_PORT.to_string());
        let http_port: u16 = port_raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid HTTP_PORT value: {port_raw}"))?;

        let timeout_secs: u64 = env_var_or(
            env_vars::ANALYZE_TIMEOUT_SECS,
            &timeouts::DEFAULT_MODEL_TIMEOUT_SECS.to_string(),
        )
        .parse()
        .context("Invalid ANALYZE_TIMEOUT_SECS value")?;

        let max_requests: u32 = env_var_or(
            env_vars::ANALYZE_RATE_LIMIT_REQUESTS,
            &limits::DEFAULT_RATE_LIMIT_REQUESTS.to_string(),
        )
        .parse()
        .context("Invalid ANALYZE_RATE_LIMIT_REQUESTS value")?;

        let window_secs: u64 = env_var_or(
            env_vars::ANALYZE_RATE_LIMIT_WINDOW_SECS,
            &limits::DEFAULT_RATE_LIMIT_WINDOW_SECS.to_string(),
        )
        .parse()
        .context("Invalid ANALYZE_RATE_LIMIT_WINDOW_SECS value")?;

        let sweep_secs: u64 = env_var_or(
            env_vars::ANALYZE_RATE_LIMIT_SWEEP_SECS,
            &limits::DEFAULT_RATE_LIMIT_SWEEP_SECS.to_string(),
        )
        .parse()
        .context("Invalid ANALYZE_RATE_LIMIT_SWEEP_SECS value")?;

        let max_upload_bytes: usize = env_var_or(
            env_vars::ANALYZE_MAX_UPLOAD_BYTES,
            &limits::DEFAULT_MAX_UPLOAD_BYTES.to_string(),
        )
        .parse()
        .context("Invalid ANALYZE_MAX_UPLOAD_BYTES value")?;

        if timeout_secs == 0 || window_secs == 0 || sweep_secs == 0 {
            anyhow::bail!(
                "ANALYZE_TIMEOUT_SECS, ANALYZE_RATE_LIMIT_WINDOW_SECS and \
                 ANALYZE_RATE_LIMIT_SWEEP_SECS must be greater than zero"
            );
        }

        let window = Duration::from_secs(window_secs);

        let config = Self {
            host: env_var_or(env_vars::HOST, defaults::HOST),
            http_port,
            environment: Environment::from_str_or_default(&env_var_or(
                env_vars::ENVIRONMENT,
                "development",
            )),
            vision: VisionModelConfig {
                api_key: env::var(env_vars::OPENAI_API_KEY)
                    .ok()
                    .map(|key| key.trim().to_owned())
                    .filter(|key| !key.is_empty()),
                model: non_empty_or(
                    env_var_or(env_vars::OPENAI_MODEL, defaults::OPENAI_MODEL),
                    defaults::OPENAI_MODEL,
                ),
                base_url: non_empty_or(
                    env_var_or(env_vars::OPENAI_BASE_URL, defaults::OPENAI_BASE_URL),
                    defaults::OPENAI_BASE_URL,
                ),
                timeout: Duration::from_secs(timeout_secs),
            },
            rate_limit: RateLimitConfig {
                max_requests,
                window,
                stale_entry_timeout: window,
                sweep_interval: Duration::from_secs(sweep_secs),
                cleanup_threshold: limits::RATE_LIMIT_CLEANUP_THRESHOLD,
            },
            cors: CorsConfig {
                allowed_origins: env_var_or(
                    env_vars::CORS_ALLOWED_ORIGINS,
                    defaults::CORS_ALLOWED_ORIGINS,
                ),
            },
            max_upload_bytes,
        };

        Ok(config)
    }

    /// Whether the vision model credential is configured
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.vision.has_api_key()
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "FormAI Server Configuration: environment={}, bind={}:{}, model={}, api_key={}, \
             timeout={}s, rate_limit={}/{}s, cors={}, max_upload={}B",
            self.environment,
            self.host,
            self.http_port,
            self.vision.model,
            if self.has_api_key() {
                "configured"
            } else {
                "missing"
            },
            self.vision.timeout.as_secs(),
            self.rate_limit.max_requests,
            self.rate_limit.window_secs(),
            self.cors.allowed_origins,
            self.max_upload_bytes,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_owned()
    } else {
        value
    }
}
