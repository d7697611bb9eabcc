// ABOUTME: Shared server resources handed to every route handler
// ABOUTME: Bundles configuration with the analysis orchestrator and its rate limiter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use crate::analysis::AnalysisOrchestrator;
use crate::config::environment::ServerConfig;
use crate::errors::AppError;
use crate::rate_limiting::AnalyzeRateLimiter;

/// State shared across request tasks
pub struct ServerResources {
    /// Startup configuration
    pub config: ServerConfig,
    /// Analyze pipeline
    pub orchestrator: AnalysisOrchestrator,
}

impl ServerResources {
    /// Build resources from configuration, creating the rate limiter and provider
    ///
    /// # Errors
    ///
    /// Returns an error if the model provider cannot be initialized.
    pub fn from_config(config: ServerConfig) -> Result<Self, AppError> {
        let rate_limiter = Arc::new(AnalyzeRateLimiter::new(config.rate_limit));
        let orchestrator = AnalysisOrchestrator::from_config(&config, rate_limiter)?;
        Ok(Self {
            config,
            orchestrator,
        })
    }

    /// Assemble resources from parts (used when injecting a provider)
    #[must_use]
    pub const fn new(config: ServerConfig, orchestrator: AnalysisOrchestrator) -> Self {
        Self {
            config,
            orchestrator,
        }
    }
}
