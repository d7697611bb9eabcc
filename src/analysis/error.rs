// ABOUTME: Failure kinds of the analyze pipeline and their mapping to HTTP errors
// ABOUTME: Converts each AnalysisError into the shared AppError with client-facing messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Duration;

use serde_json::json;
use thiserror::Error;

use super::coercer::ValidationError;
use crate::errors::AppError;
use crate::rate_limiting::RateLimitStatus;

/// Why an analyze call failed
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Client exceeded its request budget
    #[error("rate limit exceeded ({} requests per window)", .0.limit)]
    RateLimited(RateLimitStatus),

    /// No image and not a demo request
    #[error("missing image in request")]
    MissingInput,

    /// Request body could not be decoded
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// No model provider configured (missing credentials)
    #[error("model provider is not configured")]
    ServiceUnavailable,

    /// A model attempt exceeded its deadline
    #[error("model call timed out after {}s", .0.as_secs())]
    UpstreamTimeout(Duration),

    /// Transport or HTTP failure talking to the model
    #[error("model call failed: {0}")]
    UpstreamError(#[source] AppError),

    /// Output still invalid after the retry
    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),
}

impl AnalysisError {
    /// Short label for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited(_) => "rate_limited",
            Self::MissingInput => "missing_input",
            Self::MalformedRequest(_) => "malformed_request",
            Self::ServiceUnavailable => "service_unavailable",
            Self::UpstreamTimeout(_) => "upstream_timeout",
            Self::UpstreamError(_) => "upstream_error",
            Self::ValidationFailed(_) => "validation_failed",
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::RateLimited(status) => Self::rate_limit_exceeded(
                status.limit,
                status.retry_after_seconds.unwrap_or(status.window_seconds),
            ),
            AnalysisError::MissingInput => Self::missing_field("Missing image in request."),
            AnalysisError::MalformedRequest(reason) => {
                Self::invalid_format("Invalid request format").with_details(json!({
                    "reason": reason,
                }))
            }
            AnalysisError::ServiceUnavailable => {
                Self::config_missing("Server missing OPENAI_API_KEY. Configure it and redeploy.")
            }
            AnalysisError::UpstreamTimeout(_) => {
                Self::external_timeout("AI request timed out. Please retry.")
            }
            AnalysisError::UpstreamError(inner) => inner,
            AnalysisError::ValidationFailed(validation) => {
                let details = serde_json::to_value(&validation).unwrap_or_else(|_| json!({}));
                Self::model_output_invalid("Failed to parse/validate AI JSON output.")
                    .with_details(details)
            }
        }
    }
}
