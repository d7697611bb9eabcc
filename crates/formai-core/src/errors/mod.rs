// ABOUTME: Unified error handling with standard error codes and HTTP status mapping
// ABOUTME: Defines AppError, ErrorCode, and the JSON error body returned to clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! This module provides the error type shared by every layer of the analyze
//! service. Domain errors (rate limiting, model output validation, upstream
//! failures) are converted into [`AppError`] at the service boundary, and
//! [`AppError`] renders the `{error, code, details?}` body clients receive.

#[cfg(feature = "http-response")]
mod http_response;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error as StdError;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Rate Limiting
    /// Per-client request budget exhausted
    RateLimitExceeded,

    // Validation
    /// Request encoding could not be decoded
    InvalidFormat,
    /// A required request field is absent
    MissingRequiredField,
    /// Request body exceeds the upload limit
    PayloadTooLarge,

    // External Services
    /// Upstream model provider returned an error or could not be reached
    ExternalServiceError,
    /// Upstream model provider did not answer before the deadline
    ExternalServiceTimeout,
    /// Upstream model output failed schema validation
    ModelOutputInvalid,

    // Configuration
    /// Required configuration (credentials) is missing
    ConfigMissing,

    // Internal
    /// Unexpected internal failure
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidFormat => 400,
            Self::PayloadTooLarge => 413,
            Self::MissingRequiredField => 422,
            Self::RateLimitExceeded => 429,
            Self::ExternalServiceError
            | Self::ExternalServiceTimeout
            | Self::ModelOutputInvalid
            | Self::ConfigMissing
            | Self::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::RateLimitExceeded => "Rate limit exceeded",
            Self::InvalidFormat => "The request format is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::PayloadTooLarge => "The request body is too large",
            Self::ExternalServiceError => "The AI service encountered an error",
            Self::ExternalServiceTimeout => "The AI service timed out",
            Self::ModelOutputInvalid => "The AI service returned invalid output",
            Self::ConfigMissing => "Required configuration is missing",
            Self::InternalError => "An internal server error occurred",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
#[error("{}: {message}", code.description())]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message, returned to the client as `error`
    pub message: String,
    /// Structured diagnostics, returned to the client as `details`
    pub details: Option<Value>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Rate limit exceeded
    #[must_use]
    pub fn rate_limit_exceeded(limit: u32, retry_after_seconds: u64) -> Self {
        Self::new(
            ErrorCode::RateLimitExceeded,
            "Rate limit exceeded. Please wait and try again.",
        )
        .with_details(serde_json::json!({
            "limit": limit,
            "retryAfterSeconds": retry_after_seconds,
        }))
    }

    /// Request body could not be decoded
    #[must_use]
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormat, message)
    }

    /// Required request field is absent
    #[must_use]
    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingRequiredField, message)
    }

    /// Request body exceeds the upload limit
    #[must_use]
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, message)
    }

    /// Required configuration is missing
    #[must_use]
    pub fn config_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigMissing, message)
    }

    /// External service error
    #[must_use]
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{} error: {}", service.into(), message.into()),
        )
    }

    /// External service did not answer in time
    #[must_use]
    pub fn external_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalServiceTimeout, message)
    }

    /// Model output rejected by schema validation
    #[must_use]
    pub fn model_output_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModelOutputInvalid, message)
    }

    /// Internal server error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Structured diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: error.message,
            code: error.code,
            details: error.details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::RateLimitExceeded.http_status(), 429);
        assert_eq!(ErrorCode::MissingRequiredField.http_status(), 422);
        assert_eq!(ErrorCode::InvalidFormat.http_status(), 400);
        assert_eq!(ErrorCode::PayloadTooLarge.http_status(), 413);
        assert_eq!(ErrorCode::ConfigMissing.http_status(), 500);
        assert_eq!(ErrorCode::ExternalServiceTimeout.http_status(), 500);
        assert_eq!(ErrorCode::ModelOutputInvalid.http_status(), 500);
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::rate_limit_exceeded(20, 42);
        let response = ErrorResponse::from(error);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], "RATE_LIMIT_EXCEEDED");
        assert_eq!(json["details"]["limit"], 20);
        assert!(json["error"].is_string());
    }

    #[test]
    fn test_error_response_omits_empty_details() {
        let response = ErrorResponse::from(AppError::missing_field("Missing image in request."));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["error"], "Missing image in request.");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_display_includes_description() {
        let error = AppError::config_missing("OPENAI_API_KEY");
        assert_eq!(
            error.to_string(),
            "Required configuration is missing: OPENAI_API_KEY"
        );
    }
}
