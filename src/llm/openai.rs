// ABOUTME: OpenAI chat completions provider with vision and JSON-mode support
// ABOUTME: Sends multimodal messages to any OpenAI-compatible endpoint with bearer auth
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI` Provider
//!
//! Implementation of [`LlmProvider`] for the `OpenAI` chat completions API and
//! compatible endpoints (`OPENAI_BASE_URL`).
//!
//! Each call performs exactly one `POST {base_url}/chat/completions`. Requests
//! carry `response_format: {"type": "json_object"}` when JSON mode is asked for
//! and the provider advertises it.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::{
    ChatMessage, ChatRequest, ChatResponse, LlmCapabilities, LlmProvider, MessageContent,
    TokenUsage,
};
use crate::constants::{defaults, timeouts};
use crate::errors::AppError;

/// Service label used in upstream error messages
const SERVICE_LABEL: &str = "OpenAI";

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a MessageContent,
}

impl<'a> From<&'a ChatMessage> for OpenAiMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: msg.role.as_str(),
            content: &msg.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI` provider
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL for the API (e.g., <https://api.openai.com/v1>)
    pub base_url: String,
    /// Bearer credential
    pub api_key: String,
    /// Default model to use
    pub default_model: String,
    /// Capabilities of this endpoint
    pub capabilities: LlmCapabilities,
}

impl OpenAiConfig {
    /// Configuration for the public `OpenAI` API
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: defaults::OPENAI_BASE_URL.to_owned(),
            api_key: api_key.into(),
            default_model: model.into(),
            capabilities: LlmCapabilities::vision_json(),
        }
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// `OpenAI` chat completions provider
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create a new provider with the given configuration
    ///
    /// Only a connect timeout is set on the client; the overall deadline of a
    /// call is enforced by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(timeouts::MODEL_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn log_messages_debug(messages: &[ChatMessage]) {
        for (i, msg) in messages.iter().enumerate() {
            debug!(
                index = i,
                role = msg.role.as_str(),
                text_len = msg.content.text_len(),
                images = msg.content.image_count(),
                "Outgoing chat message"
            );
        }
    }

    /// Map a non-success response to an upstream error
    ///
    /// The message keeps the status code and the upstream explanation so the
    /// client sees `OpenAI error: 401 Incorrect API key provided`.
    fn parse_error_response(status: StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<OpenAiErrorResponse>(body).map_or_else(
            |_| body.chars().take(500).collect::<String>(),
            |parsed| parsed.error.message,
        );

        AppError::external_service(SERVICE_LABEL, format!("{} {detail}", status.as_u16()))
            .with_details(serde_json::json!({ "upstreamStatus": status.as_u16() }))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn display_name(&self) -> &'static str {
        "OpenAI"
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        Self::log_messages_debug(&request.messages);

        let response_format = (request.json_mode && self.config.capabilities.supports_json_mode())
            .then_some(ResponseFormat {
                format_type: "json_object",
            });

        let openai_request = OpenAiRequest {
            model,
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            response_format,
        };

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to OpenAI");
                AppError::external_service(SERVICE_LABEL, format!("Failed to connect: {e}"))
                    .with_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read OpenAI response");
            AppError::external_service(SERVICE_LABEL, format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, body_len = body.len(), "Failed to parse OpenAI response envelope");
            AppError::external_service(SERVICE_LABEL, format!("Failed to parse response: {e}"))
        })?;

        // Missing choices or content is handed to validation as an empty string.
        let (content, finish_reason) = openai_response
            .choices
            .into_iter()
            .next()
            .map_or((String::new(), None), |choice| {
                (choice.message.content.unwrap_or_default(), choice.finish_reason)
            });

        debug!(
            content_len = content.len(),
            finish_reason = ?finish_reason,
            "Received OpenAI completion"
        );

        Ok(ChatResponse {
            content,
            model: openai_response.model.unwrap_or_else(|| model.to_owned()),
            usage: openai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt,
                completion_tokens: u.completion,
                total_tokens: u.total,
            }),
            finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ContentPart;

    #[test]
    fn test_request_serialization_includes_json_mode_and_image() {
        let messages = vec![
            ChatMessage::system("sys"),
            ChatMessage::user_parts(vec![
                ContentPart::text("Return only JSON. No extra text."),
                ContentPart::image_url("https://example.com/rack.jpg"),
            ]),
        ];
        let request = OpenAiRequest {
            model: "gpt-4o",
            messages: messages.iter().map(OpenAiMessage::from).collect(),
            temperature: Some(0.2),
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["content"], "sys");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(
            json["messages"][1]["content"][1]["image_url"]["url"],
            "https://example.com/rack.jpg"
        );
    }

    #[test]
    fn test_parse_error_response_uses_upstream_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let err = OpenAiProvider::parse_error_response(StatusCode::UNAUTHORIZED, body);

        assert_eq!(err.message, "OpenAI error: 401 Incorrect API key provided");
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_parse_error_response_falls_back_to_raw_body() {
        let err = OpenAiProvider::parse_error_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.message, "OpenAI error: 502 upstream down");
    }

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let provider = OpenAiProvider::new(
            OpenAiConfig::new("sk-test", "gpt-4o").with_base_url("http://localhost:9999/v1/"),
        )
        .unwrap();
        assert_eq!(
            provider.api_url("chat/completions"),
            "http://localhost:9999/v1/chat/completions"
        );
    }
}
