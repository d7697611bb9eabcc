// ABOUTME: Drives one analyze call from rate limiting to a canonicalized result
// ABOUTME: Invokes the vision model with per-attempt deadlines and one schema-driven retry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Analysis Orchestrator
//!
//! Flow of one call:
//!
//! ```text
//! Start -> RateChecked -> InputNormalized -> DemoPath ------------------------+
//!                                         -> ModelInvoked -> Validated -------+-> Canonicalized -> Done
//!                                                         -> RetryInvoked -> Validated
//! ```
//!
//! Any non-terminal stage may end in `Failed(kind)`. Every attempt gets its own
//! deadline; a timed-out call is dropped and its late result discarded.
//! Transport failures end the call immediately. Only a validation failure of
//! the first attempt triggers the retry.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::canonical::canonicalize_exercise_name;
use super::coercer::{coerce_str, coerce_value};
use super::demo::demo_fixture;
use super::error::AnalysisError;
use super::request::{AnalysisRequest, ImageInput};
use crate::config::environment::{ServerConfig, VisionModelConfig};
use crate::constants::defaults;
use crate::errors::AppError;
use crate::llm::prompts::{
    analyze_system_prompt, analyze_user_text, retry_system_prompt, RETRY_USER_INSTRUCTION,
};
use crate::llm::{ChatMessage, ChatRequest, ContentPart, LlmProvider, OpenAiConfig, OpenAiProvider};
use crate::models::AnalysisResult;
use crate::rate_limiting::{AnalyzeRateLimiter, RateLimitStatus};

/// Pipeline stage, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    RateChecked,
    InputNormalized,
    DemoPath,
    ModelInvoked,
    RetryInvoked,
    Validated,
    Canonicalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RateChecked => "rate_checked",
            Self::InputNormalized => "input_normalized",
            Self::DemoPath => "demo_path",
            Self::ModelInvoked => "model_invoked",
            Self::RetryInvoked => "retry_invoked",
            Self::Validated => "validated",
            Self::Canonicalized => "canonicalized",
        };
        f.write_str(name)
    }
}

fn enter(stage: Stage) {
    debug!(stage = %stage, "Analysis stage");
}

fn failed(error: AnalysisError) -> AnalysisError {
    debug!(stage = "failed", kind = error.kind(), "Analysis stage");
    error
}

/// Which of the two model attempts is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

impl Attempt {
    const fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Retry => 2,
        }
    }
}

/// Analyze pipeline shared by all request tasks
pub struct AnalysisOrchestrator {
    rate_limiter: Arc<AnalyzeRateLimiter>,
    provider: Option<Arc<dyn LlmProvider>>,
    model: String,
    call_timeout: Duration,
    system_prompt: String,
    retry_prompt: String,
}

impl AnalysisOrchestrator {
    /// Create an orchestrator around an optional provider
    ///
    /// `None` means no credentials are configured; only demo requests succeed.
    #[must_use]
    pub fn new(
        rate_limiter: Arc<AnalyzeRateLimiter>,
        provider: Option<Arc<dyn LlmProvider>>,
        vision: &VisionModelConfig,
    ) -> Self {
        if let Some(provider) = &provider {
            if !provider.capabilities().supports_vision() {
                warn!(
                    provider = provider.name(),
                    "Configured model provider does not advertise vision support"
                );
            }
        }

        Self {
            rate_limiter,
            provider,
            model: vision.model.clone(),
            call_timeout: vision.timeout,
            system_prompt: analyze_system_prompt(),
            retry_prompt: retry_system_prompt(),
        }
    }

    /// Build the orchestrator from server configuration
    ///
    /// Creates an `OpenAI` provider when an API key is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(
        config: &ServerConfig,
        rate_limiter: Arc<AnalyzeRateLimiter>,
    ) -> Result<Self, AppError> {
        let provider: Option<Arc<dyn LlmProvider>> = match &config.vision.api_key {
            Some(api_key) => {
                let provider_config = OpenAiConfig::new(api_key.clone(), config.vision.model.clone())
                    .with_base_url(config.vision.base_url.clone());
                info!(
                    model = %config.vision.model,
                    base_url = %config.vision.base_url,
                    "Initializing OpenAI vision provider"
                );
                let provider: Arc<dyn LlmProvider> =
                    Arc::new(OpenAiProvider::new(provider_config)?);
                Some(provider)
            }
            None => {
                warn!("OPENAI_API_KEY not set; only demo analysis requests will succeed");
                None
            }
        };

        Ok(Self::new(rate_limiter, provider, &config.vision))
    }

    /// Override the per-attempt deadline
    #[must_use]
    pub const fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Whether a model provider is configured
    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Model name sent to the provider
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Shared rate limiter
    #[must_use]
    pub fn rate_limiter(&self) -> &AnalyzeRateLimiter {
        &self.rate_limiter
    }

    /// Gate a client on the rate limiter
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::RateLimited`] when the client's budget is spent.
    pub fn admit(&self, client_key: &str) -> Result<RateLimitStatus, AnalysisError> {
        let status = self.rate_limiter.check(client_key);
        if status.is_limited {
            warn!(
                client_key,
                limit = status.limit,
                retry_after = ?status.retry_after_seconds,
                "Analyze rate limit exceeded"
            );
            return Err(failed(AnalysisError::RateLimited(status)));
        }
        enter(Stage::RateChecked);
        Ok(status)
    }

    /// Run the full pipeline: rate limit gate, then analysis
    ///
    /// # Errors
    ///
    /// Returns the [`AnalysisError`] kind that ended the pipeline.
    pub async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.admit(&request.client_key)?;
        self.analyze_admitted(request).await
    }

    /// Run the pipeline for a request that already passed [`Self::admit`]
    ///
    /// # Errors
    ///
    /// Returns the [`AnalysisError`] kind that ended the pipeline.
    #[instrument(
        skip(self, request),
        fields(client_key = %request.client_key, demo = request.demo_mode, model = %self.model)
    )]
    pub async fn analyze_admitted(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        if request.demo_mode {
            enter(Stage::InputNormalized);
            return Self::demo_result();
        }

        let Some(image) = request.image else {
            return Err(failed(AnalysisError::MissingInput));
        };
        enter(Stage::InputNormalized);
        debug!(image_kind = image.kind(), image_len = image.len(), "Image accepted");

        let Some(provider) = self.provider.as_deref() else {
            return Err(failed(AnalysisError::ServiceUnavailable));
        };

        let first = self
            .invoke(provider, self.first_messages(&image, request.user_note.as_deref()), Attempt::First)
            .await
            .map_err(failed)?;

        let result = match coerce_str(&first) {
            Ok(result) => result,
            Err(validation) => {
                warn!(
                    issues = validation.issues.len(),
                    first_issue = ?validation.issues.first().map(ToString::to_string),
                    "Model output failed validation; retrying with shape-only prompt"
                );
                let second = self
                    .invoke(provider, self.retry_messages(&image), Attempt::Retry)
                    .await
                    .map_err(failed)?;
                coerce_str(&second).map_err(|validation| {
                    warn!(
                        issues = validation.issues.len(),
                        "Model output failed validation after retry"
                    );
                    failed(AnalysisError::ValidationFailed(validation))
                })?
            }
        };
        enter(Stage::Validated);

        Ok(Self::canonicalized(result))
    }

    fn demo_result() -> Result<AnalysisResult, AnalysisError> {
        enter(Stage::DemoPath);
        let result = coerce_value(demo_fixture())
            .map_err(|validation| failed(AnalysisError::ValidationFailed(validation)))?;
        enter(Stage::Validated);
        Ok(Self::canonicalized(result))
    }

    fn canonicalized(mut result: AnalysisResult) -> AnalysisResult {
        let canonical = canonicalize_exercise_name(&result.machine.name);
        if canonical != result.machine.name {
            debug!(from = %result.machine.name, to = %canonical, "Canonicalized exercise name");
        }
        result.machine.name = canonical;
        enter(Stage::Canonicalized);
        info!(
            analysis_id = %result.id,
            machine = %result.machine.name,
            confidence = result.machine.confidence,
            "Analysis completed"
        );
        result
    }

    fn first_messages(&self, image: &ImageInput, user_note: Option<&str>) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user_parts(vec![
                ContentPart::text(analyze_user_text(user_note)),
                ContentPart::image_url(image.as_url()),
            ]),
        ]
    }

    fn retry_messages(&self, image: &ImageInput) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.retry_prompt.clone()),
            ChatMessage::user_parts(vec![ContentPart::text(RETRY_USER_INSTRUCTION)]),
            ChatMessage::user_parts(vec![ContentPart::image_url(image.as_url())]),
        ]
    }

    /// One bounded model call; returns the raw output text
    async fn invoke(
        &self,
        provider: &dyn LlmProvider,
        messages: Vec<ChatMessage>,
        attempt: Attempt,
    ) -> Result<String, AnalysisError> {
        enter(match attempt {
            Attempt::First => Stage::ModelInvoked,
            Attempt::Retry => Stage::RetryInvoked,
        });

        let mut request = ChatRequest::new(messages)
            .with_model(self.model.clone())
            .with_temperature(defaults::MODEL_TEMPERATURE);
        if provider.capabilities().supports_json_mode() {
            request = request.with_json_mode();
        }

        match timeout(self.call_timeout, provider.complete(&request)).await {
            Err(_) => {
                warn!(
                    attempt = attempt.number(),
                    timeout_ms = self.call_timeout.as_millis(),
                    "Model call timed out"
                );
                Err(AnalysisError::UpstreamTimeout(self.call_timeout))
            }
            Ok(Err(error)) => {
                warn!(attempt = attempt.number(), error = %error, "Model call failed");
                Err(AnalysisError::UpstreamError(error))
            }
            Ok(Ok(response)) => {
                debug!(
                    attempt = attempt.number(),
                    content_len = response.content.len(),
                    finish_reason = ?response.finish_reason,
                    "Model call returned"
                );
                Ok(response.content)
            }
        }
    }
}
