// ABOUTME: Integration tests for the analysis orchestrator pipeline
// ABOUTME: Covers demo mode, missing input, the single validation retry, transport errors, and timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use formai_server::analysis::{AnalysisError, AnalysisRequest, ImageInput};
use formai_server::config::environment::RateLimitConfig;
use formai_server::errors::ErrorCode;
use formai_server::llm::{LlmCapabilities, LlmProvider, MessageContent, MessageRole};
use helpers::fixtures::{model_output, model_output_text, orchestrator, tight_rate_limit};
use helpers::scripted_provider::{Scripted, ScriptedProvider};
use serde_json::json;

fn photo_request() -> AnalysisRequest {
    AnalysisRequest::new("198.51.100.4")
        .with_image(ImageInput::from_bytes(b"\x89PNG fake image bytes", Some("image/png")).unwrap())
}

fn with_provider(provider: &Arc<ScriptedProvider>) -> Option<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = provider.clone();
    Some(provider)
}

#[tokio::test]
async fn test_demo_succeeds_without_provider_or_image() {
    let orchestrator = orchestrator(None, RateLimitConfig::default());

    let result = orchestrator
        .analyze(AnalysisRequest::new("anon").with_demo(true))
        .await
        .unwrap();

    assert_eq!(result.machine.name, "Barbell Bench Press");
    assert!(!result.id.is_empty());
    assert!(!result.created_at.is_empty());
}

#[tokio::test]
async fn test_missing_image_makes_no_model_call() {
    let provider = Arc::new(ScriptedProvider::replying(&[]));
    let orchestrator = orchestrator(with_provider(&provider), RateLimitConfig::default());

    let err = orchestrator
        .analyze(AnalysisRequest::new("anon"))
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::MissingInput));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_missing_credentials_is_service_unavailable() {
    let orchestrator = orchestrator(None, RateLimitConfig::default());

    let err = orchestrator.analyze(photo_request()).await.unwrap_err();
    assert!(matches!(err, AnalysisError::ServiceUnavailable));
}

#[tokio::test]
async fn test_valid_first_reply_is_canonicalized() {
    let provider = Arc::new(ScriptedProvider::replying(&[&model_output_text(
        "wide grip lat pulldown",
    )]));
    let orchestrator = orchestrator(with_provider(&provider), RateLimitConfig::default());

    let result = orchestrator.analyze(photo_request()).await.unwrap();

    assert_eq!(result.machine.name, "Lat Pulldown");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_first_request_carries_prompt_image_and_json_mode() {
    let provider = Arc::new(ScriptedProvider::replying(&[&model_output_text("Leg Press")]));
    let orchestrator = orchestrator(with_provider(&provider), RateLimitConfig::default());

    orchestrator
        .analyze(photo_request().with_user_note("left knee is sore"))
        .await
        .unwrap();

    let requests = provider.requests();
    let request = &requests[0];
    assert!(request.json_mode);
    assert_eq!(request.temperature, Some(0.2));
    assert_eq!(request.model.as_deref(), Some("gpt-4o"));
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, MessageRole::System);

    let user = &request.messages[1].content;
    assert_eq!(user.image_count(), 1);
    let MessageContent::Parts(parts) = user else {
        panic!("user message should be multi-part");
    };
    let text = serde_json::to_string(&parts[0]).unwrap();
    assert!(text.contains("User note: left knee is sore"));
}

#[tokio::test]
async fn test_text_only_provider_gets_no_json_mode() {
    let provider = Arc::new(
        ScriptedProvider::replying(&[&model_output_text("Leg Press")])
            .with_capabilities(LlmCapabilities::VISION),
    );
    let orchestrator = orchestrator(with_provider(&provider), RateLimitConfig::default());

    orchestrator.analyze(photo_request()).await.unwrap();
    assert!(!provider.requests()[0].json_mode);
}

#[tokio::test]
async fn test_invalid_then_valid_retries_once() {
    let provider = Arc::new(ScriptedProvider::replying(&[
        "Here is what I see: a bench.",
        &model_output_text("Incline Bench Press"),
    ]));
    let orchestrator = orchestrator(with_provider(&provider), RateLimitConfig::default());

    let result = orchestrator.analyze(photo_request()).await.unwrap();

    assert_eq!(result.machine.name, "Incline Barbell Bench Press");
    assert_eq!(provider.calls(), 2);

    let retry = &provider.requests()[1];
    assert_eq!(retry.messages.len(), 3);
    assert_eq!(retry.messages[1].content.image_count(), 0);
    assert_eq!(retry.messages[2].content.image_count(), 1);
}

fn out_of_range_output() -> String {
    let mut doc = model_output("Leg Press");
    doc["machine"]["confidence"] = json!(1.5);
    doc.to_string()
}

#[tokio::test]
async fn test_out_of_range_confidence_twice_fails_validation() {
    let provider = Arc::new(ScriptedProvider::replying(&[
        &out_of_range_output(),
        &out_of_range_output(),
    ]));
    let orchestrator = orchestrator(with_provider(&provider), RateLimitConfig::default());

    let err = orchestrator.analyze(photo_request()).await.unwrap_err();

    let AnalysisError::ValidationFailed(validation) = &err else {
        panic!("expected validation failure, got {err:?}");
    };
    assert!(validation.has_issue_at("$.machine.confidence"));
    assert_eq!(validation.issues.len(), 1);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_slow_retry_times_out() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Scripted::Reply(out_of_range_output()),
        Scripted::Delayed(Duration::from_secs(5), model_output_text("Leg Press")),
    ]));
    let orchestrator = orchestrator(with_provider(&provider), RateLimitConfig::default())
        .with_call_timeout(Duration::from_millis(50));

    let err = orchestrator.analyze(photo_request()).await.unwrap_err();

    assert!(matches!(err, AnalysisError::UpstreamTimeout(_)));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_transport_error_is_not_retried() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Scripted::Fail("503 upstream overloaded".to_owned()),
        Scripted::Reply(model_output_text("Leg Press")),
    ]));
    let orchestrator = orchestrator(with_provider(&provider), RateLimitConfig::default());

    let err = orchestrator.analyze(photo_request()).await.unwrap_err();

    assert!(matches!(err, AnalysisError::UpstreamError(_)));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_slow_model_times_out() {
    let provider = Arc::new(ScriptedProvider::new(vec![Scripted::Delayed(
        Duration::from_secs(5),
        model_output_text("Leg Press"),
    )]));
    let orchestrator = orchestrator(with_provider(&provider), RateLimitConfig::default())
        .with_call_timeout(Duration::from_millis(50));

    let err = orchestrator.analyze(photo_request()).await.unwrap_err();

    assert!(matches!(err, AnalysisError::UpstreamTimeout(_)));
    assert_eq!(
        formai_server::errors::AppError::from(err).code,
        ErrorCode::ExternalServiceTimeout
    );
}

#[tokio::test]
async fn test_rate_limit_precedes_input_checks() {
    let orchestrator = orchestrator(None, tight_rate_limit(1));

    let first = orchestrator.analyze(AnalysisRequest::new("k")).await;
    assert!(matches!(first, Err(AnalysisError::MissingInput)));

    let second = orchestrator.analyze(AnalysisRequest::new("k")).await;
    let Err(AnalysisError::RateLimited(status)) = second else {
        panic!("expected rate limit rejection");
    };
    assert!(status.is_limited);
    assert!(status.retry_after_seconds.is_some());
}
