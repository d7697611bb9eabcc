// ABOUTME: Fixture builders for analysis integration tests
// ABOUTME: Model output documents and fully wired server resources around a provider double
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use formai_server::analysis::AnalysisOrchestrator;
use formai_server::config::environment::{RateLimitConfig, ServerConfig};
use formai_server::llm::LlmProvider;
use formai_server::rate_limiting::AnalyzeRateLimiter;
use formai_server::resources::ServerResources;
use serde_json::{json, Value};

/// A schema-valid model output without `id` or `createdAt`
pub fn model_output(machine_name: &str) -> Value {
    json!({
        "machine": {
            "name": machine_name,
            "confidence": 0.82,
            "muscles": {
                "primary": ["Latissimus dorsi"],
                "secondary": ["Biceps brachii", "Rear deltoids"]
            }
        },
        "howItWorks": "A cable pulls a weight stack as you draw the bar toward your chest.",
        "steps": [
            "Adjust the thigh pad so your legs are locked in.",
            "Grip the bar slightly wider than shoulder width.",
            "Pull the bar to your upper chest, then return under control."
        ],
        "safetyRisks": ["Pulling behind the neck strains the shoulders."],
        "commonMistakes": ["Leaning far back to swing the weight."],
        "alternatives": ["Assisted Pull-Up", "Single-Arm Cable Row"],
        "quickCoach": "Chest up. Lead with the elbows."
    })
}

/// [`model_output`] serialized as the model would send it
pub fn model_output_text(machine_name: &str) -> String {
    model_output(machine_name).to_string()
}

/// Rate limit settings with a small budget for tests
#[allow(dead_code)]
pub fn tight_rate_limit(max_requests: u32) -> RateLimitConfig {
    RateLimitConfig {
        max_requests,
        ..RateLimitConfig::default()
    }
}

/// Orchestrator around an optional provider with the given limiter settings
pub fn orchestrator(
    provider: Option<Arc<dyn LlmProvider>>,
    rate_limit: RateLimitConfig,
) -> AnalysisOrchestrator {
    let config = ServerConfig::default();
    AnalysisOrchestrator::new(
        Arc::new(AnalyzeRateLimiter::new(rate_limit)),
        provider,
        &config.vision,
    )
    .with_call_timeout(Duration::from_secs(5))
}

/// Server resources around an optional provider
#[allow(dead_code)]
pub fn resources(
    provider: Option<Arc<dyn LlmProvider>>,
    rate_limit: RateLimitConfig,
) -> Arc<ServerResources> {
    let config = ServerConfig {
        rate_limit,
        ..ServerConfig::default()
    };
    Arc::new(ServerResources::new(config, orchestrator(provider, rate_limit)))
}
