// ABOUTME: Scripted vision model provider for orchestrator and route tests
// ABOUTME: Replays queued replies, failures, and delays while recording every request it receives
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use formai_server::errors::AppError;
use formai_server::llm::{ChatRequest, ChatResponse, LlmCapabilities, LlmProvider};

/// One scripted reaction to a `complete` call
pub enum Scripted {
    /// Return this content
    Reply(String),
    /// Fail with an upstream error carrying this message
    Fail(String),
    /// Sleep, then return this content
    Delayed(Duration, String),
}

/// Provider double that answers from a queue
///
/// Once the queue is drained every call fails, so an unexpected extra call
/// shows up as an error instead of hanging.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
    capabilities: LlmCapabilities,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            capabilities: LlmCapabilities::vision_json(),
        }
    }

    /// Provider that replies with each string in order
    pub fn replying(replies: &[&str]) -> Self {
        Self::new(
            replies
                .iter()
                .map(|reply| Scripted::Reply((*reply).to_owned()))
                .collect(),
        )
    }

    #[allow(dead_code)]
    pub fn with_capabilities(mut self, capabilities: LlmCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Number of `complete` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received, in call order
    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted Test Provider"
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.capabilities
    }

    fn default_model(&self) -> &str {
        "scripted-vision"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let next = self.script.lock().unwrap().pop_front();
        let content = match next {
            Some(Scripted::Reply(content)) => content,
            Some(Scripted::Fail(message)) => {
                return Err(AppError::external_service("Scripted", message))
            }
            Some(Scripted::Delayed(delay, content)) => {
                tokio::time::sleep(delay).await;
                content
            }
            None => return Err(AppError::internal("scripted provider exhausted")),
        };

        Ok(ChatResponse {
            content,
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model().to_owned()),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }
}
