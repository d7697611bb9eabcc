// ABOUTME: Gym equipment photo analysis pipeline
// ABOUTME: Request normalization, model output coercion, name canonicalization, and orchestration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Analysis
//!
//! - **request**: normalized input and client identity derivation
//! - **coercer**: raw model output to validated [`AnalysisResult`](crate::models::AnalysisResult)
//! - **canonical**: exercise name normalization
//! - **demo**: fixed result for credential-free requests
//! - **orchestrator**: the end-to-end pipeline with timeout and retry
//! - **error**: failure kinds and their HTTP mapping

pub mod canonical;
pub mod coercer;
pub mod demo;
pub mod error;
pub mod orchestrator;
pub mod request;

pub use canonical::canonicalize_exercise_name;
pub use coercer::{coerce_str, coerce_value, ValidationError, ValidationIssue};
pub use error::AnalysisError;
pub use orchestrator::AnalysisOrchestrator;
pub use request::{client_key_from_headers, AnalysisRequest, ImageInput};
