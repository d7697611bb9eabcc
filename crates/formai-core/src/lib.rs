// ABOUTME: Core types and constants for the FormAI gym equipment analysis service
// ABOUTME: Foundation crate with error handling, analysis result models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # `FormAI` Core
//!
//! Foundation crate providing shared types and constants for the `FormAI`
//! analyze service. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Defaults, limits, and environment variable names
//! - **models**: The `AnalysisResult` wire contract returned to clients

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and configuration defaults organized by domain
pub mod constants;

/// Core data models (`AnalysisResult`, `MachineInfo`, `MuscleGroups`)
pub mod models;
