// ABOUTME: Route module organization for the FormAI HTTP endpoints
// ABOUTME: Groups the analyze and health routes behind route structs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the `FormAI` server
//!
//! Each domain module contains route definitions and thin handlers that
//! delegate to the analysis layer.

/// Gym equipment analysis routes
pub mod analyze;
/// Health check and system status routes
pub mod health;

/// Analyze route handlers
pub use analyze::AnalyzeRoutes;
/// Health check route handlers
pub use health::HealthRoutes;
