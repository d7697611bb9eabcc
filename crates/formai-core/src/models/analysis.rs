// ABOUTME: Analysis result model returned by the analyze endpoint
// ABOUTME: Strongly typed coaching content for one identified gym machine or exercise
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Muscle groups targeted by an exercise, in the model's order of emphasis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuscleGroups {
    /// Primary movers
    pub primary: Vec<String>,
    /// Assisting muscles
    pub secondary: Vec<String>,
}

/// Identified machine or exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineInfo {
    /// Canonical exercise name
    pub name: String,
    /// Identification confidence in `[0, 1]`
    pub confidence: f64,
    /// Targeted muscles
    pub muscles: MuscleGroups,
}

/// Validated analysis of one equipment photo
///
/// Field names serialize in camelCase to match the client contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// UUID of this analysis
    pub id: String,
    /// Identified machine
    pub machine: MachineInfo,
    /// How the machine works
    pub how_it_works: String,
    /// Step-by-step usage instructions
    pub steps: Vec<String>,
    /// Safety risks and how to avoid them
    pub safety_risks: Vec<String>,
    /// Common form mistakes
    pub common_mistakes: Vec<String>,
    /// Alternative machines or exercises
    pub alternatives: Vec<String>,
    /// Two or three line coaching summary
    pub quick_coach: String,
    /// Free-form notes from the model, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_model_notes: Option<String>,
    /// ISO-8601 creation timestamp
    pub created_at: String,
}
