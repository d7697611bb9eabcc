// ABOUTME: Prompts for the equipment analysis model calls loaded at compile time
// ABOUTME: Provides the full coaching instruction and the shape-only retry instruction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.
//! The output-shape contract lives in its own file so the retry attempt can
//! send it without the coaching instructions.

/// Placeholder in the coaching prompt replaced by the shape contract
const SHAPE_PLACEHOLDER: &str = "{{SHAPE}}";

/// Coaching instructions for the first attempt (contains the shape placeholder)
pub const ANALYZE_SYSTEM_TEMPLATE: &str = include_str!("analyze_system.md");

/// Strict JSON output contract
pub const ANALYZE_SHAPE_CONTRACT: &str = include_str!("analyze_shape.md");

/// User instruction sent with the image on the first attempt
pub const ANALYZE_USER_INSTRUCTION: &str = "Return only JSON. No extra text.";

/// User instruction sent on the retry attempt
pub const RETRY_USER_INSTRUCTION: &str =
    "Return valid JSON ONLY that matches the AnalyzeResponse type.";

/// Full system prompt for the first analysis attempt
#[must_use]
pub fn analyze_system_prompt() -> String {
    ANALYZE_SYSTEM_TEMPLATE.replace(SHAPE_PLACEHOLDER, ANALYZE_SHAPE_CONTRACT.trim_end())
}

/// System prompt for the retry attempt: the output contract only
#[must_use]
pub fn retry_system_prompt() -> String {
    format!(
        "You are FormAI. Your previous answer did not match the required format.\n{}",
        ANALYZE_SHAPE_CONTRACT.trim_end()
    )
}

/// User text for the first attempt: optional note line, then the JSON-only instruction
#[must_use]
pub fn analyze_user_text(user_note: Option<&str>) -> String {
    match user_note.map(str::trim).filter(|note| !note.is_empty()) {
        Some(note) => format!("User note: {note}\n{ANALYZE_USER_INSTRUCTION}"),
        None => ANALYZE_USER_INSTRUCTION.to_owned(),
    }
}
