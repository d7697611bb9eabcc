// ABOUTME: Rule-based normalization of free-text exercise names
// ABOUTME: Maps common bench press, chest press, and lat pulldown variants to one label each
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Map an exercise name to its canonical label
///
/// Matching is case-insensitive on substrings and the first matching rule wins.
/// Names matching no rule are returned unchanged.
#[must_use]
pub fn canonicalize_exercise_name(name: &str) -> String {
    let lower = name.to_lowercase();

    if lower.contains("bench press") {
        if lower.contains("incline") {
            return "Incline Barbell Bench Press".to_owned();
        }
        if lower.contains("decline") {
            return "Decline Barbell Bench Press".to_owned();
        }
        return "Barbell Bench Press".to_owned();
    }
    if lower.contains("chest press") {
        return "Chest Press Machine".to_owned();
    }
    if lower.contains("lat pulldown") || lower.contains("lat pull-down") {
        return "Lat Pulldown".to_owned();
    }

    name.to_owned()
}
