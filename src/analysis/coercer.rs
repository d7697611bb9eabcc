// ABOUTME: Coerces raw model output into a validated AnalysisResult
// ABOUTME: Parses JSON, backfills id and createdAt, and collects every schema violation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Response Coercion
//!
//! Model output is untrusted. [`coerce_str`] and [`coerce_value`] turn it into
//! an [`AnalysisResult`] or a [`ValidationError`] listing each offending field
//! path with a reason. Nothing escapes as a panic.
//!
//! Only `id` and `createdAt` are ever synthesized. Every other required field
//! that is absent or mistyped is a validation issue. Unknown fields are dropped.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AnalysisResult, MachineInfo, MuscleGroups};

/// Path reported for failures that concern the whole document
pub const ROOT_PATH: &str = "$";

/// One schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Location of the offending value, e.g. `$.machine.confidence`
    pub path: String,
    /// What is wrong with it
    pub reason: String,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Model output rejected by the schema
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("model output failed validation with {} issue(s)", issues.len())]
pub struct ValidationError {
    /// Every violation found, in document order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    fn single(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue::new(path, reason)],
        }
    }

    /// Whether an issue is reported for `path`
    #[must_use]
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

/// Parse and validate a raw model output string
///
/// # Errors
///
/// Returns a [`ValidationError`] when the text is not JSON or the document
/// violates the schema.
pub fn coerce_str(raw: &str) -> Result<AnalysisResult, ValidationError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| ValidationError::single(ROOT_PATH, format!("invalid JSON: {e}")))?;
    coerce_value(value)
}

/// Backfill and validate an already-parsed model output document
///
/// # Errors
///
/// Returns a [`ValidationError`] when the document violates the schema.
pub fn coerce_value(raw: Value) -> Result<AnalysisResult, ValidationError> {
    let Value::Object(mut object) = raw else {
        return Err(ValidationError::single(
            ROOT_PATH,
            format!("expected object, found {}", type_name(&raw)),
        ));
    };

    backfill(&mut object);

    let mut validator = Validator::default();
    let result = validator.analysis(&object);

    match result {
        Some(result) if validator.issues.is_empty() => Ok(result),
        _ => Err(ValidationError {
            issues: validator.issues,
        }),
    }
}

/// Fill `id` and `createdAt` when missing, null, or empty
fn backfill(object: &mut Map<String, Value>) {
    if is_blank(object.get("id")) {
        object.insert("id".to_owned(), Value::String(Uuid::new_v4().to_string()));
    }
    if is_blank(object.get("createdAt")) {
        object.insert(
            "createdAt".to_owned(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn child(parent: &str, key: &str) -> String {
    format!("{parent}.{key}")
}

/// Collects issues while extracting typed fields
#[derive(Default)]
struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    fn fail(&mut self, path: String, reason: impl Into<String>) {
        self.issues.push(ValidationIssue::new(path, reason));
    }

    fn analysis(&mut self, object: &Map<String, Value>) -> Option<AnalysisResult> {
        let id = self.uuid(object, ROOT_PATH, "id");
        let machine = self.machine(object);
        let how_it_works = self.non_empty_string(object, ROOT_PATH, "howItWorks");
        let steps = self.string_array(object, ROOT_PATH, "steps");
        let safety_risks = self.string_array(object, ROOT_PATH, "safetyRisks");
        let common_mistakes = self.string_array(object, ROOT_PATH, "commonMistakes");
        let alternatives = self.string_array(object, ROOT_PATH, "alternatives");
        let quick_coach = self.non_empty_string(object, ROOT_PATH, "quickCoach");
        let raw_model_notes = self.optional_string(object, ROOT_PATH, "rawModelNotes");
        let created_at = self.timestamp(object, ROOT_PATH, "createdAt");

        Some(AnalysisResult {
            id: id?,
            machine: machine?,
            how_it_works: how_it_works?,
            steps: steps?,
            safety_risks: safety_risks?,
            common_mistakes: common_mistakes?,
            alternatives: alternatives?,
            quick_coach: quick_coach?,
            raw_model_notes: raw_model_notes?,
            created_at: created_at?,
        })
    }

    fn machine(&mut self, root: &Map<String, Value>) -> Option<MachineInfo> {
        let path = child(ROOT_PATH, "machine");
        let object = self.object(root, ROOT_PATH, "machine")?;

        let name = self.non_empty_string(object, &path, "name");
        let confidence = self.confidence(object, &path);
        let muscles = self.muscles(object, &path);

        Some(MachineInfo {
            name: name?,
            confidence: confidence?,
            muscles: muscles?,
        })
    }

    fn muscles(&mut self, machine: &Map<String, Value>, parent: &str) -> Option<MuscleGroups> {
        let path = child(parent, "muscles");
        let object = self.object(machine, parent, "muscles")?;

        let primary = self.string_array(object, &path, "primary");
        let secondary = self.string_array(object, &path, "secondary");

        Some(MuscleGroups {
            primary: primary?,
            secondary: secondary?,
        })
    }

    fn required<'a>(
        &mut self,
        object: &'a Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<&'a Value> {
        match object.get(key) {
            Some(value) => Some(value),
            None => {
                self.fail(child(parent, key), "required field is missing");
                None
            }
        }
    }

    fn object<'a>(
        &mut self,
        object: &'a Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<&'a Map<String, Value>> {
        match self.required(object, parent, key)? {
            Value::Object(inner) => Some(inner),
            other => {
                self.fail(
                    child(parent, key),
                    format!("expected object, found {}", type_name(other)),
                );
                None
            }
        }
    }

    fn string(&mut self, object: &Map<String, Value>, parent: &str, key: &str) -> Option<String> {
        match self.required(object, parent, key)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.fail(
                    child(parent, key),
                    format!("expected string, found {}", type_name(other)),
                );
                None
            }
        }
    }

    fn non_empty_string(
        &mut self,
        object: &Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<String> {
        let value = self.string(object, parent, key)?;
        if value.trim().is_empty() {
            self.fail(child(parent, key), "must not be empty");
            return None;
        }
        Some(value)
    }

    /// Absent or null is `Some(None)`; a mistyped value is an issue
    fn optional_string(
        &mut self,
        object: &Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<Option<String>> {
        match object.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(other) => {
                self.fail(
                    child(parent, key),
                    format!("expected string, found {}", type_name(other)),
                );
                None
            }
        }
    }

    fn string_array(
        &mut self,
        object: &Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<Vec<String>> {
        let path = child(parent, key);
        let Value::Array(items) = self.required(object, parent, key)? else {
            let found = object.get(key).map_or("missing", type_name);
            self.fail(path, format!("expected array of strings, found {found}"));
            return None;
        };

        let mut out = Vec::with_capacity(items.len());
        let mut valid = true;
        for (index, item) in items.iter().enumerate() {
            if let Value::String(s) = item {
                out.push(s.clone());
            } else {
                valid = false;
                self.fail(
                    format!("{path}[{index}]"),
                    format!("expected string, found {}", type_name(item)),
                );
            }
        }
        valid.then_some(out)
    }

    fn confidence(&mut self, machine: &Map<String, Value>, parent: &str) -> Option<f64> {
        let path = child(parent, "confidence");
        let value = self.required(machine, parent, "confidence")?;
        let Some(number) = value.as_f64() else {
            self.fail(path, format!("expected number, found {}", type_name(value)));
            return None;
        };
        if !(0.0..=1.0).contains(&number) {
            self.fail(path, format!("must be between 0 and 1, found {number}"));
            return None;
        }
        Some(number)
    }

    fn uuid(&mut self, object: &Map<String, Value>, parent: &str, key: &str) -> Option<String> {
        let value = self.string(object, parent, key)?;
        if Uuid::parse_str(&value).is_err() {
            self.fail(child(parent, key), "must be a valid UUID");
            return None;
        }
        Some(value)
    }

    fn timestamp(
        &mut self,
        object: &Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<String> {
        let value = self.string(object, parent, key)?;
        if DateTime::parse_from_rfc3339(&value).is_err() {
            self.fail(child(parent, key), "must be an RFC 3339 timestamp");
            return None;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_document() -> Value {
        json!({
            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "machine": {
                "name": "Lat Pulldown",
                "confidence": 0.81,
                "muscles": { "primary": ["Latissimus dorsi"], "secondary": ["Biceps brachii"] }
            },
            "howItWorks": "A cable stack resists a bar pulled toward the chest.",
            "steps": ["Sit", "Pull"],
            "safetyRisks": [],
            "commonMistakes": ["Leaning back too far"],
            "alternatives": ["Pull-ups"],
            "quickCoach": "Drive elbows down.",
            "createdAt": "2025-03-01T10:00:00.000Z"
        })
    }

    #[test]
    fn test_valid_document_keeps_existing_id_and_timestamp() {
        let result = coerce_value(valid_document()).unwrap();
        assert_eq!(result.id, "7c9e6679-7425-40de-944b-e07fc1f90ae7");
        assert_eq!(result.created_at, "2025-03-01T10:00:00.000Z");
        assert_eq!(result.machine.muscles.secondary, vec!["Biceps brachii"]);
    }

    #[test]
    fn test_invalid_json_reports_root_path() {
        let err = coerce_str("Sure! Here is the JSON you asked for").unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, "$");
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = coerce_value(json!(["not", "an", "object"])).unwrap_err();
        assert!(err.has_issue_at("$"));
    }

    #[test]
    fn test_issues_are_collected_across_fields() {
        let mut doc = valid_document();
        doc["machine"]["confidence"] = json!("high");
        doc["steps"] = json!(["ok", 3]);
        doc.as_object_mut().unwrap().remove("quickCoach");

        let err = coerce_value(doc).unwrap_err();
        assert!(err.has_issue_at("$.machine.confidence"));
        assert!(err.has_issue_at("$.steps[1]"));
        assert!(err.has_issue_at("$.quickCoach"));
    }

    #[test]
    fn test_non_empty_id_that_is_not_uuid_is_rejected() {
        let mut doc = valid_document();
        doc["id"] = json!("analysis-1");
        let err = coerce_value(doc).unwrap_err();
        assert!(err.has_issue_at("$.id"));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut doc = valid_document();
        doc["machine"]["name"] = json!("  ");
        let err = coerce_value(doc).unwrap_err();
        assert!(err.has_issue_at("$.machine.name"));
    }

    #[test]
    fn test_null_model_notes_are_treated_as_absent() {
        let mut doc = valid_document();
        doc["rawModelNotes"] = Value::Null;
        assert_eq!(coerce_value(doc).unwrap().raw_model_notes, None);
    }

    #[test]
    fn test_validation_error_serializes_as_issue_list() {
        let err = ValidationError::single("$.machine", "required field is missing");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["issues"][0]["path"], "$.machine");
        assert_eq!(json["issues"][0]["reason"], "required field is missing");
    }
}
