//! Merging model extraction output into the record.
//!
//! The extraction model answers with JSON pairs covering some subset of
//! the outstanding fields. Parsing is strict (a malformed payload is a
//! no-op turn) but merging is lenient: nulls, unknown keys, wrong types,
//! and re-answers for resolved fields are dropped, never errors. A model
//! that over-answers or mis-types simply leaves fields outstanding for a
//! later turn.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::record::{normalize_null, KnowledgeRecord};

/// Failures that make a whole extraction answer unusable.
///
/// Contained by the caller: the turn is treated as a zero-value merge and
/// the same questions are re-issued next turn.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Model output is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model output must be an object or an array of objects, got {found}")]
    UnexpectedShape { found: &'static str },
}

/// Counts of what a merge did with each extracted pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    /// Pairs assigned to outstanding fields.
    pub applied: usize,
    /// Pairs normalized away as explicit no-value answers.
    pub dropped_null: usize,
    /// Pairs dropped for unknown key, wrong type, or already-resolved
    /// field.
    pub dropped_unmatched: usize,
}

/// Merges a raw model answer into the record.
///
/// Accepted shapes: a JSON object of field/value pairs, or an array whose
/// elements are such objects (flattened in order). All pairs are collected
/// before any assignment, so a payload that fails parsing or shape checks
/// leaves the record untouched.
pub fn merge_response(
    record: &mut KnowledgeRecord,
    raw: &str,
) -> Result<MergeReport, MergeError> {
    let parsed: Value = serde_json::from_str(raw)?;
    let pairs = collect_pairs(parsed)?;

    let mut report = MergeReport::default();
    for (name, value) in pairs {
        match normalize_null(value) {
            None => report.dropped_null += 1,
            Some(value) => {
                if record.assign(&name, value) {
                    report.applied += 1;
                } else {
                    debug!(field = %name, "Dropped extraction pair with unknown key, wrong type, or resolved field");
                    report.dropped_unmatched += 1;
                }
            }
        }
    }

    Ok(report)
}

fn collect_pairs(parsed: Value) -> Result<Vec<(String, Value)>, MergeError> {
    match parsed {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Array(elements) => {
            let mut pairs = Vec::new();
            for element in elements {
                match element {
                    Value::Object(map) => pairs.extend(map),
                    other => {
                        return Err(MergeError::UnexpectedShape {
                            found: json_type_name(&other),
                        })
                    }
                }
            }
            Ok(pairs)
        }
        other => Err(MergeError::UnexpectedShape {
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
