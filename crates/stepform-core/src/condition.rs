use crate::binding::lookup;
use crate::path::FieldPath;
use crate::record::AnswerRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Declarative completion check over an answer record.
///
/// Conditions are plain data, so a step gated by one is a pure function of
/// the record by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Always,
    /// Path resolves to anything other than `null`.
    Present { path: FieldPath },
    /// Non-blank string, non-empty array or object, or any number/bool.
    NonEmpty { path: FieldPath },
    InRange {
        path: FieldPath,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    MinItems { path: FieldPath, count: usize },
    Equals { path: FieldPath, value: Value },
    IsTrue { path: FieldPath },
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

impl Condition {
    pub fn evaluate(&self, answers: &AnswerRecord) -> bool {
        let at = |path: &FieldPath| lookup(answers.as_value(), path);
        match self {
            Condition::Always => true,
            Condition::Present { path } => at(path).map(|v| !v.is_null()).unwrap_or(false),
            Condition::NonEmpty { path } => at(path).map(is_non_empty).unwrap_or(false),
            Condition::InRange { path, min, max } => at(path)
                .and_then(Value::as_f64)
                .map(|n| min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi))
                .unwrap_or(false),
            Condition::MinItems { path, count } => at(path)
                .and_then(Value::as_array)
                .map(|items| items.len() >= *count)
                .unwrap_or(false),
            Condition::Equals { path, value } => at(path) == Some(value),
            Condition::IsTrue { path } => at(path) == Some(&Value::Bool(true)),
            Condition::All { conditions } => conditions.iter().all(|c| c.evaluate(answers)),
            Condition::Any { conditions } => conditions.iter().any(|c| c.evaluate(answers)),
            Condition::Not { condition } => !condition.evaluate(answers),
        }
    }

    /// Every path this condition reads, depth first.
    pub fn paths(&self) -> Vec<&FieldPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a FieldPath>) {
        match self {
            Condition::Always => {}
            Condition::Present { path }
            | Condition::NonEmpty { path }
            | Condition::InRange { path, .. }
            | Condition::MinItems { path, .. }
            | Condition::Equals { path, .. }
            | Condition::IsTrue { path } => out.push(path),
            Condition::All { conditions } | Condition::Any { conditions } => {
                for c in conditions {
                    c.collect_paths(out);
                }
            }
            Condition::Not { condition } => condition.collect_paths(out),
        }
    }
}

fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
