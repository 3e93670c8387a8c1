//! Path-addressed reads and immutable updates over an [`AnswerRecord`].
//!
//! Every writer takes the current record by reference and returns a new
//! one with exactly the addressed slot changed. The input is never touched,
//! so a caller holding the old record keeps seeing the old values.

use crate::error::{Result, StepformError};
use crate::path::{FieldPath, Segment};
use crate::record::{kind_name, AnswerRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// PathMode
// ---------------------------------------------------------------------------

/// How [`get_with`] treats a path that does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMode {
    /// Missing paths are `PathNotFound` errors.
    Strict,
    /// Missing paths read as absent, the way optional fields behave.
    Lenient,
}

impl Default for PathMode {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            PathMode::Strict
        } else {
            PathMode::Lenient
        }
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Resolve `path` against a raw value. `None` when any segment is missing.
pub fn lookup<'a>(root: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = root;
    for seg in path.segments() {
        current = match (current, seg) {
            (Value::Object(map), seg) => map.get(&seg.as_key())?,
            (Value::Array(items), Segment::Index(i)) => items.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

pub fn get<'a>(answers: &'a AnswerRecord, path: &str) -> Result<Option<&'a Value>> {
    get_with(answers, path, PathMode::default())
}

pub fn get_with<'a>(
    answers: &'a AnswerRecord,
    path: &str,
    mode: PathMode,
) -> Result<Option<&'a Value>> {
    let path = FieldPath::parse(path)?;
    match lookup(answers.as_value(), &path) {
        Some(v) => Ok(Some(v)),
        None => match mode {
            PathMode::Strict => Err(StepformError::PathNotFound(path.to_string())),
            PathMode::Lenient => Ok(None),
        },
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

pub fn set(answers: &AnswerRecord, path: &str, value: Value) -> Result<AnswerRecord> {
    let path = FieldPath::parse(path)?;
    let mut next = answers.clone();
    *slot_mut(next.value_mut(), &path)? = value;
    Ok(next)
}

/// Functional update: `f` receives the current value (if any) and returns
/// its replacement. External tick sources drive timers through this.
pub fn update<F>(answers: &AnswerRecord, path: &str, f: F) -> Result<AnswerRecord>
where
    F: FnOnce(Option<&Value>) -> Value,
{
    let parsed = FieldPath::parse(path)?;
    let value = f(lookup(answers.as_value(), &parsed));
    let mut next = answers.clone();
    *slot_mut(next.value_mut(), &parsed)? = value;
    Ok(next)
}

/// Add `item` if absent, remove every equal entry if present.
pub fn toggle_in_list(answers: &AnswerRecord, path: &str, item: Value) -> Result<AnswerRecord> {
    modify_list(answers, path, |items| {
        if items.contains(&item) {
            items.retain(|v| v != &item);
        } else {
            items.push(item);
        }
    })
}

pub fn append_to_list(answers: &AnswerRecord, path: &str, item: Value) -> Result<AnswerRecord> {
    modify_list(answers, path, |items| items.push(item))
}

/// Drop every entry matching `predicate`. A missing or `null` list has
/// nothing to remove, so the record comes back unchanged.
pub fn remove_from_list<P>(answers: &AnswerRecord, path: &str, predicate: P) -> Result<AnswerRecord>
where
    P: Fn(&Value) -> bool,
{
    let parsed = FieldPath::parse(path)?;
    if matches!(lookup(answers.as_value(), &parsed), None | Some(Value::Null)) {
        return Ok(answers.clone());
    }
    modify_list(answers, path, |items| items.retain(|v| !predicate(v)))
}

fn modify_list<F>(answers: &AnswerRecord, path: &str, f: F) -> Result<AnswerRecord>
where
    F: FnOnce(&mut Vec<Value>),
{
    let path = FieldPath::parse(path)?;
    let mut next = answers.clone();
    let slot = slot_mut(next.value_mut(), &path)?;
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(items) => f(items),
        other => {
            return Err(StepformError::TypeMismatch {
                path: path.to_string(),
                expected: format!("array, found {}", kind_name(other)),
            })
        }
    }
    Ok(next)
}

/// Walk to the addressed slot, creating missing containers on the way.
///
/// A `null` along the path becomes an object or array depending on the
/// segment that follows. An index equal to the array length appends.
fn slot_mut<'a>(root: &'a mut Value, path: &FieldPath) -> Result<&'a mut Value> {
    let mut current = root;
    for (depth, seg) in path.segments().iter().enumerate() {
        if current.is_null() {
            *current = match seg {
                Segment::Key(_) => Value::Object(Map::new()),
                Segment::Index(_) => Value::Array(Vec::new()),
            };
        }
        current = match current {
            Value::Object(map) => map.entry(seg.as_key()).or_insert(Value::Null),
            Value::Array(items) => {
                let Segment::Index(i) = seg else {
                    return Err(StepformError::TypeMismatch {
                        path: path.prefix(depth),
                        expected: "object".to_string(),
                    });
                };
                if *i == items.len() {
                    items.push(Value::Null);
                }
                items
                    .get_mut(*i)
                    .ok_or_else(|| StepformError::PathNotFound(path.prefix(depth + 1)))?
            }
            other => {
                let expected = match seg {
                    Segment::Key(_) => "object",
                    Segment::Index(_) => "array",
                };
                return Err(StepformError::TypeMismatch {
                    path: path.prefix(depth),
                    expected: format!("{expected}, found {}", kind_name(other)),
                });
            }
        };
    }
    Ok(current)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
