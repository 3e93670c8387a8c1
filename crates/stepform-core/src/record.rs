use crate::error::StepformError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The aggregate of every value entered during one wizard session.
///
/// Always a JSON object at the root. One controller owns one record; the
/// binding helpers hand back new records instead of editing in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct AnswerRecord(Value);

impl AnswerRecord {
    pub fn new() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Result<Self, StepformError> {
        match value {
            Value::Object(_) => Ok(Self(value)),
            Value::Null => Ok(Self::new()),
            other => Err(StepformError::InvalidDefinition(format!(
                "answer record must be an object, got {}",
                kind_name(&other)
            ))),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub(crate) fn value_mut(&mut self) -> &mut Value {
        &mut self.0
    }
}

impl Default for AnswerRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Value> for AnswerRecord {
    type Error = StepformError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<AnswerRecord> for Value {
    fn from(r: AnswerRecord) -> Value {
        r.0
    }
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
