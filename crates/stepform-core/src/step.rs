use crate::binding;
use crate::condition::Condition;
use crate::error::{Result, StepformError};
use crate::field::{FieldIssue, FieldSpec};
use crate::record::AnswerRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::OnceLock;

/// A code-defined completion check. A bare `fn` pointer cannot capture
/// state, so it can only see the record it is given.
pub type Predicate = fn(&AnswerRecord) -> bool;

// ---------------------------------------------------------------------------
// StepDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDefinition {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete_when: Option<Condition>,
    #[serde(skip)]
    pub predicate: Option<Predicate>,
}

impl StepDefinition {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            fields: Vec::new(),
            complete_when: None,
            predicate: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn complete_when(mut self, condition: Condition) -> Self {
        self.complete_when = Some(condition);
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Every field passes its constraints, and the declarative condition
    /// and code predicate (when present) both hold.
    pub fn is_complete(&self, answers: &AnswerRecord) -> bool {
        self.fields.iter().all(|f| f.check(answers).is_none())
            && self
                .complete_when
                .as_ref()
                .map_or(true, |c| c.evaluate(answers))
            && self.predicate.map_or(true, |p| p(answers))
    }

    pub fn issues(&self, answers: &AnswerRecord) -> Vec<FieldIssue> {
        self.fields.iter().filter_map(|f| f.check(answers)).collect()
    }
}

// ---------------------------------------------------------------------------
// Step id validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9_\-]*[a-z0-9]$|^[a-z0-9]$").expect("static regex")
    })
}

/// Step and wizard ids: lowercase alphanumerics with `-`/`_` inside, at
/// most 64 characters.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !id_re().is_match(id) {
        return Err(StepformError::InvalidDefinition(format!(
            "invalid id '{id}': must be lowercase alphanumeric with '-' or '_'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// StepSequence
// ---------------------------------------------------------------------------

/// Validated, ordered steps of one wizard. Immutable once built.
#[derive(Debug, Clone)]
pub struct StepSequence {
    steps: Vec<StepDefinition>,
}

impl StepSequence {
    pub fn build(steps: Vec<StepDefinition>) -> Result<Self> {
        if steps.is_empty() {
            return Err(StepformError::InvalidDefinition(
                "a wizard needs at least one step".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for step in &steps {
            validate_id(&step.id)?;
            if !seen.insert(step.id.as_str()) {
                return Err(StepformError::InvalidDefinition(format!(
                    "duplicate step id '{}'",
                    step.id
                )));
            }
            for field in &step.fields {
                field.validate().map_err(|e| match e {
                    StepformError::InvalidDefinition(msg) => {
                        StepformError::InvalidDefinition(format!("step '{}': {msg}", step.id))
                    }
                    other => other,
                })?;
            }
            check_deterministic(step)?;
        }

        Ok(Self { steps })
    }

    pub fn at(&self, index: usize) -> Result<&StepDefinition> {
        self.steps.get(index).ok_or(StepformError::IndexOutOfRange {
            index,
            len: self.steps.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a built sequence; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.iter()
    }
}

/// Evaluate the step's completion twice over a few probe records and
/// reject any disagreement. Catches predicates that read clocks, counters
/// or other hidden state.
fn check_deterministic(step: &StepDefinition) -> Result<()> {
    let mut filled = AnswerRecord::new();
    for field in &step.fields {
        if let Ok(next) = binding::set(&filled, field.path.as_str(), json!("probe")) {
            filled = next;
        }
    }

    for probe in [AnswerRecord::new(), filled] {
        let probe = &probe;
        let first = step.is_complete(probe);
        let second = step.is_complete(probe);
        if first != second {
            return Err(StepformError::InvalidDefinition(format!(
                "step '{}' completion check is not a pure function of the answers",
                step.id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
