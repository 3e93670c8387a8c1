//! Replayable input events. A script stands in for the clicks and
//! keystrokes a UI would deliver, so a session can be driven end to end
//! from a file or a test.

use crate::completion::{CompletionEmitter, WizardHost};
use crate::error::{Result, StepformError};
use crate::wizard::WizardController;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

// ---------------------------------------------------------------------------
// StepRef
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepRef {
    Index(usize),
    Id(String),
}

// ---------------------------------------------------------------------------
// ScriptAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptAction {
    Set { path: String, value: Value },
    Toggle { path: String, item: Value },
    Append { path: String, item: Value },
    /// Drop list entries equal to `matching`; when `matching` is an object,
    /// drop object entries that carry every one of its key/value pairs.
    Remove { path: String, matching: Value },
    Next,
    Previous,
    GoTo { step: StepRef },
    Complete,
    Close,
}

impl ScriptAction {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptAction::Set { .. } => "set",
            ScriptAction::Toggle { .. } => "toggle",
            ScriptAction::Append { .. } => "append",
            ScriptAction::Remove { .. } => "remove",
            ScriptAction::Next => "next",
            ScriptAction::Previous => "previous",
            ScriptAction::GoTo { .. } => "go_to",
            ScriptAction::Complete => "complete",
            ScriptAction::Close => "close",
        }
    }
}

pub fn load(path: &Path) -> Result<Vec<ScriptAction>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&data)?)
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub action: String,
    pub accepted: bool,
    pub step: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

/// Apply `actions` in order. Refused navigation and refused completion are
/// recorded as `accepted: false` and replay continues; malformed paths,
/// type mismatches and out-of-range jumps abort with an error.
pub fn replay<H: WizardHost>(
    wizard: &mut WizardController,
    emitter: &mut CompletionEmitter<H>,
    id: &str,
    actions: &[ScriptAction],
) -> Result<Vec<Outcome>> {
    let mut outcomes = Vec::with_capacity(actions.len());
    for action in actions {
        let mut note = None;
        let accepted = match action {
            ScriptAction::Set { path, value } => {
                wizard.set_field(path, value.clone())?;
                true
            }
            ScriptAction::Toggle { path, item } => {
                wizard.toggle_in_list(path, item.clone())?;
                true
            }
            ScriptAction::Append { path, item } => {
                wizard.append_to_list(path, item.clone())?;
                true
            }
            ScriptAction::Remove { path, matching } => {
                wizard.remove_from_list(path, |v| entry_matches(v, matching))?;
                true
            }
            ScriptAction::Next => {
                let moved = wizard.next();
                if !moved {
                    note = refusal_note(wizard);
                }
                moved
            }
            ScriptAction::Previous => wizard.previous(),
            ScriptAction::GoTo { step } => match step {
                StepRef::Index(i) => wizard.go_to(*i)?,
                StepRef::Id(s) => wizard.go_to_id(s)?,
            },
            ScriptAction::Complete => match emitter.emit(wizard, id) {
                Ok(_) => true,
                Err(
                    e @ (StepformError::PrematureCompletion(_)
                    | StepformError::AlreadyCompleted
                    | StepformError::SessionCancelled),
                ) => {
                    note = Some(e.to_string());
                    false
                }
                Err(e) => return Err(e),
            },
            ScriptAction::Close => emitter.close(wizard),
        };
        outcomes.push(Outcome {
            action: action.name().to_string(),
            accepted,
            step: wizard.current_index(),
            note,
        });
    }
    Ok(outcomes)
}

fn refusal_note(wizard: &WizardController) -> Option<String> {
    if wizard.status().is_terminal() {
        return Some(format!("session {}", wizard.status()));
    }
    if wizard.is_last_step() {
        return Some("already on the last step".to_string());
    }
    let issues = wizard.issues();
    if issues.is_empty() {
        Some(format!("step '{}' is incomplete", wizard.current_step().id))
    } else {
        Some(
            issues
                .iter()
                .map(|i| format!("{}: {}", i.path, i.message))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

fn entry_matches(entry: &Value, pattern: &Value) -> bool {
    match (entry, pattern) {
        (Value::Object(e), Value::Object(p)) => p.iter().all(|(k, v)| e.get(k) == Some(v)),
        _ => entry == pattern,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
