use crate::binding;
use crate::error::{Result, StepformError};
use crate::field::FieldIssue;
use crate::record::AnswerRecord;
use crate::step::{StepDefinition, StepSequence};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// WizardState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub current_step_index: usize,
    pub answers: AnswerRecord,
    /// Every index the session has moved away from, oldest first.
    pub history: Vec<usize>,
    pub status: SessionStatus,
}

// ---------------------------------------------------------------------------
// WizardController
// ---------------------------------------------------------------------------

/// Owns one wizard session and is the only way to navigate it.
///
/// Forward moves are gated by the current step's completion check;
/// backward moves never are. Refused moves are ordinary UI state and
/// return `false` rather than an error.
#[derive(Debug, Clone)]
pub struct WizardController {
    steps: StepSequence,
    state: WizardState,
}

impl WizardController {
    pub fn new(steps: StepSequence, initial_answers: &AnswerRecord) -> Self {
        Self {
            steps,
            state: WizardState {
                current_step_index: 0,
                answers: initial_answers.clone(),
                history: Vec::new(),
                status: SessionStatus::InProgress,
            },
        }
    }

    // -----------------------------------------------------------------------
    // Read-only views
    // -----------------------------------------------------------------------

    pub fn steps(&self) -> &StepSequence {
        &self.steps
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn answers(&self) -> &AnswerRecord {
        &self.state.answers
    }

    pub fn current_index(&self) -> usize {
        self.state.current_step_index
    }

    pub fn current_step(&self) -> &StepDefinition {
        // current_step_index is kept inside [0, len) by every transition.
        self.steps
            .at(self.state.current_step_index)
            .unwrap_or_else(|_| unreachable!("step index escaped its bounds"))
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step_index == self.steps.last_index()
    }

    pub fn is_completed(&self) -> bool {
        self.state.status == SessionStatus::Completed
    }

    pub fn progress_fraction(&self) -> f64 {
        (self.state.current_step_index + 1) as f64 / self.steps.len() as f64
    }

    // -----------------------------------------------------------------------
    // Gating
    // -----------------------------------------------------------------------

    pub fn can_advance(&self) -> bool {
        !self.state.status.is_terminal() && self.current_step().is_complete(&self.state.answers)
    }

    pub fn issues(&self) -> Vec<FieldIssue> {
        self.current_step().issues(&self.state.answers)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn next(&mut self) -> bool {
        if self.is_last_step() || !self.can_advance() {
            tracing::debug!(
                step = %self.current_step().id,
                "next refused"
            );
            return false;
        }
        self.move_to(self.state.current_step_index + 1);
        true
    }

    pub fn previous(&mut self) -> bool {
        if self.state.status.is_terminal() || self.state.current_step_index == 0 {
            return false;
        }
        self.move_to(self.state.current_step_index - 1);
        true
    }

    /// Jump to `index`. Any earlier step (or the current one) is always
    /// reachable; the step right after the current one only when
    /// `can_advance()`; anything further ahead never.
    pub fn go_to(&mut self, index: usize) -> Result<bool> {
        if index >= self.steps.len() {
            return Err(StepformError::IndexOutOfRange {
                index,
                len: self.steps.len(),
            });
        }
        if self.state.status.is_terminal() {
            return Ok(false);
        }

        let current = self.state.current_step_index;
        if index == current {
            return Ok(true);
        }
        if index < current || (index == current + 1 && self.can_advance()) {
            self.move_to(index);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn go_to_id(&mut self, id: &str) -> Result<bool> {
        let index = self
            .steps
            .position(id)
            .ok_or_else(|| StepformError::StepNotFound(id.to_string()))?;
        self.go_to(index)
    }

    /// Abandon the session. Terminal; never reaches the completion path.
    pub fn cancel(&mut self) -> bool {
        if self.state.status.is_terminal() {
            return false;
        }
        self.state.status = SessionStatus::Cancelled;
        tracing::info!(step = self.state.current_step_index, "wizard cancelled");
        true
    }

    fn move_to(&mut self, index: usize) {
        let from = self.state.current_step_index;
        self.state.history.push(from);
        self.state.current_step_index = index;
        tracing::debug!(from, to = index, "step changed");
    }

    pub(crate) fn mark_completed(&mut self) {
        self.state.status = SessionStatus::Completed;
    }

    // -----------------------------------------------------------------------
    // Field binding
    // -----------------------------------------------------------------------

    pub fn field(&self, path: &str) -> Result<Option<&Value>> {
        binding::get(&self.state.answers, path)
    }

    pub fn set_field(&mut self, path: &str, value: Value) -> Result<()> {
        self.state.answers = binding::set(&self.state.answers, path, value)?;
        Ok(())
    }

    pub fn update_field<F>(&mut self, path: &str, f: F) -> Result<()>
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        self.state.answers = binding::update(&self.state.answers, path, f)?;
        Ok(())
    }

    pub fn toggle_in_list(&mut self, path: &str, item: Value) -> Result<()> {
        self.state.answers = binding::toggle_in_list(&self.state.answers, path, item)?;
        Ok(())
    }

    pub fn append_to_list(&mut self, path: &str, item: Value) -> Result<()> {
        self.state.answers = binding::append_to_list(&self.state.answers, path, item)?;
        Ok(())
    }

    pub fn remove_from_list<P>(&mut self, path: &str, predicate: P) -> Result<()>
    where
        P: Fn(&Value) -> bool,
    {
        self.state.answers = binding::remove_from_list(&self.state.answers, path, predicate)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
