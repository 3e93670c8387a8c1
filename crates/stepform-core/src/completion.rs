use crate::error::{Result, StepformError};
use crate::record::AnswerRecord;
use crate::wizard::{SessionStatus, WizardController};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CompletionPayload
// ---------------------------------------------------------------------------

/// Final snapshot handed to the host. Owns its own copy of the answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionPayload {
    pub id: String,
    pub data: AnswerRecord,
}

// ---------------------------------------------------------------------------
// complete
// ---------------------------------------------------------------------------

/// Finish the session and snapshot its answers.
///
/// Succeeds once per session, and only from the last step with that
/// step's completion check satisfied.
pub fn complete(wizard: &mut WizardController, id: &str) -> Result<CompletionPayload> {
    match wizard.status() {
        SessionStatus::Completed => return Err(StepformError::AlreadyCompleted),
        SessionStatus::Cancelled => return Err(StepformError::SessionCancelled),
        SessionStatus::InProgress => {}
    }

    if !wizard.is_last_step() {
        return Err(StepformError::PrematureCompletion(format!(
            "on step {} of {}",
            wizard.current_index() + 1,
            wizard.steps().len()
        )));
    }
    if !wizard.can_advance() {
        return Err(StepformError::PrematureCompletion(format!(
            "final step '{}' is incomplete",
            wizard.current_step().id
        )));
    }

    wizard.mark_completed();
    tracing::info!(wizard = id, "wizard completed");
    Ok(CompletionPayload {
        id: id.to_string(),
        data: wizard.answers().clone(),
    })
}

// ---------------------------------------------------------------------------
// WizardHost
// ---------------------------------------------------------------------------

/// The two callbacks a host exposes to a running wizard.
pub trait WizardHost {
    fn on_complete(&mut self, payload: &CompletionPayload);
    fn on_close(&mut self);
}

// ---------------------------------------------------------------------------
// CompletionEmitter
// ---------------------------------------------------------------------------

/// Single choke point between sessions and the host. Refused actions never
/// reach the host, so a double-click on "Complete" reports once.
pub struct CompletionEmitter<H> {
    host: H,
}

impl<H: WizardHost> CompletionEmitter<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn emit(&mut self, wizard: &mut WizardController, id: &str) -> Result<CompletionPayload> {
        let payload = complete(wizard, id).inspect_err(|e| {
            tracing::warn!(wizard = id, error = %e, "completion refused");
        })?;
        self.host.on_complete(&payload);
        Ok(payload)
    }

    /// Cancel an in-progress session and notify the host. Returns `false`
    /// (and stays silent) if the session had already ended.
    pub fn close(&mut self, wizard: &mut WizardController) -> bool {
        if !wizard.cancel() {
            return false;
        }
        self.host.on_close();
        true
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
