pub mod binding;
pub mod completion;
pub mod condition;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod path;
pub mod record;
pub mod registry;
pub mod script;
pub mod stats;
pub mod step;
pub mod wizard;

pub use completion::{complete, CompletionEmitter, CompletionPayload, WizardHost};
pub use error::{Result, StepformError};
pub use record::AnswerRecord;
pub use step::{StepDefinition, StepSequence};
pub use wizard::{SessionStatus, WizardController, WizardState};
